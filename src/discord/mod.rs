// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod connection;
mod history;
pub mod utils;

pub use connection::{GatewaySession, Session, SessionError, set_up_client};
pub use history::{ChannelHistory, ChannelInfo, DiscordHistory, GuildInfo, HistoryError, PAGE_SIZE, page_backwards};
