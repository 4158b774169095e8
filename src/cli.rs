// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::export::ExportRequest;
use clap::Parser;

/// Logs in as a Discord bot and exports a ticket channel's message history to an HTML transcript.
#[derive(Parser)]
#[command(version, about)]
pub struct Args {
	/// Token the bot logs in with
	pub bot_token: String,
	/// ID of the ticket channel to export
	pub channel_id: String,
	/// ID of the guild the channel belongs to
	pub guild_id: String,
	/// Ticket identifier used to name the transcript
	pub ticket_id: String,
}

impl Args {
	/// Splits the arguments into the bot token and the ticket to export
	pub fn into_parts(self) -> (String, ExportRequest) {
		let request = ExportRequest {
			channel_id: self.channel_id,
			guild_id: self.guild_id,
			ticket_id: self.ticket_id,
		};
		(self.bot_token, request)
	}
}
