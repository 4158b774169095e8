// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::transcript::TranscriptAuthor;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_model::user::User;

const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Picks the name to show for a user: guild nickname, then global display name, then username.
pub fn display_name(nick: Option<&str>, global_name: Option<&str>, name: &str) -> String {
	nick.or(global_name).unwrap_or(name).to_string()
}

/// Gets the avatar URL for a user. Users without an avatar get the default avatar Discord assigns them.
pub fn avatar_url(user: &User) -> String {
	match &user.avatar {
		Some(avatar) => format!("{}/avatars/{}/{}.png", CDN_BASE, user.id, avatar),
		None => default_avatar_url(user.id),
	}
}

fn default_avatar_url(user_id: Id<UserMarker>) -> String {
	let index = (user_id.get() >> 22) % 6;
	format!("{}/embed/avatars/{}.png", CDN_BASE, index)
}

/// Builds transcript author data from the author of a message and their guild nickname, if they have one
pub fn transcript_author(user: &User, nick: Option<&str>) -> TranscriptAuthor {
	TranscriptAuthor {
		id: user.id.get(),
		display_name: display_name(nick, user.global_name.as_deref(), &user.name),
		avatar_url: Some(avatar_url(user)),
		bot: user.bot,
	}
}
