// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};

mod render;

pub use render::{RenderOptions, render_transcript};

/// Information shown at the top of a transcript
#[derive(Clone, Debug)]
pub struct TranscriptHeader {
	pub guild_name: String,
	pub guild_icon_url: Option<String>,
	pub channel_name: String,
	pub channel_id: u64,
	pub ticket_id: String,
	pub exported_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptAuthor {
	pub id: u64,
	/// The name shown for the author (nickname, then global name, then username).
	pub display_name: String,
	pub avatar_url: Option<String>,
	pub bot: bool,
}

/// A single message from the exported channel, independent of the Discord API types
#[derive(Clone, Debug)]
pub struct TranscriptMessage {
	pub id: u64,
	pub author: TranscriptAuthor,
	pub content: String,
	pub sent_at: DateTime<Utc>,
	pub edited_at: Option<DateTime<Utc>>,
	pub pinned: bool,
	/// Describes a system message (a member joining, a pin, a new thread). `None` for ordinary messages.
	pub notice: Option<String>,
	pub reply_to: Option<ReplyReference>,
	pub attachments: Vec<TranscriptAttachment>,
	pub embeds: Vec<TranscriptEmbed>,
	/// Names of the stickers sent with the message
	pub stickers: Vec<String>,
	pub reactions: Vec<TranscriptReaction>,
}

/// The message a transcript message replied to. The referenced message may have been deleted,
/// in which case only its ID is known.
#[derive(Clone, Debug)]
pub struct ReplyReference {
	pub message_id: u64,
	pub author_name: Option<String>,
	pub excerpt: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TranscriptAttachment {
	pub file_name: String,
	pub url: String,
	pub size: u64,
	pub content_type: Option<String>,
}

impl TranscriptAttachment {
	pub fn is_image(&self) -> bool {
		self.content_type
			.as_deref()
			.is_some_and(|content_type| content_type.starts_with("image/"))
	}
}

#[derive(Clone, Debug, Default)]
pub struct TranscriptEmbed {
	pub title: Option<String>,
	pub url: Option<String>,
	pub description: Option<String>,
	pub fields: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct TranscriptReaction {
	pub emoji: String,
	pub count: u64,
}

/// Gets the file name a transcript is stored under.
///
/// The `---` separated form is what the ticket web links point to, so it must stay stable.
pub fn transcript_file_name(channel_name: &str, ticket_id: &str) -> String {
	format!(
		"transcript-{}---{}---.html",
		sanitize_file_component(channel_name),
		sanitize_file_component(ticket_id)
	)
}

fn sanitize_file_component(component: &str) -> String {
	let sanitized: String = component
		.chars()
		.map(|c| match c {
			'/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
			c if c.is_control() => '_',
			c => c,
		})
		.collect();
	match sanitized.as_str() {
		"" | "." | ".." => "_".repeat(sanitized.len().max(1)),
		_ => sanitized,
	}
}
