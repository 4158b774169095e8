// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{TranscriptAttachment, TranscriptEmbed, TranscriptHeader, TranscriptMessage};
use chrono::{DateTime, Duration, Utc};

/// Messages from the same author closer together than this are shown as one group.
const GROUP_WINDOW_MINUTES: i64 = 7;

const STYLE: &str = "body{background:#313338;color:#dbdee1;font-family:'gg sans','Noto Sans',Helvetica,Arial,sans-serif;margin:0;}\
header{display:flex;align-items:center;gap:16px;padding:16px 24px;background:#2b2d31;border-bottom:1px solid #1e1f22;}\
header img{width:64px;height:64px;border-radius:50%;}\
header h1{margin:0;font-size:1.4em;color:#f2f3f5;}\
header .meta{color:#949ba4;font-size:0.9em;}\
main{padding:16px 24px;}\
.group{display:flex;gap:16px;margin-top:16px;}\
.avatar{width:40px;height:40px;border-radius:50%;flex-shrink:0;}\
.group-body{min-width:0;}\
.author{font-weight:600;color:#f2f3f5;}\
.bot-tag{background:#5865f2;color:#fff;font-size:0.65em;border-radius:3px;padding:1px 4px;margin-left:4px;vertical-align:middle;}\
.time{color:#949ba4;font-size:0.75em;margin-left:8px;}\
.message{padding:2px 0;white-space:normal;word-wrap:break-word;}\
.edited{color:#949ba4;font-size:0.7em;margin-left:4px;}\
.pinned{color:#f0b232;font-size:0.75em;}\
.reply{color:#949ba4;font-size:0.85em;border-left:2px solid #4e5058;padding-left:8px;margin-bottom:2px;}\
.attachment{margin-top:4px;}\
.attachment img{max-width:400px;max-height:300px;border-radius:4px;}\
.embed{border-left:4px solid #1e1f22;background:#2b2d31;border-radius:4px;padding:8px 12px;margin-top:4px;max-width:520px;}\
.embed-title{font-weight:600;color:#00a8fc;}\
.embed-field-name{font-weight:600;margin-top:4px;}\
.reactions{display:flex;gap:4px;margin-top:4px;}\
.reaction{background:#2b2d31;border-radius:8px;padding:2px 6px;font-size:0.85em;}\
.empty{color:#949ba4;font-style:italic;}\
.notice,.sticker{color:#949ba4;font-style:italic;}\
footer{color:#949ba4;font-size:0.8em;padding:16px 24px;}";

/// Controls how a transcript is rendered
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
	/// Whether to use a 24-hour clock for times
	pub military_time: bool,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self { military_time: true }
	}
}

/// Renders a complete, self-contained HTML transcript. Messages are expected oldest first.
pub fn render_transcript(header: &TranscriptHeader, messages: &[TranscriptMessage], options: RenderOptions) -> String {
	let mut html = String::new();

	html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
	html.push_str(&format!(
		"<title>Transcript: #{} ({})</title>\n",
		escape_html(&header.channel_name),
		escape_html(&header.ticket_id)
	));
	html.push_str(&format!("<style>{}</style>\n", STYLE));
	html.push_str("</head>\n<body>\n");

	render_header(&mut html, header, messages.len(), options);

	html.push_str("<main>\n");
	if messages.is_empty() {
		html.push_str("<p class=\"empty\">No messages</p>\n");
	}
	let mut previous: Option<&TranscriptMessage> = None;
	for message in messages {
		let continues_group = previous.is_some_and(|previous| continues_group(previous, message));
		if !continues_group {
			if previous.is_some() {
				html.push_str("</div>\n</div>\n");
			}
			open_group(&mut html, message, options);
		}
		render_message(&mut html, message, options);
		previous = Some(message);
	}
	if previous.is_some() {
		html.push_str("</div>\n</div>\n");
	}
	html.push_str("</main>\n");

	html.push_str(&format!(
		"<footer>Exported {} message{} on {}</footer>\n",
		messages.len(),
		if messages.len() == 1 { "" } else { "s" },
		format_time(&header.exported_at, options)
	));
	html.push_str("</body>\n</html>\n");
	html
}

fn render_header(html: &mut String, header: &TranscriptHeader, message_count: usize, options: RenderOptions) {
	html.push_str("<header>\n");
	if let Some(icon_url) = &header.guild_icon_url {
		html.push_str(&format!("<img src=\"{}\" alt=\"\">\n", escape_html(icon_url)));
	}
	html.push_str("<div>\n");
	html.push_str(&format!("<h1>{}</h1>\n", escape_html(&header.guild_name)));
	html.push_str(&format!(
		"<div class=\"meta\">#{} &middot; channel {} &middot; ticket {}</div>\n",
		escape_html(&header.channel_name),
		header.channel_id,
		escape_html(&header.ticket_id)
	));
	html.push_str(&format!(
		"<div class=\"meta\">{} message{} &middot; exported {}</div>\n",
		message_count,
		if message_count == 1 { "" } else { "s" },
		format_time(&header.exported_at, options)
	));
	html.push_str("</div>\n</header>\n");
}

fn continues_group(previous: &TranscriptMessage, message: &TranscriptMessage) -> bool {
	previous.author.id == message.author.id
		&& message.reply_to.is_none()
		&& !message.pinned
		&& message.sent_at - previous.sent_at < Duration::minutes(GROUP_WINDOW_MINUTES)
}

fn open_group(html: &mut String, message: &TranscriptMessage, options: RenderOptions) {
	html.push_str(&format!("<div class=\"group\" id=\"group-{}\">\n", message.id));
	match &message.author.avatar_url {
		Some(avatar_url) => html.push_str(&format!(
			"<img class=\"avatar\" src=\"{}\" alt=\"\">\n",
			escape_html(avatar_url)
		)),
		None => html.push_str("<div class=\"avatar\"></div>\n"),
	}
	html.push_str("<div class=\"group-body\">\n");
	if let Some(reply) = &message.reply_to {
		let author = reply.author_name.as_deref().unwrap_or("Unknown user");
		let excerpt = reply.excerpt.as_deref().unwrap_or("Original message was deleted");
		html.push_str(&format!(
			"<div class=\"reply\"><a href=\"#message-{}\">&#8618;</a> <span class=\"author\">{}</span> {}</div>\n",
			reply.message_id,
			escape_html(author),
			escape_html(excerpt)
		));
	}
	html.push_str(&format!(
		"<div><span class=\"author\" title=\"{}\">{}</span>",
		message.author.id,
		escape_html(&message.author.display_name)
	));
	if message.author.bot {
		html.push_str("<span class=\"bot-tag\">BOT</span>");
	}
	html.push_str(&format!(
		"<span class=\"time\">{}</span></div>\n",
		format_time(&message.sent_at, options)
	));
}

fn render_message(html: &mut String, message: &TranscriptMessage, options: RenderOptions) {
	html.push_str(&format!("<div class=\"message\" id=\"message-{}\">", message.id));
	if message.pinned {
		html.push_str("<div class=\"pinned\">&#128204; Pinned</div>");
	}
	if let Some(notice) = &message.notice {
		html.push_str(&format!("<div class=\"notice\">{}</div>", escape_html(notice)));
	}
	html.push_str(&escape_content(&message.content));
	if let Some(edited_at) = &message.edited_at {
		html.push_str(&format!(
			"<span class=\"edited\" title=\"{}\">(edited)</span>",
			format_time(edited_at, options)
		));
	}
	for attachment in &message.attachments {
		render_attachment(html, attachment);
	}
	for embed in &message.embeds {
		render_embed(html, embed);
	}
	for sticker in &message.stickers {
		html.push_str(&format!("<div class=\"sticker\">Sticker: {}</div>", escape_html(sticker)));
	}
	if !message.reactions.is_empty() {
		html.push_str("<div class=\"reactions\">");
		for reaction in &message.reactions {
			html.push_str(&format!(
				"<span class=\"reaction\">{} {}</span>",
				escape_html(&reaction.emoji),
				reaction.count
			));
		}
		html.push_str("</div>");
	}
	html.push_str("</div>\n");
}

fn render_attachment(html: &mut String, attachment: &TranscriptAttachment) {
	let url = escape_html(&attachment.url);
	let file_name = escape_html(&attachment.file_name);
	if attachment.is_image() {
		html.push_str(&format!(
			"<div class=\"attachment\"><a href=\"{}\"><img src=\"{}\" alt=\"{}\"></a></div>",
			url, url, file_name
		));
	} else {
		html.push_str(&format!(
			"<div class=\"attachment\"><a href=\"{}\">{}</a> ({})</div>",
			url,
			file_name,
			format_size(attachment.size)
		));
	}
}

fn render_embed(html: &mut String, embed: &TranscriptEmbed) {
	html.push_str("<div class=\"embed\">");
	match (&embed.title, &embed.url) {
		(Some(title), Some(url)) => html.push_str(&format!(
			"<div class=\"embed-title\"><a href=\"{}\">{}</a></div>",
			escape_html(url),
			escape_html(title)
		)),
		(Some(title), None) => html.push_str(&format!("<div class=\"embed-title\">{}</div>", escape_html(title))),
		_ => (),
	}
	if let Some(description) = &embed.description {
		html.push_str(&format!("<div>{}</div>", escape_content(description)));
	}
	for (name, value) in &embed.fields {
		html.push_str(&format!(
			"<div class=\"embed-field-name\">{}</div><div>{}</div>",
			escape_html(name),
			escape_content(value)
		));
	}
	html.push_str("</div>");
}

fn format_time(time: &DateTime<Utc>, options: RenderOptions) -> String {
	if options.military_time {
		time.format("%Y-%m-%d %H:%M UTC").to_string()
	} else {
		time.format("%Y-%m-%d %I:%M %p UTC").to_string()
	}
}

fn format_size(size: u64) -> String {
	const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
	let mut value = size as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	if unit == 0 {
		format!("{} {}", size, UNITS[0])
	} else {
		format!("{:.1} {}", value, UNITS[unit])
	}
}

fn escape_html(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#39;")
}

/// Escapes message text and keeps its line breaks
fn escape_content(s: &str) -> String {
	escape_html(s).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transcript::{ReplyReference, TranscriptAuthor, TranscriptReaction};
	use chrono::TimeZone;

	fn header() -> TranscriptHeader {
		TranscriptHeader {
			guild_name: String::from("Dainsleif Mains"),
			guild_icon_url: None,
			channel_name: String::from("ticket-0042"),
			channel_id: 1_100_000_000_000_000_001,
			ticket_id: String::from("5f1c2a"),
			exported_at: Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap(),
		}
	}

	fn author(id: u64, name: &str) -> TranscriptAuthor {
		TranscriptAuthor {
			id,
			display_name: String::from(name),
			avatar_url: None,
			bot: false,
		}
	}

	fn message(id: u64, author: TranscriptAuthor, minute: u32, content: &str) -> TranscriptMessage {
		TranscriptMessage {
			id,
			author,
			content: String::from(content),
			sent_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap(),
			edited_at: None,
			pinned: false,
			notice: None,
			reply_to: None,
			attachments: Vec::new(),
			embeds: Vec::new(),
			stickers: Vec::new(),
			reactions: Vec::new(),
		}
	}

	#[test]
	fn escapes_user_text() {
		let messages = vec![message(
			1,
			author(10, "<script>alert(1)</script>"),
			0,
			"a & b <b>bold</b>\nnext \"line\"",
		)];
		let html = render_transcript(&header(), &messages, RenderOptions::default());
		assert!(!html.contains("<script>"));
		assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
		assert!(html.contains("a &amp; b &lt;b&gt;bold&lt;/b&gt;<br>next &quot;line&quot;"));
	}

	#[test]
	fn groups_consecutive_messages_from_one_author() {
		let alice = author(10, "Alice");
		let bob = author(20, "Bob");
		let messages = vec![
			message(1, alice.clone(), 0, "first"),
			message(2, alice.clone(), 3, "second"),
			message(3, bob, 4, "reply"),
			message(4, alice.clone(), 5, "again"),
			message(5, alice, 30, "much later"),
		];
		let html = render_transcript(&header(), &messages, RenderOptions::default());
		assert_eq!(html.matches("class=\"group\"").count(), 4);
		assert_eq!(html.matches("class=\"message\"").count(), 5);
		assert!(html.contains("id=\"group-1\""));
		assert!(!html.contains("id=\"group-2\""));
		assert!(html.contains("id=\"group-5\""));
	}

	#[test]
	fn replies_start_a_new_group() {
		let alice = author(10, "Alice");
		let mut reply = message(2, alice.clone(), 1, "answer");
		reply.reply_to = Some(ReplyReference {
			message_id: 1,
			author_name: Some(String::from("Alice")),
			excerpt: Some(String::from("question")),
		});
		let messages = vec![message(1, alice, 0, "question"), reply];
		let html = render_transcript(&header(), &messages, RenderOptions::default());
		assert!(html.contains("id=\"group-2\""));
		assert!(html.contains("href=\"#message-1\""));
	}

	#[test]
	fn renders_attachments_embeds_and_reactions() {
		let mut bot = author(30, "Ticket Bot");
		bot.bot = true;
		let mut message = message(1, bot, 0, "");
		message.attachments = vec![
			TranscriptAttachment {
				file_name: String::from("screenshot.png"),
				url: String::from("https://cdn.discordapp.com/attachments/1/2/screenshot.png"),
				size: 1000,
				content_type: Some(String::from("image/png")),
			},
			TranscriptAttachment {
				file_name: String::from("log.txt"),
				url: String::from("https://cdn.discordapp.com/attachments/1/3/log.txt"),
				size: 3 * 1024 * 1024,
				content_type: Some(String::from("text/plain")),
			},
		];
		message.embeds = vec![TranscriptEmbed {
			title: Some(String::from("Ticket opened")),
			url: None,
			description: Some(String::from("Category: Ban appeal")),
			fields: vec![(String::from("User"), String::from("Alice"))],
		}];
		message.reactions = vec![TranscriptReaction {
			emoji: String::from("👍"),
			count: 3,
		}];
		let html = render_transcript(&header(), &[message], RenderOptions::default());
		assert!(html.contains("<img src=\"https://cdn.discordapp.com/attachments/1/2/screenshot.png\""));
		assert!(html.contains(">log.txt</a> (3.0 MB)"));
		assert!(html.contains("<div class=\"embed-title\">Ticket opened</div>"));
		assert!(html.contains("<div class=\"embed-field-name\">User</div><div>Alice</div>"));
		assert!(html.contains("👍 3"));
		assert!(html.contains("BOT"));
	}

	#[test]
	fn system_messages_and_stickers_are_labelled() {
		let alice = author(10, "Alice");
		let mut joined = message(1, alice.clone(), 0, "");
		joined.notice = Some(String::from("joined the server"));
		let mut sticker = message(2, alice, 1, "");
		sticker.stickers = vec![String::from("Wave <3")];
		let html = render_transcript(&header(), &[joined, sticker], RenderOptions::default());
		assert!(html.contains("<div class=\"notice\">joined the server</div>"));
		assert!(html.contains("<div class=\"sticker\">Sticker: Wave &lt;3</div>"));
	}

	#[test]
	fn empty_channel_still_has_header() {
		let html = render_transcript(&header(), &[], RenderOptions::default());
		assert!(html.contains("<h1>Dainsleif Mains</h1>"));
		assert!(html.contains("ticket 5f1c2a"));
		assert!(html.contains("No messages"));
		assert!(html.contains("0 messages"));
	}

	#[test]
	fn clock_follows_options() {
		let html = render_transcript(&header(), &[], RenderOptions { military_time: true });
		assert!(html.contains("2025-03-01 18:30 UTC"));
		let html = render_transcript(&header(), &[], RenderOptions { military_time: false });
		assert!(html.contains("2025-03-01 06:30 PM UTC"));
	}

	#[test]
	fn formats_sizes() {
		assert_eq!(format_size(512), "512 B");
		assert_eq!(format_size(1536), "1.5 KB");
	}
}
