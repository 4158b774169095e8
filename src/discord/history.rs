// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::timestamp::{datetime_from_timestamp, message_sent_at};
use super::utils::users::{display_name, transcript_author};
use crate::transcript::{
	ReplyReference, TranscriptAttachment, TranscriptEmbed, TranscriptMessage, TranscriptReaction,
};
use async_trait::async_trait;
use miette::Diagnostic;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::iter;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_http::error::Error;
use twilight_http::response::DeserializeBodyError;
use twilight_model::channel::Message;
use twilight_model::channel::message::{EmojiReactionType, MessageType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker};

/// The largest page of messages Discord returns for one request
pub const PAGE_SIZE: u16 = 100;

const REPLY_EXCERPT_LENGTH: usize = 80;

/// The parts of a channel the transcript needs
#[derive(Clone, Debug)]
pub struct ChannelInfo {
	pub name: String,
	pub guild_id: Option<Id<GuildMarker>>,
}

/// The parts of a guild the transcript needs
#[derive(Clone, Debug)]
pub struct GuildInfo {
	pub name: String,
	pub icon_url: Option<String>,
}

/// Error data for getting channel history
#[derive(Debug, Diagnostic)]
pub enum HistoryError {
	Http(Error),
	Deserialize(DeserializeBodyError),
}

impl From<Error> for HistoryError {
	fn from(error: Error) -> Self {
		Self::Http(error)
	}
}

impl From<DeserializeBodyError> for HistoryError {
	fn from(error: DeserializeBodyError) -> Self {
		Self::Deserialize(error)
	}
}

impl std::error::Error for HistoryError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Http(error) => Some(error),
			Self::Deserialize(error) => Some(error),
		}
	}
}

impl fmt::Display for HistoryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Http(error) => write!(f, "HTTP error: {}", error),
			Self::Deserialize(error) => write!(f, "deserialization error: {}", error),
		}
	}
}

/// Source of everything a transcript is built from
#[async_trait]
pub trait ChannelHistory: Send + Sync {
	async fn channel_info(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, HistoryError>;

	async fn guild_info(&self, guild_id: Id<GuildMarker>) -> Result<GuildInfo, HistoryError>;

	/// Gets the messages in the channel, oldest first. With a limit, only the most recent `limit` messages are
	/// returned. Author names use the authors' nicknames in the given guild.
	async fn messages(
		&self,
		channel_id: Id<ChannelMarker>,
		guild_id: Id<GuildMarker>,
		limit: Option<usize>,
	) -> Result<Vec<TranscriptMessage>, HistoryError>;
}

/// Channel history read through the Discord REST API
pub struct DiscordHistory {
	http_client: Arc<Client>,
}

impl DiscordHistory {
	pub fn new(http_client: Arc<Client>) -> Self {
		Self { http_client }
	}

	async fn fetch_page(
		&self,
		channel_id: Id<ChannelMarker>,
		before: Option<Id<MessageMarker>>,
		page_size: u16,
	) -> Result<Vec<Message>, HistoryError> {
		let response = match before {
			Some(before) => {
				self.http_client
					.channel_messages(channel_id)
					.before(before)
					.limit(page_size)
					.await?
			}
			None => self.http_client.channel_messages(channel_id).limit(page_size).await?,
		};
		let messages = response.models().await?;
		tracing::debug!(%channel_id, ?before, count = messages.len(), "fetched message page");
		Ok(messages)
	}

	/// Gets a user's nickname in the guild. Users who have left the guild, or whose member data can't be
	/// retrieved, have no nickname.
	async fn member_nick(&self, guild_id: Id<GuildMarker>, user_id: Id<UserMarker>) -> Option<String> {
		match self.fetch_member_nick(guild_id, user_id).await {
			Ok(nick) => nick,
			Err(error) => {
				tracing::debug!(%user_id, source = ?error, "no member data; using user data");
				None
			}
		}
	}

	async fn fetch_member_nick(
		&self,
		guild_id: Id<GuildMarker>,
		user_id: Id<UserMarker>,
	) -> Result<Option<String>, HistoryError> {
		let member_response = self.http_client.guild_member(guild_id, user_id).await?;
		let member = member_response.model().await?;
		Ok(member.nick)
	}
}

#[async_trait]
impl ChannelHistory for DiscordHistory {
	async fn channel_info(&self, channel_id: Id<ChannelMarker>) -> Result<ChannelInfo, HistoryError> {
		let channel = self.http_client.channel(channel_id).await?.model().await?;
		let name = channel.name.unwrap_or_else(|| channel_id.to_string());
		Ok(ChannelInfo {
			name,
			guild_id: channel.guild_id,
		})
	}

	async fn guild_info(&self, guild_id: Id<GuildMarker>) -> Result<GuildInfo, HistoryError> {
		let guild = self.http_client.guild(guild_id).await?.model().await?;
		let icon_url = guild
			.icon
			.map(|icon| format!("https://cdn.discordapp.com/icons/{}/{}.png", guild.id, icon));
		Ok(GuildInfo {
			name: guild.name,
			icon_url,
		})
	}

	async fn messages(
		&self,
		channel_id: Id<ChannelMarker>,
		guild_id: Id<GuildMarker>,
		limit: Option<usize>,
	) -> Result<Vec<TranscriptMessage>, HistoryError> {
		let history = self;
		let messages = page_backwards(
			limit,
			|message: &Message| message.id,
			move |before, page_size| history.fetch_page(channel_id, before, page_size),
		)
		.await?;

		// Messages from the REST API carry no member data, so nicknames are looked up separately.
		let nicknames = member_nicknames(message_authors(&messages), move |user_id| {
			history.member_nick(guild_id, user_id)
		})
		.await;

		Ok(messages
			.iter()
			.map(|message| transcript_message(message, &nicknames))
			.collect())
	}
}

/// Walks a channel's history from the newest message backwards one page at a time, then returns everything
/// oldest first.
///
/// `fetch_page` gets the ID to fetch before (`None` for the newest page) and the page size. A page shorter than
/// requested ends the history.
pub async fn page_backwards<T, E, F, Fut>(
	limit: Option<usize>,
	id_of: impl Fn(&T) -> Id<MessageMarker>,
	mut fetch_page: F,
) -> Result<Vec<T>, E>
where
	F: FnMut(Option<Id<MessageMarker>>, u16) -> Fut,
	Fut: Future<Output = Result<Vec<T>, E>>,
{
	let mut collected: Vec<T> = Vec::new();
	let mut before = None;
	loop {
		let page_size = match limit {
			Some(limit) => {
				let remaining = limit.saturating_sub(collected.len());
				if remaining == 0 {
					break;
				}
				u16::try_from(remaining).map_or(PAGE_SIZE, |remaining| remaining.min(PAGE_SIZE))
			}
			None => PAGE_SIZE,
		};

		let page = fetch_page(before, page_size).await?;
		let page_len = page.len();
		if let Some(oldest) = page.last() {
			before = Some(id_of(oldest));
		}
		collected.extend(page);

		if page_len < usize::from(page_size) {
			break;
		}
	}
	collected.reverse();
	Ok(collected)
}

/// Looks up the nickname of each distinct user once. Users without a nickname are left out of the map.
pub async fn member_nicknames<F, Fut>(
	user_ids: impl IntoIterator<Item = Id<UserMarker>>,
	mut lookup: F,
) -> HashMap<Id<UserMarker>, String>
where
	F: FnMut(Id<UserMarker>) -> Fut,
	Fut: Future<Output = Option<String>>,
{
	let mut seen = HashSet::new();
	let mut nicknames = HashMap::new();
	for user_id in user_ids {
		if !seen.insert(user_id) {
			continue;
		}
		if let Some(nick) = lookup(user_id).await {
			nicknames.insert(user_id, nick);
		}
	}
	nicknames
}

/// Authors of the messages and of the messages they reply to
fn message_authors(messages: &[Message]) -> impl Iterator<Item = Id<UserMarker>> + '_ {
	messages.iter().flat_map(|message| {
		iter::once(message.author.id).chain(
			message
				.referenced_message
				.as_ref()
				.map(|referenced| referenced.author.id),
		)
	})
}

/// Short description of a system message, shown in place of the (usually empty) content
fn system_notice(kind: MessageType) -> Option<&'static str> {
	match kind {
		MessageType::Regular | MessageType::Reply | MessageType::ChatInputCommand | MessageType::ContextMenuCommand => {
			None
		}
		MessageType::UserJoin => Some("joined the server"),
		MessageType::ChannelMessagePinned => Some("pinned a message to this channel"),
		MessageType::ThreadCreated => Some("started a thread"),
		MessageType::RecipientAdd => Some("added someone to the channel"),
		MessageType::RecipientRemove => Some("removed someone from the channel"),
		MessageType::ChannelNameChange => Some("changed the channel name"),
		MessageType::GuildBoost
		| MessageType::GuildBoostTier1
		| MessageType::GuildBoostTier2
		| MessageType::GuildBoostTier3 => Some("boosted the server"),
		MessageType::AutoModerationAction => Some("AutoMod took action"),
		_ => Some("system message"),
	}
}

/// Gets the author's nickname, preferring the looked-up member data over any member data sent with the message
fn nick_for<'a>(message: &'a Message, nicknames: &'a HashMap<Id<UserMarker>, String>) -> Option<&'a str> {
	nicknames
		.get(&message.author.id)
		.map(String::as_str)
		.or_else(|| message.member.as_ref().and_then(|member| member.nick.as_deref()))
}

fn transcript_message(message: &Message, nicknames: &HashMap<Id<UserMarker>, String>) -> TranscriptMessage {
	let reply_to = message
		.reference
		.as_ref()
		.and_then(|reference| reference.message_id)
		.map(|message_id| {
			let referenced = message.referenced_message.as_deref();
			ReplyReference {
				message_id: message_id.get(),
				author_name: referenced.map(|referenced| {
					display_name(
						nick_for(referenced, nicknames),
						referenced.author.global_name.as_deref(),
						&referenced.author.name,
					)
				}),
				excerpt: referenced.map(|referenced| excerpt(&referenced.content)),
			}
		});

	let attachments = message
		.attachments
		.iter()
		.map(|attachment| TranscriptAttachment {
			file_name: attachment.filename.clone(),
			url: attachment.url.clone(),
			size: attachment.size,
			content_type: attachment.content_type.clone(),
		})
		.collect();

	let embeds = message
		.embeds
		.iter()
		.map(|embed| TranscriptEmbed {
			title: embed.title.clone(),
			url: embed.url.clone(),
			description: embed.description.clone(),
			fields: embed
				.fields
				.iter()
				.map(|field| (field.name.clone(), field.value.clone()))
				.collect(),
		})
		.collect();

	let reactions = message
		.reactions
		.iter()
		.map(|reaction| TranscriptReaction {
			emoji: match &reaction.emoji {
				EmojiReactionType::Unicode { name } => name.clone(),
				EmojiReactionType::Custom { name, id, .. } => match name {
					Some(name) => format!(":{}:", name),
					None => format!(":{}:", id),
				},
			},
			count: reaction.count,
		})
		.collect();

	TranscriptMessage {
		id: message.id.get(),
		author: transcript_author(&message.author, nick_for(message, nicknames)),
		content: message.content.clone(),
		sent_at: message_sent_at(message.id, &message.timestamp),
		edited_at: message.edited_timestamp.as_ref().and_then(datetime_from_timestamp),
		pinned: message.pinned,
		notice: system_notice(message.kind).map(String::from),
		reply_to,
		attachments,
		embeds,
		stickers: message.sticker_items.iter().map(|sticker| sticker.name.clone()).collect(),
		reactions,
	}
}

fn excerpt(content: &str) -> String {
	let mut chars = content.chars();
	let mut excerpt: String = chars.by_ref().take(REPLY_EXCERPT_LENGTH).collect();
	if chars.next().is_some() {
		excerpt.push('…');
	}
	excerpt.replace('\n', " ")
}
