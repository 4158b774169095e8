// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use crate::discord::{ChannelHistory, HistoryError, Session};
use crate::transcript::{RenderOptions, TranscriptHeader, render_transcript, transcript_file_name};
use chrono::Utc;
use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};

/// Identifies the ticket to export. Values are kept exactly as they were given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
	pub channel_id: String,
	pub guild_id: String,
	pub ticket_id: String,
}

#[derive(Debug, Diagnostic)]
pub enum ExportError {
	InvalidChannelId(String),
	InvalidGuildId(String),
	ChannelNotInGuild {
		channel_id: Id<ChannelMarker>,
		guild_id: Id<GuildMarker>,
	},
	History(HistoryError),
	Io(std::io::Error),
}

impl From<HistoryError> for ExportError {
	fn from(error: HistoryError) -> Self {
		Self::History(error)
	}
}

impl From<std::io::Error> for ExportError {
	fn from(error: std::io::Error) -> Self {
		Self::Io(error)
	}
}

impl std::error::Error for ExportError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::History(error) => Some(error),
			Self::Io(error) => Some(error),
			_ => None,
		}
	}
}

impl fmt::Display for ExportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidChannelId(id) => write!(f, "\"{}\" is not a valid channel ID", id),
			Self::InvalidGuildId(id) => write!(f, "\"{}\" is not a valid guild ID", id),
			Self::ChannelNotInGuild { channel_id, guild_id } => {
				write!(f, "channel {} is not in guild {}", channel_id, guild_id)
			}
			Self::History(error) => write!(f, "couldn't read channel history: {}", error),
			Self::Io(error) => write!(f, "couldn't write transcript: {}", error),
		}
	}
}

/// Exports a ticket channel's history to a transcript file, returning the path it was written to
pub async fn export_ticket<H: ChannelHistory + ?Sized>(
	history: &H,
	request: &ExportRequest,
	config: &ConfigDocument,
) -> Result<PathBuf, ExportError> {
	let channel_id: Id<ChannelMarker> = request
		.channel_id
		.parse()
		.map_err(|_| ExportError::InvalidChannelId(request.channel_id.clone()))?;
	let guild_id: Id<GuildMarker> = request
		.guild_id
		.parse()
		.map_err(|_| ExportError::InvalidGuildId(request.guild_id.clone()))?;

	let channel = history.channel_info(channel_id).await?;
	if channel.guild_id != Some(guild_id) {
		return Err(ExportError::ChannelNotInGuild { channel_id, guild_id });
	}
	let guild = history.guild_info(guild_id).await?;
	let messages = history.messages(channel_id, guild_id, config.message_limit).await?;
	tracing::info!(channel = %channel.name, count = messages.len(), "fetched channel history");

	let header = TranscriptHeader {
		guild_name: guild.name,
		guild_icon_url: guild.icon_url,
		channel_name: channel.name,
		channel_id: channel_id.get(),
		ticket_id: request.ticket_id.clone(),
		exported_at: Utc::now(),
	};
	let options = RenderOptions {
		military_time: config.military_time,
	};
	let html = render_transcript(&header, &messages, options);

	tokio::fs::create_dir_all(&config.output_dir).await?;
	let path = config
		.output_dir
		.join(transcript_file_name(&header.channel_name, &header.ticket_id));
	tokio::fs::write(&path, html).await?;
	tracing::info!(path = %path.display(), "wrote transcript");

	Ok(path)
}

/// Runs one complete export: waits for the session to become ready, exports once, then closes the session.
///
/// Once the session is ready it is closed exactly once, whether or not the export succeeds. An export error
/// takes precedence over an error closing the session.
pub async fn run_export<S, H>(
	session: &mut S,
	history: &H,
	request: &ExportRequest,
	config: &ConfigDocument,
) -> miette::Result<PathBuf>
where
	S: Session + ?Sized,
	H: ChannelHistory + ?Sized,
{
	session.wait_ready().await?;

	let export_result = export_ticket(history, request, config).await;
	if let Err(error) = &export_result {
		tracing::error!(source = ?error, "transcript export failed");
	}
	let close_result = session.close().await;

	let path = export_result?;
	close_result?;
	Ok(path)
}
