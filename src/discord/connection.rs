// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use miette::Diagnostic;
use std::fmt;
use std::sync::Arc;
use twilight_gateway::{CloseFrame, EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::gateway::event::Event;

/// A logged-in connection to the chat backend
#[async_trait]
pub trait Session: Send {
	/// Waits until the backend signals that the session is ready
	async fn wait_ready(&mut self) -> Result<(), SessionError>;

	/// Closes the session
	async fn close(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Diagnostic)]
pub enum SessionError {
	/// The gateway stopped before the session became ready; holds the last close frame received, if any
	Closed(Option<String>),
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Closed(Some(close_frame)) => write!(
				f,
				"Discord gateway closed before becoming ready (is the bot token valid?): {}",
				close_frame
			),
			Self::Closed(None) => write!(f, "Discord gateway closed before becoming ready"),
		}
	}
}

pub fn set_up_client(bot_token: &str) -> Arc<Client> {
	Arc::new(Client::new(bot_token.to_string()))
}

/// A single gateway shard used only to log in, wait for readiness, and log out
pub struct GatewaySession {
	shard: Shard,
	closed: bool,
}

impl GatewaySession {
	pub fn new(bot_token: &str) -> Self {
		let intents = Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;
		let shard = Shard::new(ShardId::ONE, bot_token.to_string(), intents);
		Self { shard, closed: false }
	}
}

/// Events polled for while waiting for readiness. Close frames are always delivered by the shard regardless of
/// the filter.
const WAIT_READY_EVENTS: EventTypeFlags = EventTypeFlags::READY;

/// Events polled for while draining a closing shard; only the close frame matters.
const CLOSING_EVENTS: EventTypeFlags = EventTypeFlags::empty();

/// What a gateway event means for a session waiting to become ready
#[derive(Debug, PartialEq, Eq)]
enum WaitOutcome {
	Ready,
	Closed(Option<String>),
	Continue,
}

fn wait_outcome(event: Event) -> WaitOutcome {
	match event {
		Event::Ready(ready) => {
			tracing::info!(user = %ready.user.name, "Discord gateway is ready");
			WaitOutcome::Ready
		}
		Event::GatewayClose(close_frame) => {
			tracing::warn!(?close_frame, "Discord gateway closed the connection");
			WaitOutcome::Closed(close_frame.map(|frame| format!("{:?}", frame)))
		}
		_ => WaitOutcome::Continue,
	}
}

#[async_trait]
impl Session for GatewaySession {
	async fn wait_ready(&mut self) -> Result<(), SessionError> {
		let mut last_close = None;
		while let Some(event) = self.shard.next_event(WAIT_READY_EVENTS).await {
			let event = match event {
				Ok(event) => event,
				Err(error) => {
					tracing::warn!(source = ?error, "error receiving event");
					continue;
				}
			};
			match wait_outcome(event) {
				WaitOutcome::Ready => return Ok(()),
				WaitOutcome::Closed(close_frame) => last_close = close_frame,
				WaitOutcome::Continue => (),
			}
		}
		// The shard stream only ends on a fatal close, such as an invalid token.
		self.closed = true;
		Err(SessionError::Closed(last_close))
	}

	async fn close(&mut self) -> Result<(), SessionError> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.shard.close(CloseFrame::NORMAL);
		while let Some(event) = self.shard.next_event(CLOSING_EVENTS).await {
			if let Ok(Event::GatewayClose(_)) = event {
				break;
			}
		}
		tracing::debug!("Discord gateway session closed");
		Ok(())
	}
}
