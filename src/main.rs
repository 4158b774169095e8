// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use ticket_transcript::cli::Args;
use ticket_transcript::config::{CONFIG_PATH, parse_config};
use ticket_transcript::discord::{DiscordHistory, GatewaySession, set_up_client};
use ticket_transcript::export::run_export;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
	let args = Args::parse();

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let config = parse_config(CONFIG_PATH).await?;
	let (bot_token, request) = args.into_parts();
	tracing::info!(
		channel = %request.channel_id,
		guild = %request.guild_id,
		ticket = %request.ticket_id,
		"exporting ticket transcript"
	);

	let http_client = set_up_client(&bot_token);
	let history = DiscordHistory::new(http_client);
	let mut session = GatewaySession::new(&bot_token);

	let path = run_export(&mut session, &history, &request, &config).await?;
	println!("{}", path.display());

	Ok(())
}
