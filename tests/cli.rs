// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use clap::error::ErrorKind;
use ticket_transcript::cli::Args;
use ticket_transcript::export::ExportRequest;

#[test]
fn four_arguments_pass_through_unmodified() {
	let args = Args::try_parse_from([
		"ticket-transcript",
		"MTIz.token.value",
		"1100000000000000001",
		"0987",
		" ticket 7 ",
	])
	.unwrap();
	let (bot_token, request) = args.into_parts();
	assert_eq!(bot_token, "MTIz.token.value");
	assert_eq!(
		request,
		ExportRequest {
			channel_id: String::from("1100000000000000001"),
			guild_id: String::from("0987"),
			ticket_id: String::from(" ticket 7 "),
		}
	);
}

#[test]
fn fewer_than_four_arguments_is_a_usage_error() {
	for argv in [
		vec!["ticket-transcript"],
		vec!["ticket-transcript", "token"],
		vec!["ticket-transcript", "token", "111"],
		vec!["ticket-transcript", "token", "111", "222"],
	] {
		let error = Args::try_parse_from(argv).err().unwrap();
		assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
	}
}

#[test]
fn extra_arguments_are_rejected() {
	let error = Args::try_parse_from(["ticket-transcript", "token", "111", "222", "T-1", "extra"])
		.err()
		.unwrap();
	assert_eq!(error.kind(), ErrorKind::UnknownArgument);
}
