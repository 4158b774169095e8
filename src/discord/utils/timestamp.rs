// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, TimeZone, Utc};
use twilight_model::util::datetime::Timestamp;
use twilight_util::snowflake::Snowflake;

/// Gets the timestamp from the ID snowflake. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_id(id: impl Snowflake) -> Option<DateTime<Utc>> {
	let timestamp = id.timestamp();
	Utc.timestamp_millis_opt(timestamp).single()
}

/// Gets the [DateTime] object for a timestamp from Discord. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_timestamp(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
	let micros = timestamp.as_micros();
	Utc.timestamp_micros(micros).single()
}

/// Gets the time a message was sent, preferring the timestamp Discord sent and falling back to the one
/// encoded in the message ID.
pub fn message_sent_at(id: impl Snowflake, timestamp: &Timestamp) -> DateTime<Utc> {
	datetime_from_timestamp(timestamp)
		.or_else(|| datetime_from_id(id))
		.unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::id::Id;
	use twilight_model::id::marker::MessageMarker;

	#[test]
	fn id_timestamp_uses_discord_epoch() {
		// 175928847299117063 is the example snowflake from Discord's documentation.
		let id: Id<MessageMarker> = Id::new(175_928_847_299_117_063);
		let datetime = datetime_from_id(id).unwrap();
		assert_eq!(datetime.timestamp_millis(), 1_462_015_105_796);
	}

	#[test]
	fn discord_timestamp_converts() {
		let timestamp = Timestamp::from_secs(1_700_000_000).unwrap();
		let datetime = datetime_from_timestamp(&timestamp).unwrap();
		assert_eq!(datetime.timestamp(), 1_700_000_000);

		let id: Id<MessageMarker> = Id::new(175_928_847_299_117_063);
		assert_eq!(message_sent_at(id, &timestamp), datetime);
	}
}
