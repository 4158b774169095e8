// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use kdl::{KdlDocument, KdlError, KdlValue};
use miette::Diagnostic;
use std::error::Error;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::read_to_string;

/// Config file looked up in the working directory. The file is optional.
pub const CONFIG_PATH: &str = "transcripts.kdl";

pub const DEFAULT_OUTPUT_DIR: &str = "transcripts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
	/// Directory transcripts are written to. Created if it doesn't exist.
	pub output_dir: PathBuf,
	/// Caps the number of (most recent) messages exported. `None` exports the whole history.
	pub message_limit: Option<usize>,
	/// Whether transcript times use a 24-hour clock.
	pub military_time: bool,
}

impl Default for ConfigDocument {
	fn default() -> Self {
		Self {
			output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
			message_limit: None,
			military_time: true,
		}
	}
}

#[derive(Debug, Diagnostic)]
pub enum ConfigError {
	Io(std::io::Error),
	Parse(KdlError),
	InvalidValue { key: &'static str, expected: &'static str },
}

impl From<std::io::Error> for ConfigError {
	fn from(error: std::io::Error) -> Self {
		Self::Io(error)
	}
}

impl From<KdlError> for ConfigError {
	fn from(error: KdlError) -> Self {
		Self::Parse(error)
	}
}

impl Error for ConfigError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Io(error) => Some(error),
			Self::Parse(error) => Some(error),
			Self::InvalidValue { .. } => None,
		}
	}
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Io(error) => write!(f, "couldn't read config file: {}", error),
			Self::Parse(error) => write!(f, "couldn't parse config file: {}", error),
			Self::InvalidValue { key, expected } => write!(f, "config option `{}` must be {}", key, expected),
		}
	}
}

/// Reads the config file at the given path. A missing file yields the default configuration.
pub async fn parse_config(config_path: &str) -> Result<ConfigDocument, ConfigError> {
	let config_file_contents = match read_to_string(config_path).await {
		Ok(contents) => contents,
		Err(error) if error.kind() == ErrorKind::NotFound => {
			tracing::debug!(path = config_path, "no config file found; using defaults");
			return Ok(ConfigDocument::default());
		}
		Err(error) => return Err(error.into()),
	};
	parse_config_str(&config_file_contents)
}

pub fn parse_config_str(contents: &str) -> Result<ConfigDocument, ConfigError> {
	let document: KdlDocument = contents.parse()?;
	let mut config = ConfigDocument::default();

	if let Some(value) = document.get_arg("output_dir") {
		let output_dir = value.as_string().ok_or(ConfigError::InvalidValue {
			key: "output_dir",
			expected: "a string",
		})?;
		config.output_dir = PathBuf::from(output_dir);
	}

	if let Some(value) = document.get_arg("message_limit") {
		config.message_limit = Some(positive_integer(value).ok_or(ConfigError::InvalidValue {
			key: "message_limit",
			expected: "a positive integer",
		})?);
	}

	if let Some(value) = document.get_arg("military_time") {
		config.military_time = value.as_bool().ok_or(ConfigError::InvalidValue {
			key: "military_time",
			expected: "a boolean",
		})?;
	}

	Ok(config)
}

fn positive_integer(value: &KdlValue) -> Option<usize> {
	let value = value.as_integer()?;
	if value <= 0 {
		return None;
	}
	usize::try_from(value).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_is_default() {
		let config = parse_config_str("").unwrap();
		assert_eq!(config, ConfigDocument::default());
	}

	#[test]
	fn reads_all_options() {
		let config = parse_config_str(
			"output_dir \"/var/www/html/transcripts\"\nmessage_limit 500\nmilitary_time #false\n",
		)
		.unwrap();
		assert_eq!(config.output_dir, PathBuf::from("/var/www/html/transcripts"));
		assert_eq!(config.message_limit, Some(500));
		assert!(!config.military_time);
	}

	#[test]
	fn rejects_wrong_types() {
		let error = parse_config_str("message_limit \"lots\"").unwrap_err();
		assert!(matches!(error, ConfigError::InvalidValue { key: "message_limit", .. }));

		let error = parse_config_str("message_limit 0").unwrap_err();
		assert!(matches!(error, ConfigError::InvalidValue { key: "message_limit", .. }));

		let error = parse_config_str("output_dir 12").unwrap_err();
		assert!(matches!(error, ConfigError::InvalidValue { key: "output_dir", .. }));
	}

	#[test]
	fn rejects_malformed_document() {
		let error = parse_config_str("output_dir \"unterminated").unwrap_err();
		assert!(matches!(error, ConfigError::Parse(_)));
	}

	#[tokio::test]
	async fn missing_file_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("transcripts.kdl");
		let config = parse_config(path.to_str().unwrap()).await.unwrap();
		assert_eq!(config, ConfigDocument::default());
	}

	#[tokio::test]
	async fn reads_file_from_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("transcripts.kdl");
		std::fs::write(&path, "output_dir \"out\"").unwrap();
		let config = parse_config(path.to_str().unwrap()).await.unwrap();
		assert_eq!(config.output_dir, PathBuf::from("out"));
	}
}
