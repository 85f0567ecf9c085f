//! Run configuration: a JSON file, then command-line overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use webdrive_protocol::ReaderLimits;
use webdrive_protocol::reader::DEFAULT_MAX_BLOCK_LEN;
use webdrive_runtime::LoopbackConfig;
use webdrive_runtime::session::DEFAULT_DRAIN_TIMEOUT;

use crate::cli::Cli;

/// Settings for one run. Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DriveConfig {
	/// Delay added to every navigation of the loopback engine.
	pub load_latency_ms: u64,
	/// Largest argument block the reader accepts.
	pub max_block_bytes: usize,
	/// Grace period for in-flight responses once input ends.
	pub drain_timeout_ms: u64,
}

impl Default for DriveConfig {
	fn default() -> Self {
		Self {
			load_latency_ms: 0,
			max_block_bytes: DEFAULT_MAX_BLOCK_LEN,
			drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT.as_millis() as u64,
		}
	}
}

impl DriveConfig {
	/// Reads a config file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read config {}", path.display()))?;
		serde_json::from_str(&content)
			.with_context(|| format!("invalid config {}", path.display()))
	}

	/// The file named by `--config` (or defaults), with flags applied on top.
	pub fn resolve(cli: &Cli) -> Result<Self> {
		let mut config = match &cli.config {
			Some(path) => Self::load(path)?,
			None => Self::default(),
		};
		config.apply_overrides(cli);
		Ok(config)
	}

	pub fn apply_overrides(&mut self, cli: &Cli) {
		if let Some(ms) = cli.load_latency_ms {
			self.load_latency_ms = ms;
		}
		if let Some(bytes) = cli.max_block_bytes {
			self.max_block_bytes = bytes;
		}
		if let Some(ms) = cli.drain_timeout_ms {
			self.drain_timeout_ms = ms;
		}
	}

	pub fn reader_limits(&self) -> ReaderLimits {
		ReaderLimits {
			max_block_len: self.max_block_bytes,
		}
	}

	pub fn loopback(&self) -> LoopbackConfig {
		LoopbackConfig {
			load_latency: Duration::from_millis(self.load_latency_ms),
		}
	}

	pub fn drain_timeout(&self) -> Duration {
		Duration::from_millis(self.drain_timeout_ms)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use clap::Parser;

	use super::*;

	fn write_config(json: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(json.as_bytes()).unwrap();
		file
	}

	#[test]
	fn defaults_without_file() {
		let cli = Cli::try_parse_from(["webdrive"]).unwrap();
		let config = DriveConfig::resolve(&cli).unwrap();
		assert_eq!(config, DriveConfig::default());
		assert_eq!(config.reader_limits(), ReaderLimits::default());
		assert_eq!(config.drain_timeout(), DEFAULT_DRAIN_TIMEOUT);
	}

	#[test]
	fn partial_file_keeps_defaults() {
		let file = write_config(r#"{ "loadLatencyMs": 40 }"#);
		let config = DriveConfig::load(file.path()).unwrap();
		assert_eq!(config.load_latency_ms, 40);
		assert_eq!(config.max_block_bytes, DEFAULT_MAX_BLOCK_LEN);
		assert_eq!(config.loopback().load_latency, Duration::from_millis(40));
	}

	#[test]
	fn flags_override_file() {
		let file = write_config(r#"{ "loadLatencyMs": 40, "maxBlockBytes": 1024 }"#);
		let path = file.path().to_str().unwrap();
		let cli = Cli::try_parse_from(["webdrive", "--config", path, "--max-block-bytes", "16"]).unwrap();

		let config = DriveConfig::resolve(&cli).unwrap();
		assert_eq!(config.load_latency_ms, 40);
		assert_eq!(config.max_block_bytes, 16);
		assert_eq!(config.reader_limits().max_block_len, 16);
	}

	#[test]
	fn unknown_field_is_rejected() {
		let file = write_config(r#"{ "loadLatency": 40 }"#);
		let err = DriveConfig::load(file.path()).unwrap_err();
		assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
	}

	#[test]
	fn missing_file_names_the_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.json");
		let err = DriveConfig::load(&path).unwrap_err();
		assert!(err.to_string().contains("absent.json"), "{err}");
	}
}
