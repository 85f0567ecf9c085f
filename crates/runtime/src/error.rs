//! Error types for the webdrive runtime.

use thiserror::Error;
use webdrive_protocol::ReadError;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The command stream could not be framed.
	#[error("command stream error: {0}")]
	Read(#[from] ReadError),

	/// An engine thread stopped accepting tasks.
	#[error("engine stopped before the operation could run")]
	EngineStopped,

	/// The engine already hosts a browser.
	#[error("a browser already exists")]
	BrowserExists,

	/// A run loop was started twice.
	#[error("run loop '{0}' is already running or has finished")]
	RunLoopTaken(&'static str),

	/// A URL could not be parsed or decoded.
	#[error("invalid URL '{url}': {reason}")]
	InvalidUrl { url: String, reason: String },

	/// The engine cannot load this kind of URL.
	#[error("unsupported URL scheme '{0}'")]
	UnsupportedScheme(String),
}
