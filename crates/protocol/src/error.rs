//! Errors raised while framing the command stream.

use thiserror::Error;

use crate::reader::ReaderState;

pub type Result<T> = std::result::Result<T, ReadError>;

/// Framing failures. Each one ends the read loop; none reaches the output.
#[derive(Debug, Error)]
pub enum ReadError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// A count or length line did not hold a non-negative decimal integer.
	#[error("expected a decimal number, got {line:?}")]
	InvalidNumber { line: String },

	/// Input ended in the middle of a command.
	#[error("input ended while {state}")]
	UnexpectedEof { state: ReaderState },

	/// Fewer bytes than declared were available for an argument block.
	#[error("argument block truncated: expected {expected} bytes, received {received}")]
	Truncated { expected: usize, received: usize },

	/// A count or length line ran past the line limit without a newline.
	#[error("control line exceeds {max} bytes")]
	LineTooLong { max: usize },

	#[error("argument block of {len} bytes exceeds the limit of {max}")]
	BlockTooLarge { len: usize, max: usize },
}
