//! Command stream reader.
//!
//! [`CommandReader`] walks three states per command:
//!
//! ```text
//! AwaitingCommandName -> AwaitingDeclaration -> AwaitingArguments -> (next command)
//! ```
//!
//! Name and count lines are read line by line. Argument blocks are read by
//! byte count, so they may carry any byte value including `\n` and NUL.
//! The reader is a plain loop; an unbounded stream never grows the stack.


use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::{debug, trace};

use crate::command::Command;
use crate::error::{ReadError, Result};

/// Default upper bound for a single argument block (64 MiB).
pub const DEFAULT_MAX_BLOCK_LEN: usize = 64 * 1024 * 1024;

/// Upper bound for a name, count or length line.
pub const MAX_LINE_LEN: usize = 64 * 1024;

const INITIAL_BLOCK_CAPACITY: usize = 64 * 1024;

/// Position of the reader inside the command grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
	AwaitingCommandName,
	AwaitingDeclaration,
	AwaitingArguments,
}

impl fmt::Display for ReaderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::AwaitingCommandName => "awaiting a command name",
			Self::AwaitingDeclaration => "awaiting the argument count",
			Self::AwaitingArguments => "awaiting arguments",
		})
	}
}

/// Size limits applied while framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
	pub max_block_len: usize,
}

impl Default for ReaderLimits {
	fn default() -> Self {
		Self {
			max_block_len: DEFAULT_MAX_BLOCK_LEN,
		}
	}
}

/// Parses [`Command`] values from a buffered byte stream.
pub struct CommandReader<R> {
	input: R,
	limits: ReaderLimits,
	state: ReaderState,
}

impl<R> CommandReader<R>
where
	R: AsyncBufRead + Unpin,
{
	pub fn new(input: R) -> Self {
		Self::with_limits(input, ReaderLimits::default())
	}

	pub fn with_limits(input: R, limits: ReaderLimits) -> Self {
		Self {
			input,
			limits,
			state: ReaderState::AwaitingCommandName,
		}
	}

	/// Current grammar state. After an error this is the state that failed.
	pub fn state(&self) -> ReaderState {
		self.state
	}

	/// Reads the next complete command.
	///
	/// Returns `Ok(None)` when input ends cleanly at a command boundary.
	/// Any error leaves the in-flight command unfinished; callers should stop
	/// reading.
	pub async fn next_command(&mut self) -> Result<Option<Command>> {
		self.state = ReaderState::AwaitingCommandName;
		let Some(name) = self.read_line().await? else {
			return Ok(None);
		};
		let name = String::from_utf8_lossy(&name).into_owned();

		self.state = ReaderState::AwaitingDeclaration;
		let declared = self.read_number().await?;
		trace!(name = %name, declared, "command header");

		self.state = ReaderState::AwaitingArguments;
		let mut arguments = Vec::with_capacity(declared.min(8));
		while arguments.len() < declared {
			let len = self.read_number().await?;
			if len > self.limits.max_block_len {
				return Err(ReadError::BlockTooLarge {
					len,
					max: self.limits.max_block_len,
				});
			}
			arguments.push(self.read_block(len).await?);
		}

		self.state = ReaderState::AwaitingCommandName;
		Ok(Some(Command::new(name, arguments)))
	}

	/// Gives back the underlying stream.
	pub fn into_inner(self) -> R {
		self.input
	}

	/// Reads one `\n`-terminated line without the terminator (and without a
	/// trailing `\r`). A final line lacking its newline counts as end of input.
	async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
		let mut line = Vec::new();
		let read = (&mut self.input)
			.take(MAX_LINE_LEN as u64 + 1)
			.read_until(b'\n', &mut line)
			.await?;

		if read == 0 {
			return Ok(None);
		}
		if line.last() != Some(&b'\n') {
			if line.len() > MAX_LINE_LEN {
				return Err(ReadError::LineTooLong { max: MAX_LINE_LEN });
			}
			debug!(bytes = line.len(), "discarding unterminated final line");
			return Ok(None);
		}

		line.pop();
		if line.last() == Some(&b'\r') {
			line.pop();
		}
		Ok(Some(line))
	}

	async fn read_number(&mut self) -> Result<usize> {
		let line = self
			.read_line()
			.await?
			.ok_or(ReadError::UnexpectedEof { state: self.state })?;
		parse_number(&line)
	}

	async fn read_block(&mut self, len: usize) -> Result<Vec<u8>> {
		let mut block = Vec::with_capacity(len.min(INITIAL_BLOCK_CAPACITY));
		let received = (&mut self.input)
			.take(len as u64)
			.read_to_end(&mut block)
			.await?;
		if received < len {
			return Err(ReadError::Truncated {
				expected: len,
				received,
			});
		}
		Ok(block)
	}
}

fn parse_number(line: &[u8]) -> Result<usize> {
	std::str::from_utf8(line)
		.ok()
		.and_then(|text| text.trim().parse::<usize>().ok())
		.ok_or_else(|| ReadError::InvalidNumber {
			line: String::from_utf8_lossy(line).into_owned(),
		})
}
