//! Assembled commands and the set of names the dispatcher understands.

use std::borrow::Cow;
use std::fmt;

/// Commands with a known meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
	/// Navigate the main frame to the URL in the first argument.
	Visit,
	/// Return the text of the current document.
	Body,
	/// Any other name. Parsed and discarded without a response.
	Unknown,
}

impl CommandKind {
	pub fn from_name(name: &str) -> Self {
		match name {
			"Visit" => Self::Visit,
			"Body" => Self::Body,
			_ => Self::Unknown,
		}
	}
}

/// A fully framed command.
///
/// Arguments are raw bytes and may contain NUL or newline.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
	name: String,
	arguments: Vec<Vec<u8>>,
}

impl Command {
	pub fn new(name: impl Into<String>, arguments: Vec<Vec<u8>>) -> Self {
		Self {
			name: name.into(),
			arguments,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> CommandKind {
		CommandKind::from_name(&self.name)
	}

	/// Number of arguments the sender declared, all of which were received.
	pub fn declared_arg_count(&self) -> usize {
		self.arguments.len()
	}

	/// First argument, if any.
	pub fn argument(&self) -> Option<&[u8]> {
		self.arguments.first().map(Vec::as_slice)
	}

	/// First argument decoded as UTF-8, replacing invalid sequences.
	pub fn argument_lossy(&self) -> Option<Cow<'_, str>> {
		self.argument().map(String::from_utf8_lossy)
	}

	pub fn arguments(&self) -> &[Vec<u8>] {
		&self.arguments
	}

	pub fn into_arguments(self) -> Vec<Vec<u8>> {
		self.arguments
	}
}

impl fmt::Debug for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let lengths: Vec<usize> = self.arguments.iter().map(Vec::len).collect();
		f.debug_struct("Command")
			.field("name", &self.name)
			.field("argument_lengths", &lengths)
			.finish()
	}
}
