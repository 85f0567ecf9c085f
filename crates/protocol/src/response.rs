//! Output framing.
//!
//! Every completed command produces exactly one frame:
//!
//! ```text
//! ok\n<decimal length>\n<raw bytes>      payload present
//! ok\n0\n                                no payload
//! ```
//!
//! No trailing newline follows the raw bytes.

use std::io::{self, Write};

/// Emitted once when the browser becomes usable.
pub const READY_SIGNAL: &[u8] = b"Ready\n";

/// A response waiting to be written, optionally carrying a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
	payload: Option<Vec<u8>>,
}

impl Response {
	pub fn new(payload: Option<Vec<u8>>) -> Self {
		Self { payload }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
		Self {
			payload: Some(payload.into()),
		}
	}

	pub fn payload(&self) -> Option<&[u8]> {
		self.payload.as_deref()
	}

	/// Writes and flushes this response.
	pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
		write_response(out, self.payload())
	}
}

/// Writes one response frame and flushes `out`.
pub fn write_response<W: Write + ?Sized>(out: &mut W, payload: Option<&[u8]>) -> io::Result<()> {
	out.write_all(b"ok\n")?;
	match payload {
		Some(bytes) => {
			writeln!(out, "{}", bytes.len())?;
			out.write_all(bytes)?;
		}
		None => out.write_all(b"0\n")?,
	}
	out.flush()
}

/// Writes the ready line and flushes `out`.
pub fn write_ready<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
	out.write_all(READY_SIGNAL)?;
	out.flush()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn render(response: &Response) -> Vec<u8> {
		let mut out = Vec::new();
		response.write_to(&mut out).unwrap();
		out
	}

	#[test]
	fn test_payload_frame() {
		assert_eq!(render(&Response::with_payload("hello")), b"ok\n5\nhello");
	}

	#[test]
	fn test_empty_frame() {
		assert_eq!(render(&Response::empty()), b"ok\n0\n");
	}

	#[test]
	fn test_binary_payload_is_verbatim() {
		let payload = b"a\n\0\xffb".to_vec();
		let mut expected = b"ok\n5\n".to_vec();
		expected.extend_from_slice(&payload);
		assert_eq!(render(&Response::with_payload(payload)), expected);
	}

	#[test]
	fn test_length_counts_bytes_not_chars() {
		assert_eq!(render(&Response::with_payload("héllo")), "ok\n6\nhéllo".as_bytes());
	}

	#[test]
	fn test_ready_line() {
		let mut out = Vec::new();
		write_ready(&mut out).unwrap();
		assert_eq!(out, b"Ready\n");
	}
}
