//! Wire layer for the webdrive command stream.
//!
//! Input is a sequence of commands, each framed as:
//!
//! ```text
//! <name>\n
//! <argument count>\n
//! ( <byte length>\n <raw bytes> )*
//! ```
//!
//! Output is one `ok` frame per completed command plus a one-time `Ready`
//! line once the browser is usable.
//!
//! - [`CommandReader`] - iterative state machine producing [`Command`] values
//! - [`write_response`] / [`write_ready`] - output framing

pub mod command;
pub mod error;
pub mod reader;
pub mod response;

pub use command::{Command, CommandKind};
pub use error::{ReadError, Result};
pub use reader::{CommandReader, ReaderLimits, ReaderState};
pub use response::{READY_SIGNAL, Response, write_ready, write_response};
