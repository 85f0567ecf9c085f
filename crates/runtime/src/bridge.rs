//! Interface between the control plane and the rendering engine.
//!
//! The engine owns a single-threaded control loop. Everything that mutates
//! engine state runs there, either because the engine invoked one of our
//! callbacks or because we posted a [`Task`] to [`EngineThread::Ui`].

use crate::callbacks::{Client, ContentVisitor};
use crate::error::Result;
use crate::handler::Handler;

/// Unit of work executed on an engine thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Engine threads that accept posted tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineThread {
	/// The control thread. Navigation, extraction and all response
	/// bookkeeping happen here.
	Ui,
	/// Background thread for blocking work such as reading files.
	Io,
}

/// Opaque reference to an engine browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrowserHandle {
	id: u32,
}

impl BrowserHandle {
	pub const fn new(id: u32) -> Self {
		Self { id }
	}

	pub fn id(&self) -> u32 {
		self.id
	}

	pub fn main_frame(&self) -> FrameHandle {
		FrameHandle { browser: *self }
	}

	pub fn host(&self) -> HostHandle {
		HostHandle { browser: *self }
	}
}

/// A frame inside a browser. Only the main frame is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle {
	browser: BrowserHandle,
}

impl FrameHandle {
	pub fn browser(&self) -> BrowserHandle {
		self.browser
	}
}

/// Host-side controls of a browser (closing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostHandle {
	browser: BrowserHandle,
}

impl HostHandle {
	pub fn browser(&self) -> BrowserHandle {
		self.browser
	}
}

/// Operations the control plane needs from an engine.
///
/// Events flow back through the handlers installed with
/// [`create_browser`](Self::create_browser): `on_after_created`,
/// `on_load_end`, `do_close` and `on_before_close`.
pub trait EngineBridge: Send + Sync {
	/// Queues `task` on `thread`. Tasks for one thread run in posting order.
	/// Never blocks. Returns `false` if the thread no longer accepts work.
	fn post_task(&self, thread: EngineThread, task: Task) -> bool;

	/// Creates the browser and installs `client`. Readiness is reported
	/// later through the client's life-span handler.
	fn create_browser(&self, client: Handler<Client>) -> Result<()>;

	fn is_loading(&self, browser: BrowserHandle) -> bool;

	/// Starts loading `url` in `frame`. Completion is reported through
	/// `on_load_end`.
	fn navigate(&self, frame: FrameHandle, url: &str);

	/// Calls `visitor.visit` with the document text, asynchronously and
	/// exactly once.
	fn extract_document_text(&self, frame: FrameHandle, visitor: Handler<ContentVisitor>);

	/// Closes the browser. `force` skips the engine's unload prompts.
	fn close_browser(&self, host: HostHandle, force: bool);

	/// Asks [`run_message_loop`](Self::run_message_loop) to return.
	fn quit_run_loop(&self);

	/// Runs the control loop on the calling thread until
	/// [`quit_run_loop`](Self::quit_run_loop).
	fn run_message_loop(&self) -> Result<()>;
}
