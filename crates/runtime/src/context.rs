//! Session-wide shared state.
//!
//! One [`Context`] is built at startup and shared by `Arc` with every
//! component. Handlers point back at it through a `Weak`, so the callback
//! objects the engine holds never keep it alive.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use webdrive_protocol::{Response, write_ready};

use crate::bridge::{BrowserHandle, EngineBridge};
use crate::callbacks::Client;
use crate::handler::Handler;
use crate::mailbox::Mailbox;

/// Browser lifecycle as seen by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserState {
	Created,
	HandlersInstalled,
	AwaitingReady,
	Ready,
	Navigating,
	Idle,
	CloseRequested,
	Closing,
	Closed,
}

impl fmt::Display for BrowserState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// What the load handler does when a navigation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadHook {
	/// Nothing bound yet; load events are ignored.
	Unbound,
	/// Deliver the deferred response, if any.
	DrainPending,
}

/// Shared state for one engine session.
pub struct Context {
	engine: Arc<dyn EngineBridge>,
	browser: Mutex<Option<BrowserHandle>>,
	pending: Mailbox<Response>,
	load_hook: Mutex<LoadHook>,
	output: Mutex<Box<dyn Write + Send>>,
	state: Mutex<BrowserState>,
	client: Mutex<Option<Handler<Client>>>,
	ready: watch::Sender<bool>,
	/// Commands dispatched whose response has not been written yet.
	outstanding: watch::Sender<usize>,
	quit_requested: AtomicBool,
}

impl Context {
	/// Creates the context. Responses are written to `output`.
	pub fn new(engine: Arc<dyn EngineBridge>, output: Box<dyn Write + Send>) -> Arc<Self> {
		let (ready, _) = watch::channel(false);
		let (outstanding, _) = watch::channel(0);
		Arc::new(Self {
			engine,
			browser: Mutex::new(None),
			pending: Mailbox::new(),
			load_hook: Mutex::new(LoadHook::Unbound),
			output: Mutex::new(output),
			state: Mutex::new(BrowserState::Created),
			client: Mutex::new(None),
			ready,
			outstanding,
			quit_requested: AtomicBool::new(false),
		})
	}

	pub fn engine(&self) -> &dyn EngineBridge {
		self.engine.as_ref()
	}

	/// The browser, once the engine has reported it ready.
	pub fn browser(&self) -> Option<BrowserHandle> {
		*self.browser.lock()
	}

	pub fn state(&self) -> BrowserState {
		*self.state.lock()
	}

	pub(crate) fn transition(&self, to: BrowserState) {
		let from = std::mem::replace(&mut *self.state.lock(), to);
		if from != to {
			debug!(%from, %to, "browser state");
		}
	}

	/// The deferred-response slot.
	pub fn pending(&self) -> &Mailbox<Response> {
		&self.pending
	}

	pub fn load_hook(&self) -> LoadHook {
		*self.load_hook.lock()
	}

	pub fn bind_load_hook(&self, hook: LoadHook) {
		*self.load_hook.lock() = hook;
	}

	/// Builds the client callback object, keeps one reference for the
	/// lifetime of the session and returns another for the engine.
	pub fn install_client(self: &Arc<Self>) -> Handler<Client> {
		let client = Client::create(self);
		let for_engine = client.add_ref();
		*self.client.lock() = Some(client);
		self.transition(BrowserState::HandlersInstalled);
		for_engine
	}

	/// A receiver that flips to `true` once the browser is ready.
	pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
		self.ready.subscribe()
	}

	pub fn is_ready(&self) -> bool {
		*self.ready.borrow()
	}

	/// Number of responses still owed to the peer.
	pub fn outstanding_responses(&self) -> usize {
		*self.outstanding.borrow()
	}

	pub fn subscribe_outstanding(&self) -> watch::Receiver<usize> {
		self.outstanding.subscribe()
	}

	/// Records that a dispatched command will produce a response.
	pub(crate) fn expect_response(&self) {
		self.outstanding.send_modify(|count| *count += 1);
	}

	/// Records that a response was written or can no longer be.
	pub(crate) fn response_settled(&self) {
		self.outstanding
			.send_modify(|count| *count = count.saturating_sub(1));
	}

	pub fn quit_requested(&self) -> bool {
		self.quit_requested.load(Ordering::Acquire)
	}

	/// Writes one response frame to the output and flushes it.
	pub fn emit(&self, response: &Response) {
		{
			let mut output = self.output.lock();
			if let Err(err) = response.write_to(&mut **output) {
				warn!(error = %err, "failed to write response");
			}
		}
		self.response_settled();
	}

	pub(crate) fn browser_ready(&self, browser: BrowserHandle) {
		{
			let mut current = self.browser.lock();
			if let Some(existing) = *current {
				warn!(
					existing = existing.id(),
					browser = browser.id(),
					"ignoring readiness of a second browser"
				);
				return;
			}
			*current = Some(browser);
		}

		self.transition(BrowserState::Ready);
		{
			let mut output = self.output.lock();
			if let Err(err) = write_ready(&mut **output) {
				warn!(error = %err, "failed to write ready signal");
			}
		}
		self.ready.send_replace(true);
		info!(browser = browser.id(), "browser ready");
	}

	pub(crate) fn close_requested(&self, browser: BrowserHandle) {
		debug!(browser = browser.id(), "close requested");
		self.transition(BrowserState::Closing);
	}

	/// Releases everything the session holds and quits the engine loop.
	/// Only the first call asks the engine to quit.
	pub(crate) fn shutdown(&self) {
		self.transition(BrowserState::Closed);
		self.browser.lock().take();
		self.bind_load_hook(LoadHook::Unbound);

		if self.pending.take().is_some() {
			warn!("dropping a deferred response: browser closed before loading finished");
			self.response_settled();
		}

		let client = self.client.lock().take();
		if let Some(client) = client {
			let freed = client.release();
			debug!(freed, "released client handler");
		}

		if !self.quit_requested.swap(true, Ordering::AcqRel) {
			info!("quitting engine run loop");
			self.engine.quit_run_loop();
		}
	}
}

impl Drop for Context {
	/// The engine loop must not outlive its session: if the session goes
	/// away before the browser finished closing, quit the loop here.
	fn drop(&mut self) {
		if !*self.quit_requested.get_mut() {
			warn!(state = %self.state.get_mut(), "session dropped before the browser closed; quitting engine run loop");
			self.engine.quit_run_loop();
		}
	}
}
