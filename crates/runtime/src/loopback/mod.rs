//! In-process engine.
//!
//! [`LoopbackEngine`] implements [`EngineBridge`] without a renderer. The
//! control loop is a [`RunLoop`] driven by [`run_message_loop`]; a second
//! run loop on the `loopback-io` thread resolves documents. Navigation
//! completes asynchronously: `navigate` marks the browser loading, the IO
//! thread loads the document and posts the completion back to the control
//! thread, which fires `on_load_end`.
//!
//! Document text is the raw content of the loaded resource. See
//! [`document::resolve`] for the supported URL schemes.
//!
//! [`run_message_loop`]: EngineBridge::run_message_loop

pub mod document;


use std::mem;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::bridge::{BrowserHandle, EngineBridge, EngineThread, FrameHandle, HostHandle, Task};
use crate::callbacks::{Client, ContentVisitor, LifeSpanHandler, LoadHandler};
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::run_loop::RunLoop;

const BROWSER: BrowserHandle = BrowserHandle::new(1);

/// Loopback engine settings.
#[derive(Debug, Clone, Default)]
pub struct LoopbackConfig {
	/// Extra delay before each navigation completes.
	pub load_latency: Duration,
}

/// An [`EngineBridge`] that loads documents in-process.
pub struct LoopbackEngine {
	shared: Arc<Shared>,
	io_thread: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
	config: LoopbackConfig,
	ui: RunLoop,
	io: RunLoop,
	browser: Mutex<Option<BrowserRecord>>,
}

/// What the engine holds for its one browser.
struct BrowserRecord {
	handle: BrowserHandle,
	client: Handler<Client>,
	life_span: Option<Handler<LifeSpanHandler>>,
	load: Option<Handler<LoadHandler>>,
	loading: bool,
	document: String,
	/// Incremented per navigation; completions for older ones are dropped.
	navigation: u64,
	/// Visitors that asked for text while a load was in flight, keyed by
	/// the navigation they wait on.
	waiting: Vec<(u64, Handler<ContentVisitor>)>,
}

impl LoopbackEngine {
	/// Starts the IO thread. The control loop runs once
	/// [`run_message_loop`](EngineBridge::run_message_loop) is called.
	pub fn new(config: LoopbackConfig) -> Result<Self> {
		let shared = Arc::new(Shared {
			config,
			ui: RunLoop::new("loopback-ui"),
			io: RunLoop::new("loopback-io"),
			browser: Mutex::new(None),
		});

		let io_shared = Arc::clone(&shared);
		let io_thread = thread::Builder::new()
			.name("loopback-io".into())
			.spawn(move || {
				if let Err(err) = io_shared.io.run() {
					warn!(error = %err, "IO run loop failed");
				}
			})?;

		Ok(Self {
			shared,
			io_thread: Mutex::new(Some(io_thread)),
		})
	}

	pub fn config(&self) -> &LoopbackConfig {
		&self.shared.config
	}

	fn weak(&self) -> Weak<Shared> {
		Arc::downgrade(&self.shared)
	}
}

impl Drop for LoopbackEngine {
	fn drop(&mut self) {
		self.shared.io.quit();
		self.shared.ui.quit();
	}
}

impl Shared {
	fn run_loop(&self, thread: EngineThread) -> &RunLoop {
		match thread {
			EngineThread::Ui => &self.ui,
			EngineThread::Io => &self.io,
		}
	}

	/// Control-thread half of a navigation. Visitors parked on this
	/// navigation get its document even when a newer one superseded it.
	fn complete_navigation(&self, navigation: u64, document: String) {
		let (handle, load, waiting) = {
			let mut browser = self.browser.lock();
			let Some(record) = browser.as_mut() else {
				trace!("navigation completed after the browser closed");
				return;
			};
			let (waiting, rest): (Vec<_>, Vec<_>) = mem::take(&mut record.waiting)
				.into_iter()
				.partition(|(waited_on, _)| *waited_on == navigation);
			record.waiting = rest;

			let load = if record.navigation == navigation {
				record.loading = false;
				record.document.clone_from(&document);
				record.load.clone()
			} else {
				trace!(navigation, current = record.navigation, "stale navigation");
				None
			};
			(record.handle, load, waiting)
		};

		if let Some(load) = load {
			debug!(browser = handle.id(), bytes = document.len(), "load finished");
			load.on_load_end(handle);
		}
		for (_, visitor) in waiting {
			visitor.visit(&document);
		}
	}
}

impl EngineBridge for LoopbackEngine {
	fn post_task(&self, thread: EngineThread, task: Task) -> bool {
		self.shared.run_loop(thread).post(task)
	}

	fn create_browser(&self, client: Handler<Client>) -> Result<()> {
		let life_span = client.life_span_handler().into_option();
		let load = client.load_handler().into_option();
		{
			let mut browser = self.shared.browser.lock();
			if browser.is_some() {
				return Err(Error::BrowserExists);
			}
			*browser = Some(BrowserRecord {
				handle: BROWSER,
				client,
				life_span: life_span.clone(),
				load,
				loading: false,
				document: String::new(),
				navigation: 0,
				waiting: Vec::new(),
			});
		}
		info!(browser = BROWSER.id(), "browser created");

		if let Some(life_span) = life_span {
			let posted = self.shared.ui.post(Box::new(move || {
				life_span.on_after_created(BROWSER);
			}));
			if !posted {
				return Err(Error::EngineStopped);
			}
		}
		Ok(())
	}

	fn is_loading(&self, browser: BrowserHandle) -> bool {
		self.shared
			.browser
			.lock()
			.as_ref()
			.is_some_and(|record| record.handle == browser && record.loading)
	}

	fn navigate(&self, frame: FrameHandle, url: &str) {
		let navigation = {
			let mut browser = self.shared.browser.lock();
			let Some(record) = browser
				.as_mut()
				.filter(|record| record.handle == frame.browser())
			else {
				warn!(browser = frame.browser().id(), "navigate on unknown browser");
				return;
			};
			record.loading = true;
			record.navigation += 1;
			record.navigation
		};

		let shared = self.weak();
		let url = url.to_string();
		let latency = self.shared.config.load_latency;
		let posted = self.shared.io.post(Box::new(move || {
			if !latency.is_zero() {
				thread::sleep(latency);
			}
			let document = document::resolve(&url).unwrap_or_else(|err| {
				warn!(%url, error = %err, "load failed; showing an empty document");
				String::new()
			});

			let Some(shared) = shared.upgrade() else {
				return;
			};
			let completion = Arc::downgrade(&shared);
			shared.ui.post(Box::new(move || {
				if let Some(shared) = completion.upgrade() {
					shared.complete_navigation(navigation, document);
				}
			}));
		}));
		if !posted {
			warn!("IO thread stopped; navigation will not complete");
		}
	}

	fn extract_document_text(&self, frame: FrameHandle, visitor: Handler<ContentVisitor>) {
		let text = {
			let mut browser = self.shared.browser.lock();
			match browser
				.as_mut()
				.filter(|record| record.handle == frame.browser())
			{
				Some(record) if record.loading => {
					trace!("load in flight; text follows on completion");
					record.waiting.push((record.navigation, visitor));
					return;
				}
				Some(record) => record.document.clone(),
				None => String::new(),
			}
		};

		if !self.shared.ui.post(Box::new(move || visitor.visit(&text))) {
			warn!("control thread stopped; document text dropped");
		}
	}

	fn close_browser(&self, host: HostHandle, force: bool) {
		let shared = self.weak();
		let browser = host.browser();
		let posted = self.shared.ui.post(Box::new(move || {
			let Some(shared) = shared.upgrade() else {
				return;
			};
			let life_span = match shared.browser.lock().as_ref() {
				Some(record) if record.handle == browser => record.life_span.clone(),
				_ => {
					debug!(browser = browser.id(), "close on a browser that is already gone");
					return;
				}
			};

			let cancelled = life_span
				.as_ref()
				.is_some_and(|life_span| life_span.do_close(browser));
			if cancelled && !force {
				debug!(browser = browser.id(), "close cancelled by handler");
				return;
			}

			let record = shared.browser.lock().take();
			if let Some(life_span) = life_span {
				life_span.on_before_close(browser);
			}
			if let Some(record) = record {
				record.release();
			}
		}));
		if !posted {
			debug!("control thread stopped; close skipped");
		}
	}

	fn quit_run_loop(&self) {
		self.shared.io.quit();
		self.shared.ui.quit();
	}

	fn run_message_loop(&self) -> Result<()> {
		let executed = self.shared.ui.run()?;
		debug!(executed, "control loop finished");

		let io_thread = self.io_thread.lock().take();
		if let Some(io_thread) = io_thread {
			if io_thread.join().is_err() {
				warn!("IO thread panicked");
			}
		}
		Ok(())
	}
}

impl BrowserRecord {
	/// Gives back every handler reference the engine took.
	fn release(self) {
		let Self {
			client,
			life_span,
			load,
			waiting,
			..
		} = self;
		drop(waiting);
		let freed = client.release();
		let life_span = life_span.map(Handler::release);
		let load = load.map(Handler::release);
		debug!(client = freed, ?life_span, ?load, "engine released handlers");
	}
}
