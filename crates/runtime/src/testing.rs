//! Test doubles: a deterministic engine and a capturable output sink.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::bridge::{BrowserHandle, EngineBridge, EngineThread, FrameHandle, HostHandle, Task};
use crate::callbacks::{Client, ContentVisitor, LifeSpanHandler, LoadHandler};
use crate::context::Context;
use crate::error::Result;
use crate::handler::Handler;
use crate::session::Session;

pub(crate) const BROWSER: BrowserHandle = BrowserHandle::new(1);

/// Output sink shared between the context and the test.
#[derive(Clone, Default)]
pub(crate) struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
	pub fn contents(&self) -> Vec<u8> {
		self.0.lock().clone()
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl Write for SharedOutput {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

/// Engine calls recorded by [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
	CreateBrowser,
	Navigate(String),
	ExtractDocumentText,
	CloseBrowser { force: bool },
	QuitRunLoop,
}

/// Single-threaded engine driven by the test: posted tasks wait in a queue
/// until [`run_pending`](Self::run_pending), and load completion happens
/// only on [`fire_load_end`](Self::fire_load_end).
#[derive(Default)]
pub(crate) struct ScriptedEngine {
	queue: Mutex<VecDeque<Task>>,
	calls: Mutex<Vec<Call>>,
	loading: AtomicBool,
	load_on_navigate: AtomicBool,
	stopped: AtomicBool,
	document: Mutex<String>,
	life_span: Mutex<Option<Handler<LifeSpanHandler>>>,
	load: Mutex<Option<Handler<LoadHandler>>>,
}

impl ScriptedEngine {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Runs queued tasks, including ones posted meanwhile, until the queue is empty.
	pub fn run_pending(&self) -> usize {
		let mut executed = 0;
		loop {
			let task = self.queue.lock().pop_front();
			match task {
				Some(task) => {
					task();
					executed += 1;
				}
				None => return executed,
			}
		}
	}

	pub fn set_loading(&self, loading: bool) {
		self.loading.store(loading, Ordering::SeqCst);
	}

	pub fn set_load_on_navigate(&self, enabled: bool) {
		self.load_on_navigate.store(enabled, Ordering::SeqCst);
	}

	pub fn set_document(&self, text: &str) {
		*self.document.lock() = text.to_string();
	}

	/// Finishes the current navigation and raises `on_load_end`.
	pub fn fire_load_end(&self) {
		self.set_loading(false);
		let load = self.load.lock().clone();
		if let Some(load) = load {
			load.on_load_end(BROWSER);
		}
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn holds_handlers(&self) -> bool {
		self.life_span.lock().is_some() || self.load.lock().is_some()
	}

	fn record(&self, call: Call) {
		self.calls.lock().push(call);
	}
}

impl EngineBridge for ScriptedEngine {
	fn post_task(&self, _thread: EngineThread, task: Task) -> bool {
		if self.stopped.load(Ordering::SeqCst) {
			return false;
		}
		self.queue.lock().push_back(task);
		true
	}

	fn create_browser(&self, client: Handler<Client>) -> Result<()> {
		self.record(Call::CreateBrowser);
		let life_span = client.life_span_handler().into_option();
		*self.load.lock() = client.load_handler().into_option();
		*self.life_span.lock() = life_span.clone();

		if let Some(life_span) = life_span {
			self.post_task(
				EngineThread::Ui,
				Box::new(move || life_span.on_after_created(BROWSER)),
			);
		}
		Ok(())
	}

	fn is_loading(&self, _browser: BrowserHandle) -> bool {
		self.loading.load(Ordering::SeqCst)
	}

	fn navigate(&self, _frame: FrameHandle, url: &str) {
		self.record(Call::Navigate(url.to_string()));
		if self.load_on_navigate.load(Ordering::SeqCst) {
			self.set_loading(true);
		}
	}

	fn extract_document_text(&self, _frame: FrameHandle, visitor: Handler<ContentVisitor>) {
		self.record(Call::ExtractDocumentText);
		let text = self.document.lock().clone();
		self.post_task(EngineThread::Ui, Box::new(move || visitor.visit(&text)));
	}

	fn close_browser(&self, _host: HostHandle, force: bool) {
		self.record(Call::CloseBrowser { force });
		let life_span = self.life_span.lock().take();
		let load = self.load.lock().take();
		drop(load);
		if let Some(life_span) = life_span {
			self.post_task(
				EngineThread::Ui,
				Box::new(move || {
					if !life_span.do_close(BROWSER) || force {
						life_span.on_before_close(BROWSER);
					}
				}),
			);
		}
	}

	fn quit_run_loop(&self) {
		self.record(Call::QuitRunLoop);
		self.stopped.store(true, Ordering::SeqCst);
	}

	fn run_message_loop(&self) -> Result<()> {
		self.run_pending();
		Ok(())
	}
}

/// A session whose browser is already ready.
pub(crate) fn ready_context() -> (Arc<ScriptedEngine>, Arc<Context>, SharedOutput) {
	let engine = ScriptedEngine::new();
	let output = SharedOutput::default();
	let session = Session::start(engine.clone(), Box::new(output.clone())).unwrap();
	engine.run_pending();
	let context = Arc::clone(session.context());
	(engine, context, output)
}
