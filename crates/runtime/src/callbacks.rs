//! Callback tables for each handler variant.
//!
//! The engine asks the [`Client`] for the handlers it supports and calls
//! their hooks from the control thread:
//!
//! | Variant            | Hooks                                          |
//! |--------------------|------------------------------------------------|
//! | [`LifeSpanHandler`] | `on_after_created`, `do_close`, `on_before_close` |
//! | [`LoadHandler`]     | `on_load_end`                                  |
//! | [`ContentVisitor`]  | `visit` (once)                                 |
//!
//! Every other client capability is left at [`Slot::Default`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::bridge::BrowserHandle;
use crate::context::Context;
use crate::coordinator;
use crate::handler::{Callbacks, Handler, HandlerKind, Slot};

/// Handler categories an engine may request from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCapability {
	ContextMenu,
	Dialog,
	Display,
	Download,
	Drag,
	Focus,
	Geolocation,
	JsDialog,
	Keyboard,
	LifeSpan,
	Load,
	Render,
	Request,
}

impl ClientCapability {
	pub const ALL: [ClientCapability; 13] = [
		Self::ContextMenu,
		Self::Dialog,
		Self::Display,
		Self::Download,
		Self::Drag,
		Self::Focus,
		Self::Geolocation,
		Self::JsDialog,
		Self::Keyboard,
		Self::LifeSpan,
		Self::Load,
		Self::Render,
		Self::Request,
	];
}

/// Top-level callback object handed to the engine at browser creation.
pub struct Client {
	life_span: Slot<Handler<LifeSpanHandler>>,
	load: Slot<Handler<LoadHandler>>,
}

impl Callbacks for Client {
	const KIND: HandlerKind = HandlerKind::Client;
}

impl Client {
	/// Builds a client whose life-span and load handlers report to `context`.
	pub fn create(context: &Arc<Context>) -> Handler<Client> {
		Handler::new(
			context,
			Client {
				life_span: Slot::Implemented(Handler::new(context, LifeSpanHandler)),
				load: Slot::Implemented(Handler::new(context, LoadHandler)),
			},
		)
	}

	/// Returns a new reference to the life-span handler.
	pub fn life_span_handler(&self) -> Slot<Handler<LifeSpanHandler>> {
		self.life_span.clone()
	}

	/// Returns a new reference to the load handler.
	pub fn load_handler(&self) -> Slot<Handler<LoadHandler>> {
		self.load.clone()
	}

	pub fn provides(&self, capability: ClientCapability) -> bool {
		match capability {
			ClientCapability::LifeSpan => self.life_span.is_implemented(),
			ClientCapability::Load => self.load.is_implemented(),
			_ => false,
		}
	}
}

/// Browser creation and teardown hooks.
pub struct LifeSpanHandler;

impl Callbacks for LifeSpanHandler {
	const KIND: HandlerKind = HandlerKind::LifeSpan;
}

impl Handler<LifeSpanHandler> {
	/// The browser exists and accepts commands.
	pub fn on_after_created(&self, browser: BrowserHandle) {
		if let Some(context) = self.context() {
			context.browser_ready(browser);
		}
	}

	/// A close was requested. Returning `false` lets the close proceed.
	pub fn do_close(&self, browser: BrowserHandle) -> bool {
		if let Some(context) = self.context() {
			context.close_requested(browser);
		}
		false
	}

	/// The browser is about to be destroyed.
	pub fn on_before_close(&self, browser: BrowserHandle) {
		debug!(browser = browser.id(), "browser closing");
		if let Some(context) = self.context() {
			context.shutdown();
		}
	}
}

/// Load progress hooks.
pub struct LoadHandler;

impl Callbacks for LoadHandler {
	const KIND: HandlerKind = HandlerKind::Load;
}

impl Handler<LoadHandler> {
	/// A navigation finished, successfully or not.
	pub fn on_load_end(&self, browser: BrowserHandle) {
		if let Some(context) = self.context() {
			coordinator::on_load_end(&context, browser);
		}
	}
}

/// One-shot receiver for extracted document text.
pub struct ContentVisitor {
	visited: AtomicBool,
}

impl Callbacks for ContentVisitor {
	const KIND: HandlerKind = HandlerKind::ContentVisitor;
}

impl ContentVisitor {
	pub fn create(context: &Arc<Context>) -> Handler<ContentVisitor> {
		Handler::new(
			context,
			ContentVisitor {
				visited: AtomicBool::new(false),
			},
		)
	}

	pub fn was_visited(&self) -> bool {
		self.visited.load(Ordering::Acquire)
	}
}

impl Handler<ContentVisitor> {
	/// Delivers the document text as the pending command's response.
	pub fn visit(&self, text: &str) {
		if self.visited.swap(true, Ordering::AcqRel) {
			warn!("content visitor called more than once; ignoring");
			return;
		}
		let Some(context) = self.context() else {
			debug!("content visited after the session ended");
			return;
		};
		coordinator::finish(&context, Some(text.as_bytes().to_vec()));
	}
}
