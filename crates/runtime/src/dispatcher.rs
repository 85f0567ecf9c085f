//! Command dispatch.
//!
//! Runs on the reading thread and never touches engine state: each command
//! becomes tasks posted to the control thread. Output is produced later by
//! the finish task or the load-completion drain.

use std::sync::Arc;

use tracing::{debug, warn};
use webdrive_protocol::{Command, CommandKind};

use crate::bridge::EngineThread;
use crate::callbacks::ContentVisitor;
use crate::context::{BrowserState, Context, LoadHook};
use crate::coordinator;

/// Turns [`Command`] values into control-thread work.
pub struct Dispatcher {
	context: Arc<Context>,
}

impl Dispatcher {
	pub fn new(context: Arc<Context>) -> Self {
		Self { context }
	}

	/// Posts the work for `command`. Returns `false` when the command was
	/// ignored or the control thread refused the task; no response will be
	/// written in that case.
	pub fn dispatch(&self, command: Command) -> bool {
		match command.kind() {
			CommandKind::Visit => self.visit(command),
			CommandKind::Body => self.body(),
			CommandKind::Unknown => {
				warn!(name = command.name(), "ignoring unknown command");
				false
			}
		}
	}

	fn visit(&self, command: Command) -> bool {
		let Some(url) = command.argument_lossy().map(|url| url.into_owned()) else {
			warn!("ignoring Visit without a URL");
			return false;
		};

		self.context.expect_response();
		let context = Arc::clone(&self.context);
		let posted = self.post(move || {
			let Some(browser) = context.browser() else {
				warn!(%url, "Visit with no browser; skipping navigation");
				return;
			};
			debug!(%url, "navigating");
			context.transition(BrowserState::Navigating);
			context.bind_load_hook(LoadHook::DrainPending);
			context.engine().navigate(browser.main_frame(), &url);
		});

		if !posted {
			self.context.response_settled();
			return false;
		}
		coordinator::finish(&self.context, None)
	}

	fn body(&self) -> bool {
		self.context.expect_response();
		let context = Arc::clone(&self.context);
		let posted = self.post(move || match context.browser() {
			Some(browser) => {
				let visitor = ContentVisitor::create(&context);
				context
					.engine()
					.extract_document_text(browser.main_frame(), visitor);
			}
			None => {
				warn!("Body with no browser; answering without content");
				coordinator::finish(&context, None);
			}
		});
		if !posted {
			self.context.response_settled();
		}
		posted
	}

	fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
		let posted = self
			.context
			.engine()
			.post_task(EngineThread::Ui, Box::new(task));
		if !posted {
			warn!("control thread no longer accepts tasks");
		}
		posted
	}
}
