//! Deferred responses.
//!
//! A command's response is produced by a *finish* task on the control
//! thread. If the page is still loading when it runs, the response is parked
//! in the context's mailbox and delivered by the next `on_load_end`;
//! otherwise it is written immediately. Both paths produce identical frames.

use std::sync::Arc;

use tracing::{debug, error, trace, warn};
use webdrive_protocol::Response;

use crate::bridge::{BrowserHandle, EngineThread};
use crate::context::{BrowserState, Context, LoadHook};
use crate::mailbox::SlotOccupied;

/// Posts the finish task for a command. Safe to call from any thread.
pub fn finish(context: &Arc<Context>, payload: Option<Vec<u8>>) -> bool {
	let response = Response::new(payload);
	let task_context = Arc::clone(context);
	let posted = context.engine().post_task(
		EngineThread::Ui,
		Box::new(move || run_finish(&task_context, response)),
	);
	if !posted {
		warn!("control thread stopped; response dropped");
		context.response_settled();
	}
	posted
}

/// Body of the finish task. Must run on the control thread.
pub(crate) fn run_finish(context: &Context, response: Response) {
	let loading = context
		.browser()
		.is_some_and(|browser| context.engine().is_loading(browser));

	if !loading {
		trace!("responding immediately");
		context.emit(&response);
		return;
	}

	debug!("page still loading; deferring response");
	if let Err(SlotOccupied(rejected)) = context.pending().put(response) {
		error!("a deferred response is already outstanding; delivering it first");
		if let Some(previous) = context.pending().take() {
			context.emit(&previous);
		}
		if let Err(SlotOccupied(rejected)) = context.pending().put(rejected) {
			context.emit(&rejected);
		}
	}
}

/// Load-completion event, raised by the engine on the control thread.
pub fn on_load_end(context: &Context, browser: BrowserHandle) {
	trace!(browser = browser.id(), "load end");
	if context.state() == BrowserState::Navigating {
		context.transition(BrowserState::Idle);
	}

	match context.load_hook() {
		LoadHook::Unbound => trace!("no load hook bound"),
		LoadHook::DrainPending => {
			drain(context);
		}
	}
}

/// Delivers the deferred response, if one is waiting.
pub fn drain(context: &Context) -> bool {
	match context.pending().take() {
		Some(response) => {
			debug!("delivering deferred response");
			context.emit(&response);
			true
		}
		None => false,
	}
}
