//! Session wiring.
//!
//! A [`Session`] owns the [`Context`] for one engine browser. It installs the
//! client, asks the engine to create the browser, and runs the command loop
//! on the reading thread:
//!
//! 1. wait for the browser to report ready
//! 2. read and dispatch commands until end of input or a framing error
//! 3. give in-flight responses a bounded time to be written
//! 4. ask the engine to close the browser, which ends its run loop

#[cfg(test)]
mod tests;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};
use webdrive_protocol::{CommandReader, ReadError, ReaderLimits};

use crate::bridge::{EngineBridge, EngineThread};
use crate::context::{BrowserState, Context};
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};

/// Default time allowed for in-flight responses after input ends.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How the command loop ended.
#[derive(Debug)]
pub enum ReadEnd {
	/// Input closed at a command boundary.
	EndOfInput,
	/// The stream could not be framed. The command being read was dropped.
	Aborted(ReadError),
}

/// Outcome of [`Session::read_commands`].
#[derive(Debug)]
pub struct ReadSummary {
	/// Commands handed to the control thread.
	pub dispatched: usize,
	/// Commands read but not dispatched (unknown or malformed).
	pub ignored: usize,
	pub end: ReadEnd,
}

pub struct Session {
	context: Arc<Context>,
	drain_timeout: Duration,
}

impl Session {
	/// Builds the context, installs the client and creates the browser.
	/// Responses and the ready signal are written to `output`.
	pub fn start(engine: Arc<dyn EngineBridge>, output: Box<dyn Write + Send>) -> Result<Self> {
		let context = Context::new(Arc::clone(&engine), output);
		let client = context.install_client();
		context.transition(BrowserState::AwaitingReady);
		engine.create_browser(client)?;
		debug!("browser requested");

		Ok(Self {
			context,
			drain_timeout: DEFAULT_DRAIN_TIMEOUT,
		})
	}

	/// Sets how long [`read_commands`](Self::read_commands) waits for
	/// outstanding responses before closing the browser.
	pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
		self.drain_timeout = timeout;
		self
	}

	pub fn context(&self) -> &Arc<Context> {
		&self.context
	}

	/// Resolves once the browser has reported ready.
	pub async fn wait_until_ready(&self) -> Result<()> {
		let mut ready = self.context.subscribe_ready();
		ready
			.wait_for(|ready| *ready)
			.await
			.map_err(|_| Error::EngineStopped)?;
		Ok(())
	}

	/// Runs the command loop over `input`, then closes the browser.
	pub async fn read_commands<R>(&self, input: R, limits: ReaderLimits) -> Result<ReadSummary>
	where
		R: AsyncBufRead + Unpin,
	{
		self.wait_until_ready().await?;
		info!("reading commands");

		let dispatcher = Dispatcher::new(Arc::clone(&self.context));
		let mut reader = CommandReader::with_limits(input, limits);
		let mut dispatched = 0;
		let mut ignored = 0;

		let end = loop {
			match reader.next_command().await {
				Ok(Some(command)) => {
					debug!(?command, "command");
					if dispatcher.dispatch(command) {
						dispatched += 1;
					} else {
						ignored += 1;
					}
				}
				Ok(None) => break ReadEnd::EndOfInput,
				Err(err) => {
					warn!(error = %err, "command stream broken; stopping");
					break ReadEnd::Aborted(err);
				}
			}
		};
		info!(dispatched, ignored, "input finished");

		self.await_responses().await;
		self.request_close();
		Ok(ReadSummary {
			dispatched,
			ignored,
			end,
		})
	}

	async fn await_responses(&self) {
		if self.context.quit_requested() {
			return;
		}
		let mut outstanding = self.context.subscribe_outstanding();
		let settled = tokio::time::timeout(
			self.drain_timeout,
			outstanding.wait_for(|count| *count == 0),
		)
		.await;
		if settled.is_err() {
			warn!(
				outstanding = self.context.outstanding_responses(),
				"closing with responses still outstanding"
			);
		}
	}

	/// Asks the engine to force-close the browser. The engine's
	/// `on_before_close` then ends the run loop. Without a browser the
	/// session shuts down directly.
	pub fn request_close(&self) {
		let Some(browser) = self.context.browser() else {
			debug!("no browser to close");
			self.context.shutdown();
			return;
		};

		self.context.transition(BrowserState::CloseRequested);
		let context = Arc::clone(&self.context);
		let posted = self.context.engine().post_task(
			EngineThread::Ui,
			Box::new(move || context.engine().close_browser(browser.host(), true)),
		);
		if !posted {
			debug!("control thread already stopped");
			self.context.shutdown();
		}
	}
}
