//! Task queue drained by a dedicated thread.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::bridge::Task;
use crate::error::{Error, Result};

enum Job {
	Run(Task),
	Quit,
}

/// FIFO queue of [`Task`]s executed by whichever thread calls [`RunLoop::run`].
///
/// Posting never blocks. After [`RunLoop::quit`] new tasks are refused, and
/// tasks queued before the quit still run.
pub struct RunLoop {
	name: &'static str,
	tx: mpsc::UnboundedSender<Job>,
	rx: Mutex<Option<mpsc::UnboundedReceiver<Job>>>,
	accepting: AtomicBool,
}

impl RunLoop {
	pub fn new(name: &'static str) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			name,
			tx,
			rx: Mutex::new(Some(rx)),
			accepting: AtomicBool::new(true),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Queues `task`. Returns `false` once the loop has been asked to quit.
	pub fn post(&self, task: Task) -> bool {
		if !self.accepting.load(Ordering::Acquire) {
			return false;
		}
		self.tx.send(Job::Run(task)).is_ok()
	}

	/// Stops accepting tasks and makes [`run`](Self::run) return after the
	/// tasks already queued.
	pub fn quit(&self) {
		if self.accepting.swap(false, Ordering::AcqRel) {
			debug!(run_loop = self.name, "quit requested");
			let _ = self.tx.send(Job::Quit);
		}
	}

	pub fn is_accepting(&self) -> bool {
		self.accepting.load(Ordering::Acquire)
	}

	/// Runs tasks on the calling thread until [`quit`](Self::quit). Returns
	/// the number of tasks executed. Must not be called from async code.
	pub fn run(&self) -> Result<usize> {
		let mut rx = self
			.rx
			.lock()
			.take()
			.ok_or(Error::RunLoopTaken(self.name))?;

		debug!(run_loop = self.name, "run loop started");
		let mut executed = 0;
		while let Some(job) = rx.blocking_recv() {
			match job {
				Job::Run(task) => {
					task();
					executed += 1;
				}
				Job::Quit => break,
			}
		}
		trace!(run_loop = self.name, executed, "run loop finished");
		Ok(executed)
	}
}
