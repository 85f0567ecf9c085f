//! Single-slot mailbox.
//!
//! Hands a value from the task that found navigation still running to the
//! load-completion event that later drains it. At most one value may be
//! outstanding; a second [`Mailbox::put`] is rejected and the value is
//! handed back to the caller.

use std::fmt;

use parking_lot::Mutex;

/// Rejected write: the slot already held a value.
pub struct SlotOccupied<T>(pub T);

impl<T> SlotOccupied<T> {
	pub fn into_inner(self) -> T {
		self.0
	}
}

impl<T> fmt::Debug for SlotOccupied<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SlotOccupied(..)")
	}
}

impl<T> fmt::Display for SlotOccupied<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("mailbox already holds an undelivered value")
	}
}

impl<T> std::error::Error for SlotOccupied<T> {}

/// Holds at most one value.
pub struct Mailbox<T> {
	slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Mailbox<T> {
	pub fn new() -> Self {
		Self {
			slot: Mutex::new(None),
		}
	}

	/// Stores `value` if the slot is empty.
	pub fn put(&self, value: T) -> Result<(), SlotOccupied<T>> {
		let mut slot = self.slot.lock();
		if slot.is_some() {
			return Err(SlotOccupied(value));
		}
		*slot = Some(value);
		Ok(())
	}

	/// Removes and returns the value, leaving the slot empty.
	pub fn take(&self) -> Option<T> {
		self.slot.lock().take()
	}

	pub fn is_occupied(&self) -> bool {
		self.slot.lock().is_some()
	}
}
