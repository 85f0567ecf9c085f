//! Reference-counted callback objects.
//!
//! The engine holds on to the callback objects it is given and invokes them
//! from its own threads. Every variant (client, life-span, load, content
//! visitor) shares one lifecycle, [`Handler<T>`], parameterized by its
//! callback table `T`:
//!
//! - [`Handler::add_ref`] hands out another reference
//! - [`Handler::release`] gives one back and reports whether it was the last
//! - [`Handler::has_one_ref`] is an advisory check for sole ownership
//!
//! `release` consumes the handle, so a released reference cannot be used
//! again and the count can never drop below zero.

#[cfg(test)]
mod tests;

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::context::Context;

/// Callback object variants known to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
	Client,
	LifeSpan,
	Load,
	ContentVisitor,
}

impl fmt::Display for HandlerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Client => "client",
			Self::LifeSpan => "life-span",
			Self::Load => "load",
			Self::ContentVisitor => "content-visitor",
		})
	}
}

/// A callback table that can live inside a [`Handler`].
pub trait Callbacks: Send + Sync + 'static {
	const KIND: HandlerKind;
}

/// One entry of a capability set: either provided by us, or left to the
/// engine's built-in behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
	Implemented(T),
	Default,
}

impl<T> Slot<T> {
	pub fn is_implemented(&self) -> bool {
		matches!(self, Self::Implemented(_))
	}

	pub fn as_ref(&self) -> Slot<&T> {
		match self {
			Self::Implemented(value) => Slot::Implemented(value),
			Self::Default => Slot::Default,
		}
	}

	pub fn into_option(self) -> Option<T> {
		match self {
			Self::Implemented(value) => Some(value),
			Self::Default => None,
		}
	}
}

struct HandlerObject<T> {
	context: Weak<Context>,
	callbacks: T,
}

/// Shared reference to a callback object.
///
/// The count starts at one. Cloning is [`add_ref`](Self::add_ref); dropping
/// is a silent [`release`](Self::release). The object (and its callback
/// table) is freed on the release that brings the count to zero, whichever
/// thread performs it.
pub struct Handler<T: Callbacks> {
	inner: Arc<HandlerObject<T>>,
}

impl<T: Callbacks> Handler<T> {
	/// Creates a handler bound to `context`. The handler does not keep the
	/// context alive.
	pub fn new(context: &Arc<Context>, callbacks: T) -> Self {
		Self::with_context(Arc::downgrade(context), callbacks)
	}

	/// Creates a handler with no context. Callbacks that need one become no-ops.
	pub fn detached(callbacks: T) -> Self {
		Self::with_context(Weak::new(), callbacks)
	}

	fn with_context(context: Weak<Context>, callbacks: T) -> Self {
		trace!(kind = %T::KIND, "handler created");
		Self {
			inner: Arc::new(HandlerObject { context, callbacks }),
		}
	}

	/// Takes another reference to this object.
	pub fn add_ref(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}

	/// Gives up this reference. Returns `true` if it was the last one and
	/// the object has been freed.
	pub fn release(self) -> bool {
		let freed = Arc::into_inner(self.inner).is_some();
		trace!(kind = %T::KIND, freed, "handler released");
		freed
	}

	/// Whether this is the only outstanding reference. Advisory: another
	/// thread may add or release a reference right after the check.
	pub fn has_one_ref(&self) -> bool {
		Arc::strong_count(&self.inner) == 1
	}

	/// Current number of references. Advisory, like [`has_one_ref`](Self::has_one_ref).
	pub fn ref_count(&self) -> usize {
		Arc::strong_count(&self.inner)
	}

	/// The context this handler reports to, if it is still alive.
	pub fn context(&self) -> Option<Arc<Context>> {
		self.inner.context.upgrade()
	}

	pub fn kind(&self) -> HandlerKind {
		T::KIND
	}

	/// Whether both handles refer to the same object.
	pub fn ptr_eq(this: &Self, other: &Self) -> bool {
		Arc::ptr_eq(&this.inner, &other.inner)
	}
}

impl<T: Callbacks> Clone for Handler<T> {
	fn clone(&self) -> Self {
		self.add_ref()
	}
}

impl<T: Callbacks> Deref for Handler<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.inner.callbacks
	}
}

impl<T: Callbacks> fmt::Debug for Handler<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler")
			.field("kind", &T::KIND)
			.field("ref_count", &self.ref_count())
			.finish()
	}
}
