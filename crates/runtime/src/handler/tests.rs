use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::*;
use crate::testing::ScriptedEngine;

/// Counts how many times it has been dropped.
struct Probe {
	drops: Arc<AtomicUsize>,
}

impl Callbacks for Probe {
	const KIND: HandlerKind = HandlerKind::ContentVisitor;
}

impl Drop for Probe {
	fn drop(&mut self) {
		self.drops.fetch_add(1, Ordering::SeqCst);
	}
}

fn probe() -> (Handler<Probe>, Arc<AtomicUsize>) {
	let drops = Arc::new(AtomicUsize::new(0));
	let handler = Handler::detached(Probe {
		drops: Arc::clone(&drops),
	});
	(handler, drops)
}

#[test]
fn test_new_handler_has_one_ref() {
	let (handler, drops) = probe();
	assert!(handler.has_one_ref());
	assert_eq!(handler.kind(), HandlerKind::ContentVisitor);

	assert!(handler.release());
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_add_ref_then_release_keeps_object() {
	let (handler, drops) = probe();
	let extra = handler.add_ref();
	assert_eq!(handler.ref_count(), 2);
	assert!(!handler.has_one_ref());

	assert!(!extra.release());
	assert!(handler.has_one_ref());
	assert_eq!(drops.load(Ordering::SeqCst), 0);

	assert!(handler.release());
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_is_a_release() {
	let (handler, drops) = probe();
	let extra = handler.clone();
	drop(handler);
	assert!(extra.has_one_ref());
	drop(extra);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_releases_free_exactly_once() {
	for _ in 0..50 {
		let (handler, drops) = probe();
		let refs: Vec<_> = (0..8).map(|_| handler.add_ref()).collect();
		drop(handler);

		let freed: usize = refs
			.into_iter()
			.map(|r| thread::spawn(move || r.release()))
			.collect::<Vec<_>>()
			.into_iter()
			.map(|t| usize::from(t.join().unwrap()))
			.sum();

		assert_eq!(freed, 1);
		assert_eq!(drops.load(Ordering::SeqCst), 1);
	}
}

#[test]
fn test_add_ref_release_churn_across_threads() {
	let (handler, drops) = probe();
	let workers: Vec<_> = (0..4)
		.map(|_| {
			let own = handler.add_ref();
			thread::spawn(move || {
				for _ in 0..10_000 {
					let extra = own.add_ref();
					assert!(!extra.release());
				}
				own.release()
			})
		})
		.collect();

	for worker in workers {
		assert!(!worker.join().unwrap());
	}
	assert!(handler.has_one_ref());
	assert!(handler.release());
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_context_is_weak() {
	let engine = ScriptedEngine::new();
	let context = Context::new(engine, Box::new(Vec::new()));
	let drops = Arc::new(AtomicUsize::new(0));
	let handler = Handler::new(
		&context,
		Probe {
			drops: Arc::clone(&drops),
		},
	);

	assert!(handler.context().is_some());
	assert_eq!(Arc::strong_count(&context), 1);

	drop(context);
	assert!(handler.context().is_none());
	assert!(handler.release());
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_slot_accessors() {
	let implemented: Slot<u8> = Slot::Implemented(3);
	assert!(implemented.is_implemented());
	assert_eq!(implemented.as_ref(), Slot::Implemented(&3));
	assert_eq!(implemented.into_option(), Some(3));

	let default: Slot<u8> = Slot::Default;
	assert!(!default.is_implemented());
	assert_eq!(default.into_option(), None);
}
