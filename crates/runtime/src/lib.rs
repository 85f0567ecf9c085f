//! Runtime for the webdrive control plane.
//!
//! The engine runs a single-threaded control loop and reports progress
//! through small reference-counted callback objects. This crate provides:
//!
//! - **Handlers**: [`Handler<T>`], the shared lifecycle for every callback object
//! - **Bridge**: [`EngineBridge`], the interface the engine exposes to the core
//! - **Coordination**: the single-slot [`Mailbox`] and the finish/drain logic
//!   that defers a response until the page finishes loading
//! - **Dispatch**: [`Dispatcher`], turning commands into control-thread tasks
//! - **Session**: [`Session`], wiring the reader thread to the engine
//!
//! # Threads
//!
//! ```text
//! reading thread                      control thread (engine run loop)
//! ──────────────                      ─────────────────────────────────
//! CommandReader ─▶ Dispatcher ─post─▶ navigate / extract / finish task
//!                                      │
//!                                      ├─ still loading ─▶ Mailbox
//!                                      └─ on_load_end ───▶ drain ─▶ stdout
//! ```
//!
//! [`LoopbackEngine`] is an in-process engine used by the binary and tests.

pub mod bridge;
pub mod callbacks;
pub mod context;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod loopback;
pub mod mailbox;
pub mod run_loop;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{BrowserHandle, EngineBridge, EngineThread, FrameHandle, HostHandle, Task};
pub use callbacks::{Client, ClientCapability, ContentVisitor, LifeSpanHandler, LoadHandler};
pub use context::{BrowserState, Context, LoadHook};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use handler::{Callbacks, Handler, HandlerKind, Slot};
pub use loopback::{LoopbackConfig, LoopbackEngine};
pub use mailbox::{Mailbox, SlotOccupied};
pub use run_loop::RunLoop;
pub use session::{ReadEnd, ReadSummary, Session};
