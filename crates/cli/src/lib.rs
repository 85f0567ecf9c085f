//! Command-line front end for webdrive.
//!
//! The binary reads commands from stdin on a dedicated thread and runs the
//! engine's control loop on the main thread. Only protocol frames are
//! written to stdout; diagnostics go to stderr.

pub mod cli;
pub mod config;
pub mod logging;
