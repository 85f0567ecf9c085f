use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use webdrive_cli::cli::Cli;
use webdrive_cli::config::DriveConfig;
use webdrive_cli::logging;
use webdrive_protocol::ReaderLimits;
use webdrive_runtime::{EngineBridge, LoopbackEngine, ReadEnd, Session};

fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{err:#}");
			eprintln!("webdrive: {err:#}");
			ExitCode::FAILURE
		}
	}
}

/// Runs the engine loop on this thread and the command reader on another.
fn run(cli: &Cli) -> Result<()> {
	let config = DriveConfig::resolve(cli)?;
	info!(?config, "starting");

	let engine = Arc::new(LoopbackEngine::new(config.loopback()).context("failed to start engine")?);
	let session = Session::start(engine.clone(), Box::new(std::io::stdout()))
		.context("failed to create browser")?
		.with_drain_timeout(config.drain_timeout());
	let limits = config.reader_limits();
	// Keeps the session alive until the close sequence has run on this thread.
	let context = Arc::clone(session.context());

	let reader = thread::Builder::new()
		.name("command-reader".into())
		.spawn(move || read_stdin(&session, limits))
		.context("failed to spawn command reader")?;

	engine.run_message_loop().context("engine run loop failed")?;
	drop(context);

	match reader.join() {
		Ok(result) => result,
		Err(_) => bail!("command reader panicked"),
	}
}

fn read_stdin(session: &Session, limits: ReaderLimits) -> Result<()> {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("failed to build reader runtime")?;

	let input = BufReader::new(tokio::io::stdin());
	let result = runtime.block_on(session.read_commands(input, limits));
	// A stdin read may still be parked on the blocking pool.
	runtime.shutdown_background();

	let summary = result?;
	match summary.end {
		ReadEnd::EndOfInput => {
			info!(dispatched = summary.dispatched, ignored = summary.ignored, "done");
		}
		ReadEnd::Aborted(err) => {
			warn!(error = %err, dispatched = summary.dispatched, "malformed command stream; stopped reading");
		}
	}
	Ok(())
}
