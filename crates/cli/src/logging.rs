use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the global subscriber. Logs always go to stderr; stdout carries
/// only protocol frames.
pub fn init_logging(verbosity: u8) {
	// 0 = warnings and errors
	// 1 (-v) = info, including command counts and lifecycle
	// 2+ (-vv) = debug for everything (state transitions, deferrals)
	let filter = match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
