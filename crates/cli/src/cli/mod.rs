
use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Drive a rendering engine with commands read from stdin.
///
/// Commands are framed as a name line, an argument count line, and one
/// length-prefixed block per argument. `Ready` is printed once the browser
/// is usable; each command is answered with `ok\n<len>\n<bytes>`.
#[derive(Parser, Debug)]
#[command(name = "webdrive")]
#[command(version)]
#[command(styles = help_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// JSON configuration file.
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Delay added to every navigation, in milliseconds.
	#[arg(long, value_name = "MS")]
	pub load_latency_ms: Option<u64>,

	/// Largest accepted argument block, in bytes.
	#[arg(long, value_name = "BYTES")]
	pub max_block_bytes: Option<usize>,

	/// How long to wait for in-flight responses after stdin closes, in milliseconds.
	#[arg(long, value_name = "MS")]
	pub drain_timeout_ms: Option<u64>,
}

/// Help colors: bold yellow section headers, green flags, dimmed placeholders
/// and red for rejected values.
fn help_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Green.on_default())
		.placeholder(AnsiColor::BrightBlack.on_default())
		.error(AnsiColor::Red.on_default().bold())
		.invalid(AnsiColor::Red.on_default())
}
