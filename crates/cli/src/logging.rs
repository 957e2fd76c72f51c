use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the log file open; flushes it on drop.
#[must_use = "dropping the guard closes the log file"]
pub struct LogGuard {
	file: Option<Arc<File>>,
}

impl Drop for LogGuard {
	fn drop(&mut self) {
		if let Some(file) = &self.file {
			let _ = (&**file).flush();
			let _ = file.sync_data();
		}
	}
}

/// Maps `-v` counts to a filter; `RUST_LOG` wins when set.
pub fn filter_for(verbosity: u8) -> &'static str {
	// 0 = progress lines from chatpoll, warnings from everything else
	// 1 (-v) = chatpoll debug (per-tick observations)
	// 2+ (-vv) = trace, including protocol traffic
	match verbosity {
		0 => "warn,chatpoll=info",
		1 => "info,chatpoll=debug",
		_ => "debug,chatpoll=trace",
	}
}

/// Installs the global subscriber: compact lines on stderr, plus plain lines
/// appended to `log_file` when given.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> io::Result<LogGuard> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);
	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact();

	let file = match log_file {
		Some(path) => Some(Arc::new(OpenOptions::new().create(true).append(true).open(path)?)),
		None => None,
	};
	let file_layer = file.clone().map(|file| {
		tracing_subscriber::fmt::layer()
			.with_writer(file)
			.with_ansi(false)
			.with_target(true)
	});

	tracing_subscriber::registry()
		.with(env_filter)
		.with(stderr_layer)
		.with(file_layer)
		.init();

	Ok(LogGuard { file })
}
