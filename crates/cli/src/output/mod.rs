//! Result rendering.
//!
//! Text mode prints the reply alone on stdout. JSON mode prints an envelope:
//!
//! ```json
//! { "ok": true, "data": { "text": "...", "completed": true, "elapsedSeconds": 7, "ticks": 6 } }
//! ```
//!
//! or, on failure:
//!
//! ```json
//! { "ok": false, "error": { "code": "CONTROL_NOT_FOUND", "message": "submit control not found: ..." } }
//! ```


use std::io::{self, Write};

use chatpoll::QueryResult;
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// The reply text only
	#[default]
	Text,
	/// JSON envelope with the full result
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// Envelope printed in JSON mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
	pub ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T> Envelope<T> {
	pub fn success(data: T) -> Self {
		Self {
			ok: true,
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(error: CommandError) -> Self {
		Self {
			ok: false,
			data: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

/// Stable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	BrowserLaunchFailed,
	NavigationFailed,
	ControlNotFound,
	InteractionFailed,
	SessionError,
	InvalidConfig,
	InvalidInput,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = match self {
			ErrorCode::BrowserLaunchFailed => "BROWSER_LAUNCH_FAILED",
			ErrorCode::NavigationFailed => "NAVIGATION_FAILED",
			ErrorCode::ControlNotFound => "CONTROL_NOT_FOUND",
			ErrorCode::InteractionFailed => "INTERACTION_FAILED",
			ErrorCode::SessionError => "SESSION_ERROR",
			ErrorCode::InvalidConfig => "INVALID_CONFIG",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(code)
	}
}

/// Writes a finished run to `out`.
pub fn write_result(out: &mut impl Write, result: &QueryResult, format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Text => writeln!(out, "{}", result.text),
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut *out, &Envelope::success(result))?;
			writeln!(out)
		}
	}
}

/// Writes a failure envelope to `out`; text mode writes nothing.
pub fn write_error(out: &mut impl Write, error: &CommandError, format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Text => Ok(()),
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut *out, &Envelope::<()>::failure(error.clone()))?;
			writeln!(out)
		}
	}
}

pub fn print_result(result: &QueryResult, format: OutputFormat) {
	let _ = write_result(&mut io::stdout().lock(), result, format);
}

pub fn print_error(error: &CommandError, format: OutputFormat) {
	let _ = write_error(&mut io::stdout().lock(), error, format);
}

/// Human-readable error line on stderr.
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} [{}]: {}", "error".red().bold(), error.code, error.message);
}

/// Stderr notice when the poll budget ran out before the reply settled.
pub fn print_incomplete_notice(result: &QueryResult) {
	eprintln!(
		"{}: reply did not settle within {} ticks ({}s); printing the last observation",
		"warning".yellow().bold(),
		result.ticks,
		result.elapsed_seconds
	);
}
