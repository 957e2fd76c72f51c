use std::path::PathBuf;

use chatpoll::{QueryConfig, Selector};
use clap::Parser;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

pub const DEFAULT_LOG_FILE: &str = "chatpoll.log";

#[derive(Parser, Debug)]
#[command(name = "chatpoll")]
#[command(about = "Submit a query to a web chat page and print the reply once it settles")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Query text; words are joined with spaces. Omit or pass `-` to read stdin
	#[arg(value_name = "QUERY")]
	pub query: Vec<String>,

	/// JSON configuration file
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Chat page URL
	#[arg(long)]
	pub url: Option<String>,

	/// Poll budget in ticks
	#[arg(long, value_name = "N")]
	pub max_ticks: Option<u32>,

	/// Delay between polls in milliseconds
	#[arg(long, value_name = "MS")]
	pub interval_ms: Option<u64>,

	/// Show the browser window
	#[arg(long)]
	pub headed: bool,

	/// Connect to a running browser (ws:// URL or http:// DevTools base URL)
	#[arg(long, value_name = "URL")]
	pub cdp_endpoint: Option<String>,

	/// Browser executable to launch
	#[arg(long, value_name = "PATH")]
	pub executable: Option<PathBuf>,

	/// Selector of the reply region (CSS, or XPath with `xpath=` or a leading `/`)
	#[arg(long, value_name = "SELECTOR")]
	pub response_selector: Option<String>,

	/// Substring marking an in-progress reply (repeatable; replaces configured markers)
	#[arg(long = "interim-marker", value_name = "TEXT")]
	pub interim_markers: Vec<String>,

	/// Output format
	#[arg(short = 'f', long, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Also write logs to this file
	#[arg(long, value_name = "FILE", default_value = DEFAULT_LOG_FILE)]
	pub log_file: PathBuf,

	/// Do not write a log file
	#[arg(long, conflicts_with = "log_file")]
	pub no_log_file: bool,

	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

impl Cli {
	/// Log file path unless disabled.
	pub fn log_path(&self) -> Option<&PathBuf> {
		(!self.no_log_file).then_some(&self.log_file)
	}

	/// Query words joined with spaces, or `None` when stdin should be read.
	pub fn inline_query(&self) -> Option<String> {
		match self.query.as_slice() {
			[] => None,
			[only] if only == "-" => None,
			words => Some(words.join(" ")),
		}
	}

	/// Applies command-line overrides on top of a loaded config.
	pub fn apply_overrides(&self, config: &mut QueryConfig) {
		if let Some(url) = &self.url {
			config.url = url.clone();
		}
		if let Some(max_ticks) = self.max_ticks {
			config.poll.max_ticks = max_ticks;
		}
		if let Some(interval_ms) = self.interval_ms {
			config.poll.interval_ms = interval_ms;
		}
		if self.headed {
			config.browser.headless = false;
		}
		if let Some(endpoint) = &self.cdp_endpoint {
			config.browser.cdp_endpoint = Some(endpoint.clone());
		}
		if let Some(executable) = &self.executable {
			config.browser.executable = Some(executable.clone());
		}
		if let Some(selector) = &self.response_selector {
			config.response.selector = Selector::parse(selector);
		}
		if !self.interim_markers.is_empty() {
			config.poll.interim_markers = self.interim_markers.clone();
		}
	}
}
