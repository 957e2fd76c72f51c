//! Run configuration: [`QueryConfig`] and its sections.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chatpoll_runtime::LaunchOptions;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::context::ContextOptions;
use crate::error::{Error, Result};
use crate::interim::MarkerSet;
use crate::locator::{AriaRole, ControlLocator};
use crate::poll::PollSettings;
use crate::selector::Selector;

pub const DEFAULT_URL: &str = "https://www.stepfun.com/";

/// Reply region on the default target page.
pub const DEFAULT_RESPONSE_SELECTOR: &str = "xpath=/html/body/div/div[5]/div/div/div[1]/div/div[1]/div[1]/div/div[1]/div/div/div[1]/div/div[2]";

/// Everything one query run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
	pub url: String,
	pub navigation_timeout_ms: u64,
	pub browser: BrowserConfig,
	pub context: ContextOptions,
	pub controls: ControlsConfig,
	pub response: ResponseConfig,
	pub poll: PollConfig,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			navigation_timeout_ms: 30_000,
			browser: BrowserConfig::default(),
			context: ContextOptions::default(),
			controls: ControlsConfig::default(),
			response: ResponseConfig::default(),
			poll: PollConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
	pub headless: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub executable: Option<PathBuf>,
	/// Connect here instead of launching a browser.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cdp_endpoint: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub args: Vec<String>,
}

impl Default for BrowserConfig {
	fn default() -> Self {
		Self {
			headless: true,
			executable: None,
			cdp_endpoint: None,
			args: Vec::new(),
		}
	}
}

/// Locators for the controls the workflow drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlsConfig {
	/// Clicked when present; `null` disables the step.
	pub mode: Option<ControlLocator>,
	pub input: ControlLocator,
	pub submit: ControlLocator,
}

impl Default for ControlsConfig {
	fn default() -> Self {
		Self {
			mode: Some(ControlLocator::role(AriaRole::Button, "推理")),
			input: ControlLocator::selector("input, textarea, [contenteditable='true']"),
			submit: ControlLocator::text_boundary("button", "联网", "视频创作"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseConfig {
	pub selector: Selector,
}

impl Default for ResponseConfig {
	fn default() -> Self {
		Self {
			selector: Selector::parse(DEFAULT_RESPONSE_SELECTOR),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollConfig {
	pub interval_ms: u64,
	pub max_ticks: u32,
	pub interim_markers: Vec<String>,
	pub timeout_fallback: String,
}

impl Default for PollConfig {
	fn default() -> Self {
		let settings = PollSettings::default();
		Self {
			interval_ms: settings.interval.as_millis() as u64,
			max_ticks: settings.max_ticks,
			interim_markers: vec!["与 DeepSeek R1 生成".to_string()],
			timeout_fallback: settings.timeout_fallback,
		}
	}
}

impl QueryConfig {
	/// Reads a JSON config file and validates it.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
		let config = Self::from_json(&raw).map_err(|e| match e {
			Error::Config(reason) => Error::Config(format!("{}: {reason}", path.display())),
			other => other,
		})?;
		Ok(config)
	}

	/// Parses and validates a JSON config document.
	pub fn from_json(raw: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects settings that would make a run meaningless.
	pub fn validate(&self) -> Result<()> {
		let url = Url::parse(&self.url).map_err(|e| Error::Config(format!("url {:?}: {e}", self.url)))?;
		if !matches!(url.scheme(), "http" | "https" | "file") {
			return Err(Error::Config(format!("url scheme {:?} is not supported", url.scheme())));
		}
		if self.poll.max_ticks == 0 {
			return Err(Error::Config("poll.maxTicks must be at least 1".into()));
		}
		if self.response.selector.is_empty() {
			return Err(Error::Config("response.selector is empty".into()));
		}
		let locators = [Some(&self.controls.input), Some(&self.controls.submit), self.controls.mode.as_ref()];
		for locator in locators.into_iter().flatten() {
			match locator {
				ControlLocator::TextBoundary { left, right, .. } if left.is_empty() || right.is_empty() => {
					return Err(Error::Config("text boundary markers must not be empty".into()));
				}
				ControlLocator::Selector { selector, .. } if selector.is_empty() => {
					return Err(Error::Config("control selector is empty".into()));
				}
				_ => {}
			}
		}
		Ok(())
	}

	pub fn navigation_timeout(&self) -> Duration {
		Duration::from_millis(self.navigation_timeout_ms)
	}

	pub fn launch_options(&self) -> LaunchOptions {
		LaunchOptions {
			executable: self.browser.executable.clone(),
			headless: self.browser.headless,
			args: self.browser.args.clone(),
			..LaunchOptions::default()
		}
	}

	pub fn poll_settings(&self) -> PollSettings {
		PollSettings {
			interval: Duration::from_millis(self.poll.interval_ms),
			max_ticks: self.poll.max_ticks,
			timeout_fallback: self.poll.timeout_fallback.clone(),
		}
	}

	pub fn interim_markers(&self) -> MarkerSet {
		MarkerSet::new(self.poll.interim_markers.iter().cloned())
	}
}
