//! Completion polling for the response region.
//!
//! A reply counts as finished once two consecutive non-interim reads agree
//! after trimming. Interim reads and failed reads are skipped without
//! touching the stored observation, so they never break a streak.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::interim::InterimState;
use crate::selector::Selector;

/// Something the poller can read text from once per tick.
#[async_trait]
pub trait ResponseSource: Send + Sync {
	async fn read(&self) -> Result<String>;
}

/// The first element matching a selector on a document.
pub struct ResponseRegion<'a> {
	document: &'a dyn Document,
	selector: &'a Selector,
}

impl<'a> ResponseRegion<'a> {
	pub fn new(document: &'a dyn Document, selector: &'a Selector) -> Self {
		Self { document, selector }
	}
}

#[async_trait]
impl ResponseSource for ResponseRegion<'_> {
	/// Reads `textContent`; a null value reads as empty. Every failure,
	/// including a missing region, is an [`Error::PollRead`].
	async fn read(&self) -> Result<String> {
		let region = self
			.document
			.query_first(self.selector)
			.await
			.map_err(|e| Error::PollRead(e.to_string()))?
			.ok_or_else(|| Error::PollRead(format!("no element matches {}", self.selector)))?;
		let text = region.text_content().await;
		region.release().await;
		Ok(text.map_err(|e| Error::PollRead(e.to_string()))?.unwrap_or_default())
	}
}

/// Tick timing and timeout behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
	pub interval: Duration,
	pub max_ticks: u32,
	/// Returned when the budget runs out with nothing stored.
	pub timeout_fallback: String,
}

impl Default for PollSettings {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(1),
			max_ticks: 1800,
			timeout_fallback: "回复超时，未获取到完整回复".to_string(),
		}
	}
}

/// Two-observation stability check.
#[derive(Debug, Default, Clone)]
pub struct Stability {
	previous: Option<String>,
}

impl Stability {
	/// Feeds one observation. Returns true when it matches the previous one
	/// (both trimmed, non-empty); otherwise stores it.
	pub fn observe(&mut self, text: &str) -> bool {
		let settled = self
			.previous
			.as_deref()
			.map(str::trim)
			.is_some_and(|previous| !previous.is_empty() && previous == text.trim());
		if !settled {
			self.previous = Some(text.to_string());
		}
		settled
	}

	/// Last stored observation.
	pub fn last(&self) -> Option<&str> {
		self.previous.as_deref()
	}
}

/// Result of a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
	pub text: String,
	pub completed: bool,
	/// Ticks consumed, including skipped ones.
	pub ticks: u32,
}

/// Sleeps one interval per tick and reads `source` until the text settles or
/// `settings.max_ticks` ticks pass.
pub async fn poll_until_stable(source: &dyn ResponseSource, interim: &dyn InterimState, settings: &PollSettings) -> PollOutcome {
	let mut stability = Stability::default();

	for tick in 1..=settings.max_ticks {
		tokio::time::sleep(settings.interval).await;

		let text = match source.read().await {
			Ok(text) => text,
			Err(e) => {
				warn!(target = "chatpoll", tick, error = %e, "response read failed; skipping tick");
				continue;
			}
		};

		if interim.is_interim(&text) {
			debug!(target = "chatpoll", tick, "response still interim");
			continue;
		}

		if stability.observe(&text) {
			info!(target = "chatpoll", tick, chars = text.chars().count(), "response settled");
			return PollOutcome {
				text,
				completed: true,
				ticks: tick,
			};
		}
		debug!(target = "chatpoll", tick, chars = text.chars().count(), "response changing");
	}

	warn!(target = "chatpoll", ticks = settings.max_ticks, "poll budget exhausted");
	let text = match stability.last() {
		Some(last) if !last.is_empty() => last.to_string(),
		_ => settings.timeout_fallback.clone(),
	};
	PollOutcome {
		text,
		completed: false,
		ticks: settings.max_ticks,
	}
}
