//! Error type for the query workflow.

use thiserror::Error;

use crate::locator::ControlKind;

/// Result type alias for chatpoll operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`QueryRunner`](crate::QueryRunner) and the page API.
///
/// Setup failures (launch, navigation, control discovery) abort a run.
/// [`Error::PollRead`] never escapes a run: the poller swallows it and skips
/// the tick.
#[derive(Debug, Error)]
pub enum Error {
	/// The target page could not be reached or never settled.
	#[error("navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	/// A required control is absent from the page.
	#[error("{control} not found: {reason}")]
	ControlNotFound { control: ControlKind, reason: String },

	/// Transient failure reading the response region.
	#[error("failed to read response region: {0}")]
	PollRead(String),

	/// An element exists but cannot be acted on (detached, no layout, ...).
	#[error("cannot {action} element: {reason}")]
	Interaction { action: &'static str, reason: String },

	/// Page-side script threw.
	#[error("script evaluation failed: {0}")]
	Evaluation(String),

	/// The browser could not be started or reached.
	#[error("browser launch failed: {0}")]
	BrowserLaunch(String),

	/// Configuration is unreadable or inconsistent.
	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Runtime(#[from] chatpoll_runtime::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true for [`Error::ControlNotFound`].
	pub fn is_control_not_found(&self) -> bool {
		matches!(self, Error::ControlNotFound { .. })
	}

	/// Returns true for [`Error::Navigation`].
	pub fn is_navigation(&self) -> bool {
		matches!(self, Error::Navigation { .. })
	}
}
