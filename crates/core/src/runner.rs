//! The query workflow.
//!
//! ```text
//! Init -> Navigated -> [ModeSelected] -> InputFilled -> Submitted -> Polling -> Done
//! ```
//!
//! The session is closed after every run, whatever the outcome.

use std::fmt;

use async_trait::async_trait;
use chatpoll_protocol::WaitUntil;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::QueryConfig;
use crate::dom::Document;
use crate::error::Result;
use crate::interim::InterimState;
use crate::locator::ControlKind;
use crate::poll::{PollOutcome, ResponseRegion, poll_until_stable};

/// Opens browser sessions for [`QueryRunner`].
#[async_trait]
pub trait Backend: Send + Sync {
	async fn open(&self) -> Result<Box<dyn Session>>;
}

/// One isolated browsing session holding one page.
#[async_trait]
pub trait Session: Send + Sync {
	fn document(&self) -> &dyn Document;

	/// Releases the page, the context and anything the backend started for
	/// this session.
	async fn close(self: Box<Self>) -> Result<()>;
}

/// Workflow position, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Init,
	Navigated,
	ModeSelected,
	InputFilled,
	Submitted,
	Polling,
	Done,
}

impl fmt::Display for RunState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			RunState::Init => "init",
			RunState::Navigated => "navigated",
			RunState::ModeSelected => "mode-selected",
			RunState::InputFilled => "input-filled",
			RunState::Submitted => "submitted",
			RunState::Polling => "polling",
			RunState::Done => "done",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
	pub text: String,
}

impl From<&str> for QueryRequest {
	fn from(text: &str) -> Self {
		Self { text: text.to_string() }
	}
}

impl From<String> for QueryRequest {
	fn from(text: String) -> Self {
		Self { text }
	}
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
	/// Settled reply, the last observation, or the timeout fallback.
	pub text: String,
	/// False when the poll budget ran out.
	pub completed: bool,
	/// Whole-run wall time, including browser startup.
	pub elapsed_seconds: u64,
	pub ticks: u32,
}

/// Submits queries through a [`Backend`] and waits for the reply to settle.
pub struct QueryRunner<B> {
	backend: B,
	config: QueryConfig,
	interim: Box<dyn InterimState>,
}

impl<B: Backend> QueryRunner<B> {
	/// Runner using the configured interim markers.
	pub fn new(backend: B, config: QueryConfig) -> Self {
		let interim = Box::new(config.interim_markers());
		Self { backend, config, interim }
	}

	/// Replaces the interim predicate.
	pub fn with_interim(mut self, interim: impl InterimState + 'static) -> Self {
		self.interim = Box::new(interim);
		self
	}

	pub fn config(&self) -> &QueryConfig {
		&self.config
	}

	/// Runs one query end to end.
	///
	/// Fails on navigation errors and missing input or submit controls. An
	/// exhausted poll budget is not an error: it yields `completed = false`.
	pub async fn run(&self, request: impl Into<QueryRequest>) -> Result<QueryResult> {
		let request = request.into();
		let started = Instant::now();
		let mut state = RunState::Init;
		info!(target = "chatpoll", %state, url = %self.config.url, "starting query");

		let session = self.backend.open().await?;
		let outcome = self.drive(session.document(), &request.text, &mut state).await;
		if let Err(e) = session.close().await {
			warn!(target = "chatpoll", error = %e, "failed to close session");
		}

		let elapsed_seconds = started.elapsed().as_secs();
		match outcome {
			Ok(poll) => {
				transition(&mut state, RunState::Done);
				info!(target = "chatpoll", completed = poll.completed, ticks = poll.ticks, elapsed_seconds, "query finished");
				Ok(QueryResult {
					text: poll.text,
					completed: poll.completed,
					elapsed_seconds,
					ticks: poll.ticks,
				})
			}
			Err(e) => {
				let failed_in = state;
				transition(&mut state, RunState::Done);
				warn!(target = "chatpoll", state = %failed_in, error = %e, elapsed_seconds, "query failed");
				Err(e)
			}
		}
	}

	async fn drive(&self, document: &dyn Document, text: &str, state: &mut RunState) -> Result<PollOutcome> {
		let controls = &self.config.controls;

		document
			.goto(&self.config.url, WaitUntil::NetworkIdle, self.config.navigation_timeout())
			.await?;
		transition(state, RunState::Navigated);

		if let Some(mode) = &controls.mode {
			match mode.locate(document, ControlKind::Mode).await {
				Ok(control) => {
					control.click().await?;
					transition(state, RunState::ModeSelected);
				}
				Err(e) if e.is_control_not_found() => {
					info!(target = "chatpoll", reason = %e, "mode control absent; skipping");
				}
				Err(e) => return Err(e),
			}
		}

		let input = controls.input.locate(document, ControlKind::Input).await?;
		input.fill(text).await?;
		transition(state, RunState::InputFilled);

		let submit = controls.submit.locate(document, ControlKind::Submit).await?;
		submit.click().await?;
		transition(state, RunState::Submitted);

		transition(state, RunState::Polling);
		let region = ResponseRegion::new(document, &self.config.response.selector);
		Ok(poll_until_stable(&region, self.interim.as_ref(), &self.config.poll_settings()).await)
	}
}

fn transition(state: &mut RunState, next: RunState) {
	info!(target = "chatpoll", from = %state, to = %next, "state");
	*state = next;
}

#[cfg(test)]
mod tests;
