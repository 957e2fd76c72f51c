//! Scripted [`Document`] and [`Control`] doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatpoll_protocol::WaitUntil;

use crate::dom::{Control, ControlHandle, Document};
use crate::error::{Error, Result};
use crate::selector::Selector;

type ActionLog = Arc<Mutex<Vec<String>>>;

/// One scripted `text_content` read.
#[derive(Debug, Clone)]
pub(crate) enum Read {
	Text(Option<String>),
	Fail(String),
}

/// Element whose text reads follow a script; the last read repeats.
#[derive(Clone)]
pub(crate) struct FakeElement {
	label: String,
	reads: Arc<Mutex<VecDeque<Read>>>,
	attributes: HashMap<String, String>,
	log: ActionLog,
}

impl FakeElement {
	pub(crate) fn new(text: &str) -> Self {
		Self::scripted([Read::Text(Some(text.to_string()))]).named(text)
	}

	pub(crate) fn scripted(reads: impl IntoIterator<Item = Read>) -> Self {
		Self {
			label: String::new(),
			reads: Arc::new(Mutex::new(reads.into_iter().collect())),
			attributes: HashMap::new(),
			log: ActionLog::default(),
		}
	}

	/// Texts read one per call.
	pub(crate) fn texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
		Self::scripted(texts.into_iter().map(|t| Read::Text(Some(t.to_string()))))
	}

	pub(crate) fn named(mut self, label: &str) -> Self {
		self.label = label.to_string();
		self
	}

	pub(crate) fn with_attribute(mut self, name: &str, value: &str) -> Self {
		self.attributes.insert(name.to_string(), value.to_string());
		self
	}

	fn record(&self, action: String) {
		self.log.lock().unwrap().push(action);
	}
}

#[async_trait]
impl Control for FakeElement {
	async fn text_content(&self) -> Result<Option<String>> {
		let mut reads = self.reads.lock().unwrap();
		let read = if reads.len() > 1 { reads.pop_front() } else { reads.front().cloned() };
		match read {
			Some(Read::Text(text)) => Ok(text),
			Some(Read::Fail(reason)) => Err(Error::Evaluation(reason)),
			None => Ok(None),
		}
	}

	async fn click(&self) -> Result<()> {
		self.record(format!("click {}", self.label));
		Ok(())
	}

	async fn fill(&self, text: &str) -> Result<()> {
		self.record(format!("fill {} {text}", self.label));
		Ok(())
	}

	async fn attribute(&self, name: &str) -> Result<Option<String>> {
		Ok(self.attributes.get(name).cloned())
	}
}

/// Page double keyed by selector string.
#[derive(Clone, Default)]
pub(crate) struct FakeDocument {
	elements: HashMap<String, Vec<FakeElement>>,
	navigation_error: Option<String>,
	log: ActionLog,
}

impl FakeDocument {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Registers the elements returned for `selector`; they share the
	/// document's action log.
	pub(crate) fn with(mut self, selector: &str, elements: impl IntoIterator<Item = FakeElement>) -> Self {
		let elements = elements
			.into_iter()
			.map(|mut element| {
				element.log = Arc::clone(&self.log);
				element
			})
			.collect();
		self.elements.insert(Selector::parse(selector).to_string(), elements);
		self
	}

	pub(crate) fn failing_navigation(mut self, reason: &str) -> Self {
		self.navigation_error = Some(reason.to_string());
		self
	}

	/// Recorded navigations, clicks and fills, in order.
	pub(crate) fn actions(&self) -> Vec<String> {
		self.log.lock().unwrap().clone()
	}
}

#[async_trait]
impl Document for FakeDocument {
	async fn goto(&self, url: &str, _wait_until: WaitUntil, _timeout: Duration) -> Result<()> {
		self.log.lock().unwrap().push(format!("goto {url}"));
		match &self.navigation_error {
			Some(reason) => Err(Error::Navigation {
				url: url.to_string(),
				reason: reason.clone(),
			}),
			None => Ok(()),
		}
	}

	async fn query_all(&self, selector: &Selector) -> Result<Vec<ControlHandle>> {
		Ok(self
			.elements
			.get(&selector.to_string())
			.map(|elements| {
				elements
					.iter()
					.cloned()
					.map(|element| Box::new(element) as ControlHandle)
					.collect()
			})
			.unwrap_or_default())
	}
}
