use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::error::Error;
use crate::locator::ControlLocator;
use crate::testing::{FakeDocument, FakeElement};

const MARKER: &str = "in-progress-marker";
const URL: &str = "http://chat.test/";

#[derive(Default)]
struct Counters {
	opened: AtomicUsize,
	closed: AtomicUsize,
}

struct FakeBackend {
	document: FakeDocument,
	counters: Arc<Counters>,
	fail_open: bool,
}

impl FakeBackend {
	fn new(document: FakeDocument) -> (Self, Arc<Counters>) {
		let counters = Arc::new(Counters::default());
		let backend = Self {
			document,
			counters: Arc::clone(&counters),
			fail_open: false,
		};
		(backend, counters)
	}
}

struct FakeSession {
	document: FakeDocument,
	counters: Arc<Counters>,
}

#[async_trait]
impl Backend for FakeBackend {
	async fn open(&self) -> Result<Box<dyn Session>> {
		if self.fail_open {
			return Err(Error::BrowserLaunch("no browser".into()));
		}
		self.counters.opened.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeSession {
			document: self.document.clone(),
			counters: Arc::clone(&self.counters),
		}))
	}
}

#[async_trait]
impl Session for FakeSession {
	fn document(&self) -> &dyn Document {
		&self.document
	}

	async fn close(self: Box<Self>) -> Result<()> {
		self.counters.closed.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

fn config() -> QueryConfig {
	let mut config = QueryConfig {
		url: URL.to_string(),
		..QueryConfig::default()
	};
	config.controls.mode = Some(ControlLocator::selector("button.mode"));
	config.response.selector = "#reply".into();
	config.poll.interim_markers = vec![MARKER.to_string()];
	config
}

fn chat_page(buttons: &[&str], replies: &[&str]) -> FakeDocument {
	FakeDocument::new()
		.with("button.mode", [FakeElement::new("推理").named("mode")])
		.with("input, textarea, [contenteditable='true']", [FakeElement::new("").named("prompt")])
		.with(
			"button",
			buttons.iter().map(|text| if text.is_empty() { FakeElement::new("").named("send") } else { FakeElement::new(text) }),
		)
		.with("#reply", [FakeElement::texts(replies.iter().copied())])
}

fn standard_page(replies: &[&str]) -> FakeDocument {
	chat_page(&["新对话", "联网", "", "视频创作"], replies)
}

#[tokio::test(start_paused = true)]
async fn settles_on_repeated_reply() {
	let document = standard_page(&["", "thinking: in-progress-marker", "partial", "partial"]);
	let (backend, counters) = FakeBackend::new(document.clone());

	let result = QueryRunner::new(backend, config()).run("排序代码").await.unwrap();

	assert_eq!(
		result,
		QueryResult {
			text: "partial".into(),
			completed: true,
			elapsed_seconds: 4,
			ticks: 4,
		}
	);
	assert_eq!(document.actions(), [format!("goto {URL}"), "click mode".into(), "fill prompt 排序代码".into(), "click send".into()]);
	assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_returns_last_observation() {
	let (backend, counters) = FakeBackend::new(standard_page(&["a", "b", "c", "d", "e"]));
	let mut config = config();
	config.poll.max_ticks = 5;

	let result = QueryRunner::new(backend, config).run("q").await.unwrap();

	assert!(!result.completed);
	assert_eq!(result.text, "e");
	assert_eq!(result.ticks, 5);
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_without_text_uses_fallback() {
	let (backend, _) = FakeBackend::new(standard_page(&[MARKER]));
	let mut config = config();
	config.poll.max_ticks = 3;
	config.poll.timeout_fallback = "timed out".into();

	let result = QueryRunner::new(backend, config).run("q").await.unwrap();

	assert!(!result.completed);
	assert_eq!(result.text, "timed out");
}

#[tokio::test(start_paused = true)]
async fn missing_boundary_fails_before_polling() {
	let document = chat_page(&["联网", "", "设置"], &["never read"]);
	let (backend, counters) = FakeBackend::new(document.clone());

	let err = QueryRunner::new(backend, config()).run("q").await.unwrap_err();

	assert!(matches!(
		err,
		Error::ControlNotFound {
			control: ControlKind::Submit,
			..
		}
	));
	assert!(!document.actions().contains(&"click send".to_string()));
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn adjacent_boundaries_leave_no_submit_control() {
	let (backend, counters) = FakeBackend::new(chat_page(&["联网", "视频创作", ""], &["x"]));

	let err = QueryRunner::new(backend, config()).run("q").await.unwrap_err();

	assert!(err.is_control_not_found());
	assert!(err.to_string().contains("nothing strictly between"));
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_input_is_control_not_found() {
	let document = FakeDocument::new()
		.with("button", [FakeElement::new("联网"), FakeElement::new("发送"), FakeElement::new("视频创作")])
		.with("#reply", [FakeElement::new("x")]);
	let (backend, counters) = FakeBackend::new(document);

	let err = QueryRunner::new(backend, config()).run("q").await.unwrap_err();

	assert!(matches!(err, Error::ControlNotFound { control: ControlKind::Input, .. }));
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn absent_mode_control_is_skipped() {
	let mut config = config();
	config.controls.mode = Some(ControlLocator::selector("button.missing"));
	let document = standard_page(&["done", "done"]);
	let (backend, _) = FakeBackend::new(document.clone());

	let result = QueryRunner::new(backend, config).run("q").await.unwrap();

	assert!(result.completed);
	assert!(!document.actions().contains(&"click mode".to_string()));
	assert!(document.actions().contains(&"click send".to_string()));
}

#[tokio::test(start_paused = true)]
async fn disabled_mode_step_never_queries() {
	let mut config = config();
	config.controls.mode = None;
	let document = standard_page(&["done", "done"]);
	let (backend, _) = FakeBackend::new(document.clone());

	QueryRunner::new(backend, config).run("q").await.unwrap();

	assert_eq!(document.actions()[1], "fill prompt q");
}

#[tokio::test(start_paused = true)]
async fn navigation_failure_closes_session() {
	let document = standard_page(&["x"]).failing_navigation("net::ERR_NAME_NOT_RESOLVED");
	let (backend, counters) = FakeBackend::new(document.clone());

	let err = QueryRunner::new(backend, config()).run("q").await.unwrap_err();

	assert!(err.is_navigation());
	assert_eq!(document.actions(), [format!("goto {URL}")]);
	assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn open_failure_has_nothing_to_close() {
	let (mut backend, counters) = FakeBackend::new(FakeDocument::new());
	backend.fail_open = true;

	let err = QueryRunner::new(backend, config()).run("q").await.unwrap_err();

	assert!(matches!(err, Error::BrowserLaunch(_)));
	assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_interim_predicate() {
	let (backend, _) = FakeBackend::new(standard_page(&["…", "…", "answer", "answer"]));

	let result = QueryRunner::new(backend, config())
		.with_interim(|text: &str| text == "…")
		.run(QueryRequest::from("q"))
		.await
		.unwrap();

	assert_eq!(result.text, "answer");
	assert_eq!(result.ticks, 4);
}

#[test]
fn result_serializes_camel_case() {
	let result = QueryResult {
		text: "hi".into(),
		completed: false,
		elapsed_seconds: 12,
		ticks: 3,
	};
	assert_eq!(
		serde_json::to_value(&result).unwrap(),
		serde_json::json!({ "text": "hi", "completed": false, "elapsedSeconds": 12, "ticks": 3 })
	);
}
