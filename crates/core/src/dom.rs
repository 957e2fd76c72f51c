//! Object-safe view of a page and its elements.
//!
//! The workflow, the locators and the poller only see these traits.
//! [`Page`](crate::Page) and [`ElementHandle`](crate::ElementHandle) implement
//! them over the DevTools protocol; tests implement them over scripted data.

use std::time::Duration;

use async_trait::async_trait;
use chatpoll_protocol::WaitUntil;

use crate::error::Result;
use crate::selector::Selector;

/// A reference to one DOM element.
#[async_trait]
pub trait Control: Send + Sync {
	/// The element's `textContent`, or `None` for nodes without one.
	async fn text_content(&self) -> Result<Option<String>>;

	/// Clicks the element centre with real mouse events.
	async fn click(&self) -> Result<()>;

	/// Replaces the element's editable content with `text`.
	async fn fill(&self, text: &str) -> Result<()>;

	async fn attribute(&self, name: &str) -> Result<Option<String>>;

	/// Drops any remote state backing this handle. Reads after a release
	/// fail.
	async fn release(&self) {}
}

/// Boxed [`Control`]; valid for the lifetime of the page that produced it.
pub type ControlHandle = Box<dyn Control>;

/// A navigable document.
#[async_trait]
pub trait Document: Send + Sync {
	/// Navigates and waits for `wait_until` within `timeout`.
	async fn goto(&self, url: &str, wait_until: WaitUntil, timeout: Duration) -> Result<()>;

	/// Every element matching `selector`, in document order.
	async fn query_all(&self, selector: &Selector) -> Result<Vec<ControlHandle>>;

	/// First element matching `selector`.
	async fn query_first(&self, selector: &Selector) -> Result<Option<ControlHandle>> {
		Ok(self.query_all(selector).await?.into_iter().next())
	}
}
