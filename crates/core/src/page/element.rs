use async_trait::async_trait;
use chatpoll_protocol::Point;
use serde_json::{Value, json};
use tracing::trace;

use super::{Page, scripts};
use crate::dom::Control;
use crate::error::{Error, Result};

/// Remote reference to a DOM element.
///
/// Handles stay valid until the page navigates or closes.
#[derive(Debug, Clone)]
pub struct ElementHandle {
	page: Page,
	object_id: String,
}

impl ElementHandle {
	pub(crate) fn new(page: Page, object_id: String) -> Self {
		Self { page, object_id }
	}

	async fn call(&self, declaration: &str, args: &[Value]) -> Result<Value> {
		self.page.call_function(&self.object_id, declaration, args).await
	}

	pub async fn text_content(&self) -> Result<Option<String>> {
		match self.call(scripts::TEXT_CONTENT, &[]).await? {
			Value::String(text) => Ok(Some(text)),
			_ => Ok(None),
		}
	}

	pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
		match self.call(scripts::ATTRIBUTE, &[json!(name)]).await? {
			Value::String(value) => Ok(Some(value)),
			_ => Ok(None),
		}
	}

	/// Scrolls into view and clicks the centre of the element's box.
	pub async fn click(&self) -> Result<()> {
		let value = self.call(scripts::SCROLL_AND_CENTER, &[]).await?;
		let point: Point = match value {
			Value::String(reason) => return Err(Error::Interaction { action: "click", reason }),
			other => serde_json::from_value(other).map_err(|e| Error::Interaction {
				action: "click",
				reason: format!("unexpected geometry: {e}"),
			})?,
		};
		trace!(target = "chatpoll", x = point.x, y = point.y, "click");
		self.page.mouse_click(point).await
	}

	/// Focuses the element, selects its content and inserts `text` in its
	/// place. An empty `text` clears the element.
	pub async fn fill(&self, text: &str) -> Result<()> {
		let prepared = self.call(scripts::PREPARE_FILL, &[]).await?;
		match prepared.as_str() {
			Some("ok") => {}
			Some(reason) => {
				return Err(Error::Interaction {
					action: "fill",
					reason: reason.to_string(),
				});
			}
			None => {
				return Err(Error::Interaction {
					action: "fill",
					reason: format!("unexpected result {prepared}"),
				});
			}
		}

		if text.is_empty() {
			self.call(scripts::DELETE_SELECTION, &[]).await?;
		} else {
			self.page.insert_text(text).await?;
		}
		trace!(target = "chatpoll", chars = text.chars().count(), "fill");
		Ok(())
	}
}

#[async_trait]
impl Control for ElementHandle {
	async fn text_content(&self) -> Result<Option<String>> {
		ElementHandle::text_content(self).await
	}

	async fn click(&self) -> Result<()> {
		ElementHandle::click(self).await
	}

	async fn fill(&self, text: &str) -> Result<()> {
		ElementHandle::fill(self, text).await
	}

	async fn attribute(&self, name: &str) -> Result<Option<String>> {
		ElementHandle::attribute(self, name).await
	}

	async fn release(&self) {
		self.page.release(&self.object_id).await;
	}
}
