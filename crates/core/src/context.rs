//! Isolated browsing contexts.

use std::sync::Arc;

use chatpoll_protocol::CreateTargetResult;
use chatpoll_runtime::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::Result;
use crate::page::Page;

/// Desktop Chrome user agent applied unless overridden.
pub const DEFAULT_USER_AGENT: &str =
	"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

impl Default for Viewport {
	fn default() -> Self {
		Self { width: 1280, height: 800 }
	}
}

/// Emulation applied to every page of a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextOptions {
	pub viewport: Option<Viewport>,
	pub user_agent: Option<String>,
	/// BCP 47 tag; also sent as `Accept-Language`.
	pub locale: Option<String>,
}

impl Default for ContextOptions {
	fn default() -> Self {
		Self {
			viewport: Some(Viewport::default()),
			user_agent: Some(DEFAULT_USER_AGENT.to_string()),
			locale: Some("zh-CN".to_string()),
		}
	}
}

/// A browser context with its own cookie jar and storage, holding one page.
///
/// Call [`BrowserContext::close`] to dispose of it; the browser disposes of
/// leftover contexts when it exits.
pub struct BrowserContext {
	connection: Arc<Connection>,
	context_id: String,
	page: Page,
}

impl std::fmt::Debug for BrowserContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserContext")
			.field("context_id", &self.context_id)
			.field("page", &self.page)
			.finish()
	}
}

impl BrowserContext {
	pub(crate) async fn create(connection: Arc<Connection>, options: &ContextOptions) -> Result<Self> {
		let created: chatpoll_protocol::CreateBrowserContextResult = connection
			.send_as("Target.createBrowserContext", json!({ "disposeOnDetach": true }), None)
			.await?;
		let context_id = created.browser_context_id;

		let page = match Self::open_page(&connection, &context_id, options).await {
			Ok(page) => page,
			Err(e) => {
				dispose(&connection, &context_id).await;
				return Err(e);
			}
		};
		info!(target = "chatpoll", context = %context_id, "browser context created");

		Ok(Self {
			connection,
			context_id,
			page,
		})
	}

	async fn open_page(connection: &Arc<Connection>, context_id: &str, options: &ContextOptions) -> Result<Page> {
		let target: CreateTargetResult = connection
			.send_as(
				"Target.createTarget",
				json!({ "url": "about:blank", "browserContextId": context_id }),
				None,
			)
			.await?;
		let page = Page::attach(Arc::clone(connection), &target.target_id).await?;
		page.apply_emulation(options).await?;
		Ok(page)
	}

	pub fn id(&self) -> &str {
		&self.context_id
	}

	/// The context's page.
	pub fn page(&self) -> &Page {
		&self.page
	}

	/// Disposes of the context and every page in it.
	pub async fn close(self) -> Result<()> {
		self.connection
			.send(
				"Target.disposeBrowserContext",
				json!({ "browserContextId": self.context_id }),
				None,
			)
			.await?;
		debug!(target = "chatpoll", context = %self.context_id, "browser context disposed");
		Ok(())
	}
}

async fn dispose(connection: &Connection, context_id: &str) {
	if let Err(e) = connection
		.send("Target.disposeBrowserContext", json!({ "browserContextId": context_id }), None)
		.await
	{
		debug!(target = "chatpoll", error = %e, "failed to dispose half-built context");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_desktop_chinese_locale() {
		let options = ContextOptions::default();
		assert_eq!(options.viewport, Some(Viewport { width: 1280, height: 800 }));
		assert_eq!(options.locale.as_deref(), Some("zh-CN"));
		assert!(options.user_agent.as_deref().is_some_and(|ua| ua.contains("Chrome/")));
	}

	#[test]
	fn partial_json_keeps_other_defaults() {
		let options: ContextOptions = serde_json::from_str(r#"{"locale":"en-US","viewport":null}"#).unwrap();
		assert_eq!(options.locale.as_deref(), Some("en-US"));
		assert_eq!(options.viewport, None);
		assert_eq!(options.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
	}
}
