//! [`Backend`] over a real Chromium-family browser.

use async_trait::async_trait;
use chatpoll_runtime::LaunchOptions;
use tracing::warn;

use crate::browser::Browser;
use crate::config::QueryConfig;
use crate::context::{BrowserContext, ContextOptions};
use crate::dom::Document;
use crate::error::Result;
use crate::runner::{Backend, QueryRunner, Session};

/// Launches (or connects to) a browser for every session.
#[derive(Debug, Clone)]
pub struct ChromiumBackend {
	launch: LaunchOptions,
	cdp_endpoint: Option<String>,
	context: ContextOptions,
}

impl ChromiumBackend {
	pub fn new(launch: LaunchOptions, context: ContextOptions) -> Self {
		Self {
			launch,
			cdp_endpoint: None,
			context,
		}
	}

	/// Connects to `endpoint` instead of launching a process.
	pub fn with_cdp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.cdp_endpoint = Some(endpoint.into());
		self
	}

	pub fn from_config(config: &QueryConfig) -> Self {
		let backend = Self::new(config.launch_options(), config.context.clone());
		match &config.browser.cdp_endpoint {
			Some(endpoint) => backend.with_cdp_endpoint(endpoint.clone()),
			None => backend,
		}
	}
}

#[async_trait]
impl Backend for ChromiumBackend {
	async fn open(&self) -> Result<Box<dyn Session>> {
		let browser = match &self.cdp_endpoint {
			Some(endpoint) => Browser::connect(endpoint).await?,
			None => Browser::launch(&self.launch).await?,
		};
		let context = match browser.new_context(&self.context).await {
			Ok(context) => context,
			Err(e) => {
				if let Err(close_err) = browser.close().await {
					warn!(target = "chatpoll", error = %close_err, "failed to close browser after context error");
				}
				return Err(e);
			}
		};
		Ok(Box::new(ChromiumSession { browser, context }))
	}
}

/// A browser plus the isolated context the query runs in.
#[derive(Debug)]
pub struct ChromiumSession {
	browser: Browser,
	context: BrowserContext,
}

#[async_trait]
impl Session for ChromiumSession {
	fn document(&self) -> &dyn Document {
		self.context.page()
	}

	async fn close(self: Box<Self>) -> Result<()> {
		let ChromiumSession { browser, context } = *self;
		let context_result = context.close().await;
		if let Err(e) = &context_result {
			warn!(target = "chatpoll", error = %e, "failed to dispose browser context");
		}
		browser.close().await?;
		context_result
	}
}

impl QueryRunner<ChromiumBackend> {
	/// Runner driving a real browser as described by `config`.
	pub fn from_config(config: QueryConfig) -> Self {
		QueryRunner::new(ChromiumBackend::from_config(&config), config)
	}
}
