//! Browser lifecycle: launch or connect, then hand out isolated contexts.

use std::sync::Arc;
use std::time::Duration;

use chatpoll_runtime::{BrowserProcess, Connection, LaunchOptions, resolve_endpoint};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::context::{BrowserContext, ContextOptions};
use crate::error::{Error, Result};

const EXIT_GRACE: Duration = Duration::from_secs(5);

/// A Chromium-family browser reachable over the DevTools protocol.
///
/// A browser started with [`Browser::launch`] owns its process, which is
/// killed if the value is dropped without [`Browser::close`].
pub struct Browser {
	connection: Arc<Connection>,
	process: Option<BrowserProcess>,
}

impl std::fmt::Debug for Browser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Browser")
			.field("launched", &self.process.is_some())
			.field("closed", &self.connection.is_closed())
			.finish()
	}
}

impl Browser {
	/// Launches a new browser process and connects to it.
	pub async fn launch(options: &LaunchOptions) -> Result<Self> {
		let process = BrowserProcess::launch(options)
			.await
			.map_err(|e| Error::BrowserLaunch(e.to_string()))?;
		let connection = Connection::connect(process.ws_url()).await?;
		info!(target = "chatpoll", port = process.port(), "browser launched");
		Ok(Self {
			connection,
			process: Some(process),
		})
	}

	/// Connects to a running browser at a `ws://` URL or an `http://`
	/// DevTools base URL.
	pub async fn connect(endpoint: &str) -> Result<Self> {
		let ws_url = resolve_endpoint(endpoint)
			.await
			.map_err(|e| Error::BrowserLaunch(e.to_string()))?;
		let connection = Connection::connect(&ws_url).await?;
		info!(target = "chatpoll", endpoint, "connected to browser");
		Ok(Self { connection, process: None })
	}

	/// Creates an isolated context with a single page.
	pub async fn new_context(&self, options: &ContextOptions) -> Result<BrowserContext> {
		BrowserContext::create(Arc::clone(&self.connection), options).await
	}

	/// Shuts the browser down.
	///
	/// A launched browser is asked to exit and killed if it lingers. A
	/// connected browser is left running; only the connection is dropped.
	pub async fn close(self) -> Result<()> {
		let Some(process) = self.process else {
			debug!(target = "chatpoll", "disconnecting from external browser");
			return Ok(());
		};
		if let Err(e) = self.connection.send("Browser.close", json!({}), None).await {
			// The socket often closes before the reply arrives.
			if !e.is_closed() {
				warn!(target = "chatpoll", error = %e, "Browser.close failed");
			}
		}
		process.shutdown(EXIT_GRACE).await?;
		info!(target = "chatpoll", "browser closed");
		Ok(())
	}
}
