//! [`Page`]: one attached browser tab.

mod element;
mod scripts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatpoll_protocol::{
	DeviceMetrics, DispatchMouseEvent, EvaluateResult, GetPropertiesResult, LifecycleEvent, MouseButton, MouseEventType, NavigateResult, Point,
	RemoteObject, WaitUntil,
};
use chatpoll_runtime::Connection;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

pub use self::element::ElementHandle;
use crate::context::ContextOptions;
use crate::dom::{ControlHandle, Document};
use crate::error::{Error, Result};
use crate::selector::Selector;

/// A browser tab attached in flattened session mode.
///
/// Every command is routed through the shared browser connection with this
/// page's `sessionId`.
#[derive(Clone)]
pub struct Page {
	connection: Arc<Connection>,
	target_id: Arc<str>,
	session_id: Arc<str>,
}

impl std::fmt::Debug for Page {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Page")
			.field("target_id", &self.target_id)
			.field("session_id", &self.session_id)
			.finish()
	}
}

impl Page {
	/// Attaches to `target_id` and enables the domains the page API needs.
	pub(crate) async fn attach(connection: Arc<Connection>, target_id: &str) -> Result<Self> {
		let attached: chatpoll_protocol::AttachToTargetResult = connection
			.send_as("Target.attachToTarget", json!({ "targetId": target_id, "flatten": true }), None)
			.await?;

		let page = Self {
			connection,
			target_id: Arc::from(target_id),
			session_id: Arc::from(attached.session_id.as_str()),
		};
		page.send("Page.enable", json!({})).await?;
		page.send("Page.setLifecycleEventsEnabled", json!({ "enabled": true })).await?;
		debug!(target = "chatpoll", target_id, session = %page.session_id, "page attached");
		Ok(page)
	}

	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	pub(crate) async fn send(&self, method: &str, params: Value) -> Result<Value> {
		Ok(self.connection.send(method, params, Some(self.session_id())).await?)
	}

	pub(crate) async fn send_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
		Ok(self.connection.send_as(method, params, Some(self.session_id())).await?)
	}

	/// Applies viewport, user-agent and locale overrides.
	pub(crate) async fn apply_emulation(&self, options: &ContextOptions) -> Result<()> {
		if let Some(viewport) = options.viewport {
			let metrics = DeviceMetrics {
				width: viewport.width,
				height: viewport.height,
				device_scale_factor: 1.0,
				mobile: false,
			};
			self.send("Emulation.setDeviceMetricsOverride", serde_json::to_value(metrics)?).await?;
		}
		if let Some(user_agent) = &options.user_agent {
			let mut params = json!({ "userAgent": user_agent });
			if let Some(locale) = &options.locale {
				params["acceptLanguage"] = json!(locale);
			}
			self.send("Emulation.setUserAgentOverride", params).await?;
		}
		if let Some(locale) = &options.locale {
			self.send("Emulation.setLocaleOverride", json!({ "locale": locale })).await?;
		}
		Ok(())
	}

	/// Navigates to `url` and waits for the `wait_until` lifecycle event of
	/// the new document.
	///
	/// Fails with [`Error::Navigation`] when the browser reports a network
	/// error or the lifecycle event does not arrive within `timeout`.
	pub async fn goto(&self, url: &str, wait_until: WaitUntil, timeout: Duration) -> Result<()> {
		let navigation_error = |reason: String| Error::Navigation {
			url: url.to_string(),
			reason,
		};

		let mut events = self.connection.subscribe();
		let navigate = async {
			let result: NavigateResult = self
				.send_as("Page.navigate", json!({ "url": url }))
				.await
				.map_err(|e| navigation_error(e.to_string()))?;
			if let Some(error_text) = result.error_text.filter(|text| !text.is_empty()) {
				return Err(navigation_error(error_text));
			}
			// Same-document navigations have no new loader to wait for.
			let Some(loader_id) = result.loader_id else {
				return Ok(());
			};
			self.wait_for_lifecycle(&mut events, &result.frame_id, &loader_id, wait_until.lifecycle_name())
				.await
				.map_err(|e| navigation_error(e.to_string()))
		};

		tokio::time::timeout(timeout, navigate).await.map_err(|_| {
			navigation_error(format!(
				"timed out after {}ms waiting for {}",
				timeout.as_millis(),
				wait_until.lifecycle_name()
			))
		})?
	}

	async fn wait_for_lifecycle(&self, events: &mut broadcast::Receiver<chatpoll_protocol::Event>, frame_id: &str, loader_id: &str, name: &str) -> Result<()> {
		loop {
			let event = match events.recv().await {
				Ok(event) => event,
				Err(RecvError::Lagged(skipped)) => {
					debug!(target = "chatpoll", skipped, "lifecycle listener lagged");
					continue;
				}
				Err(RecvError::Closed) => return Err(chatpoll_runtime::Error::ChannelClosed.into()),
			};
			if event.method != "Page.lifecycleEvent" || event.session_id.as_deref() != Some(&*self.session_id) {
				continue;
			}
			let Ok(lifecycle) = serde_json::from_value::<LifecycleEvent>(event.params) else {
				continue;
			};
			if lifecycle.frame_id == frame_id && lifecycle.loader_id == loader_id && lifecycle.name == name {
				debug!(target = "chatpoll", name, "lifecycle reached");
				return Ok(());
			}
		}
	}

	/// Evaluates `expression` and returns its JSON value.
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		let object = self.evaluate_object(expression, true).await?;
		Ok(object.value.unwrap_or(Value::Null))
	}

	async fn evaluate_object(&self, expression: &str, by_value: bool) -> Result<RemoteObject> {
		let result: EvaluateResult = self
			.send_as(
				"Runtime.evaluate",
				json!({
					"expression": expression,
					"returnByValue": by_value,
					"awaitPromise": true,
				}),
			)
			.await?;
		into_object(result)
	}

	/// Every element matching `selector`, in document order.
	pub async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>> {
		let function = match selector {
			Selector::Css(_) => scripts::QUERY_CSS,
			Selector::XPath(_) => scripts::QUERY_XPATH,
		};
		let expression = format!("({function})({})", serde_json::to_string(selector.expression())?);
		let array = self.evaluate_object(&expression, false).await?;
		let Some(array_id) = array.object_id else {
			return Ok(Vec::new());
		};

		let properties: GetPropertiesResult = self
			.send_as("Runtime.getProperties", json!({ "objectId": array_id, "ownProperties": true }))
			.await?;
		let mut indexed: Vec<(usize, String)> = properties
			.result
			.into_iter()
			.filter_map(|property| {
				let index = property.name.parse::<usize>().ok()?;
				let object_id = property.value?.object_id?;
				Some((index, object_id))
			})
			.collect();
		indexed.sort_by_key(|(index, _)| *index);
		self.release(&array_id).await;

		debug!(target = "chatpoll", %selector, count = indexed.len(), "query");
		Ok(indexed
			.into_iter()
			.map(|(_, object_id)| ElementHandle::new(self.clone(), object_id))
			.collect())
	}

	/// First element matching `selector`. Only that element gets a remote
	/// handle.
	pub async fn query_first(&self, selector: &Selector) -> Result<Option<ElementHandle>> {
		let function = match selector {
			Selector::Css(_) => scripts::QUERY_FIRST_CSS,
			Selector::XPath(_) => scripts::QUERY_FIRST_XPATH,
		};
		let expression = format!("({function})({})", serde_json::to_string(selector.expression())?);
		let object = self.evaluate_object(&expression, false).await?;
		Ok(object.object_id.map(|object_id| ElementHandle::new(self.clone(), object_id)))
	}

	/// Calls `declaration` with `this` bound to `object_id`.
	pub(crate) async fn call_function(&self, object_id: &str, declaration: &str, args: &[Value]) -> Result<Value> {
		let arguments: Vec<Value> = args.iter().map(|value| json!({ "value": value })).collect();
		let result: EvaluateResult = self
			.send_as(
				"Runtime.callFunctionOn",
				json!({
					"objectId": object_id,
					"functionDeclaration": declaration,
					"arguments": arguments,
					"returnByValue": true,
					"awaitPromise": true,
				}),
			)
			.await?;
		Ok(into_object(result)?.value.unwrap_or(Value::Null))
	}

	pub(crate) async fn release(&self, object_id: &str) {
		if let Err(e) = self.send("Runtime.releaseObject", json!({ "objectId": object_id })).await {
			debug!(target = "chatpoll", error = %e, "releaseObject failed");
		}
	}

	/// Moves the mouse to `point` and clicks the left button once.
	pub(crate) async fn mouse_click(&self, point: Point) -> Result<()> {
		let steps = [
			(MouseEventType::Moved, MouseButton::None, 0),
			(MouseEventType::Pressed, MouseButton::Left, 1),
			(MouseEventType::Released, MouseButton::Left, 1),
		];
		for (kind, button, click_count) in steps {
			let event = DispatchMouseEvent {
				kind,
				x: point.x,
				y: point.y,
				button,
				click_count,
			};
			self.send("Input.dispatchMouseEvent", serde_json::to_value(event)?).await?;
		}
		Ok(())
	}

	/// Types `text` into the focused element as a single IME-style insertion.
	pub(crate) async fn insert_text(&self, text: &str) -> Result<()> {
		self.send("Input.insertText", json!({ "text": text })).await?;
		Ok(())
	}
}

fn into_object(result: EvaluateResult) -> Result<RemoteObject> {
	match result.exception_details {
		Some(details) => Err(Error::Evaluation(details.message())),
		None => Ok(result.result),
	}
}

#[async_trait]
impl Document for Page {
	async fn goto(&self, url: &str, wait_until: WaitUntil, timeout: Duration) -> Result<()> {
		Page::goto(self, url, wait_until, timeout).await
	}

	async fn query_all(&self, selector: &Selector) -> Result<Vec<ControlHandle>> {
		let elements = Page::query_all(self, selector).await?;
		Ok(elements.into_iter().map(|element| Box::new(element) as ControlHandle).collect())
	}

	async fn query_first(&self, selector: &Selector) -> Result<Option<ControlHandle>> {
		let element = Page::query_first(self, selector).await?;
		Ok(element.map(|element| Box::new(element) as ControlHandle))
	}
}
