//! Typed command results and parameters.
//!
//! Only the fields chatpoll reads are modelled; unknown fields are ignored on
//! deserialization so newer browsers stay compatible.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /json/version` on the DevTools HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
	#[serde(rename = "Browser", default)]
	pub browser: Option<String>,
	#[serde(rename = "User-Agent", default)]
	pub user_agent: Option<String>,
}

/// Page load state for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
	/// Navigation finishes when the `load` event fires.
	Load,
	/// Navigation finishes when `DOMContentLoaded` fires.
	#[serde(rename = "domcontentloaded")]
	DomContentLoaded,
	/// Navigation finishes when the network has been idle for 500ms.
	#[default]
	#[serde(rename = "networkidle")]
	NetworkIdle,
}

impl WaitUntil {
	/// Name of the matching `Page.lifecycleEvent`.
	pub fn lifecycle_name(self) -> &'static str {
		match self {
			WaitUntil::Load => "load",
			WaitUntil::DomContentLoaded => "DOMContentLoaded",
			WaitUntil::NetworkIdle => "networkIdle",
		}
	}
}

/// Mouse button for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
	None,
	#[default]
	Left,
	Right,
	Middle,
}

/// Mouse event kind for `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventType {
	#[serde(rename = "mouseMoved")]
	Moved,
	#[serde(rename = "mousePressed")]
	Pressed,
	#[serde(rename = "mouseReleased")]
	Released,
}

/// Parameters of `Input.dispatchMouseEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEvent {
	#[serde(rename = "type")]
	pub kind: MouseEventType,
	pub x: f64,
	pub y: f64,
	pub button: MouseButton,
	pub click_count: u32,
}

/// Point in CSS pixels relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

/// Parameters of `Emulation.setDeviceMetricsOverride`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
	pub width: u32,
	pub height: u32,
	pub device_scale_factor: f64,
	pub mobile: bool,
}

/// Mirror of a JavaScript value held by the page (`Runtime.RemoteObject`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub subtype: Option<String>,
	#[serde(default)]
	pub class_name: Option<String>,
	#[serde(default)]
	pub value: Option<Value>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub object_id: Option<String>,
}

/// Exception raised while evaluating script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	pub text: String,
	#[serde(default)]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best human-readable description of the thrown value.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.clone())
			.unwrap_or_else(|| self.text.clone())
	}
}

/// Result of `Runtime.evaluate` and `Runtime.callFunctionOn`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	pub result: RemoteObject,
	#[serde(default)]
	pub exception_details: Option<ExceptionDetails>,
}

/// One own property of a remote object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyDescriptor {
	pub name: String,
	#[serde(default)]
	pub value: Option<RemoteObject>,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetPropertiesResult {
	pub result: Vec<PropertyDescriptor>,
}

/// Result of `Page.navigate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
	pub frame_id: String,
	#[serde(default)]
	pub loader_id: Option<String>,
	/// Set when the navigation failed outright (DNS, refused connection, ...).
	#[serde(default)]
	pub error_text: Option<String>,
}

/// Params of the `Page.lifecycleEvent` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
	pub frame_id: String,
	pub loader_id: String,
	pub name: String,
}

/// Result of `Target.createBrowserContext`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextResult {
	pub browser_context_id: String,
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
	pub target_id: String,
}

/// Result of `Target.attachToTarget`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
	pub session_id: String,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn version_info_reads_debugger_url() {
		let info: VersionInfo = serde_json::from_value(json!({
			"Browser": "HeadlessChrome/126.0.0.0",
			"Protocol-Version": "1.3",
			"webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
		}))
		.unwrap();
		assert_eq!(info.web_socket_debugger_url, "ws://127.0.0.1:9222/devtools/browser/abc");
		assert_eq!(info.browser.as_deref(), Some("HeadlessChrome/126.0.0.0"));
	}

	#[test]
	fn wait_until_maps_to_lifecycle_names() {
		assert_eq!(WaitUntil::default(), WaitUntil::NetworkIdle);
		assert_eq!(WaitUntil::NetworkIdle.lifecycle_name(), "networkIdle");
		assert_eq!(WaitUntil::DomContentLoaded.lifecycle_name(), "DOMContentLoaded");
		let parsed: WaitUntil = serde_json::from_value(json!("domcontentloaded")).unwrap();
		assert_eq!(parsed, WaitUntil::DomContentLoaded);
	}

	#[test]
	fn mouse_event_serializes_cdp_names() {
		let event = DispatchMouseEvent {
			kind: MouseEventType::Pressed,
			x: 10.0,
			y: 20.5,
			button: MouseButton::Left,
			click_count: 1,
		};
		let value = serde_json::to_value(event).unwrap();
		assert_eq!(value, json!({"type": "mousePressed", "x": 10.0, "y": 20.5, "button": "left", "clickCount": 1}));
	}

	#[test]
	fn remote_node_keeps_object_id() {
		let node: RemoteObject = serde_json::from_value(json!({
			"type": "object",
			"subtype": "node",
			"className": "HTMLButtonElement",
			"objectId": "1.2.3"
		}))
		.unwrap();
		assert_eq!(node.class_name.as_deref(), Some("HTMLButtonElement"));
		assert_eq!(node.object_id.as_deref(), Some("1.2.3"));
	}

	#[test]
	fn navigate_error_text_is_optional() {
		let ok: NavigateResult = serde_json::from_value(json!({"frameId": "F", "loaderId": "L"})).unwrap();
		assert!(ok.error_text.is_none());
		let failed: NavigateResult = serde_json::from_value(json!({"frameId": "F", "errorText": "net::ERR_NAME_NOT_RESOLVED"})).unwrap();
		assert_eq!(failed.error_text.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
	}
}
