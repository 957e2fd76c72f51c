//! CDP message envelopes.
//!
//! Every frame on the DevTools socket is one of three shapes: a request the
//! client sends, a response carrying the request's `id`, or an event without
//! an `id`. Commands addressed to an attached target carry its `sessionId`
//! (flattened session mode).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	/// Unique id used to correlate the response.
	pub id: u64,
	/// Fully qualified method, e.g. `Page.navigate`.
	pub method: String,
	/// Method parameters (always an object on the wire).
	#[serde(default)]
	pub params: Value,
	/// Target session the command is routed to; `None` addresses the browser.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Error object attached to a failed [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// JSON-RPC style error code (e.g. `-32000` for generic server errors).
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Unsolicited notification from the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of inbound frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has an `id` field.
	Response(Response),
	/// Has a `method` field and no `id`.
	Event(Event),
	/// Anything else (forward-compatible catch-all).
	Unknown(Value),
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn request_omits_missing_session() {
		let request = Request {
			id: 7,
			method: "Target.getTargets".into(),
			params: json!({}),
			session_id: None,
		};
		let value = serde_json::to_value(&request).unwrap();
		assert_eq!(value, json!({"id": 7, "method": "Target.getTargets", "params": {}}));
	}

	#[test]
	fn request_carries_session_in_camel_case() {
		let request = Request {
			id: 1,
			method: "Page.navigate".into(),
			params: json!({"url": "about:blank"}),
			session_id: Some("ABC".into()),
		};
		let value = serde_json::to_value(&request).unwrap();
		assert_eq!(value["sessionId"], "ABC");
	}

	#[test]
	fn response_and_event_are_distinguished() {
		let response: Message = serde_json::from_value(json!({"id": 3, "result": {"frameId": "F"}})).unwrap();
		assert!(matches!(response, Message::Response(Response { id: 3, .. })));

		let event: Message = serde_json::from_value(json!({
			"method": "Page.lifecycleEvent",
			"params": {"name": "networkIdle"},
			"sessionId": "S1"
		}))
		.unwrap();
		match event {
			Message::Event(event) => {
				assert_eq!(event.method, "Page.lifecycleEvent");
				assert_eq!(event.session_id.as_deref(), Some("S1"));
			}
			other => panic!("expected event, got {other:?}"),
		}
	}

	#[test]
	fn error_response_keeps_code_and_message() {
		let message: Message = serde_json::from_value(json!({
			"id": 9,
			"error": {"code": -32000, "message": "Cannot find context with specified id"}
		}))
		.unwrap();
		let Message::Response(response) = message else {
			panic!("expected response");
		};
		let error = response.error.unwrap();
		assert_eq!(error.code, -32000);
		assert!(error.message.contains("context"));
	}

	#[test]
	fn unrecognized_frames_fall_through() {
		let message: Message = serde_json::from_value(json!({"hello": "world"})).unwrap();
		assert!(matches!(message, Message::Unknown(_)));
	}
}
