use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::*;

/// Connection wired to in-memory channels: returns the connection, the
/// receiver of frames it writes, and the sender feeding frames it reads.
fn create_test_connection() -> (Connection, mpsc::UnboundedReceiver<Value>, mpsc::UnboundedSender<Value>) {
	let (out_tx, out_rx) = mpsc::unbounded_channel();
	let (in_tx, in_rx) = mpsc::unbounded_channel();
	let connection = Connection::new(TransportParts::new(out_tx, in_rx));
	(connection, out_rx, in_tx)
}

fn start(connection: Connection) -> Arc<Connection> {
	let connection = Arc::new(connection);
	let runner = Arc::clone(&connection);
	tokio::spawn(async move { runner.run().await });
	connection
}

/// Answers every request with the result produced by `respond`.
fn spawn_responder<F>(mut out_rx: mpsc::UnboundedReceiver<Value>, in_tx: mpsc::UnboundedSender<Value>, respond: F)
where
	F: Fn(&Value) -> Value + Send + 'static,
{
	tokio::spawn(async move {
		while let Some(request) = out_rx.recv().await {
			let reply = respond(&request);
			if in_tx.send(reply).is_err() {
				break;
			}
		}
	});
}

#[tokio::test]
async fn send_resolves_with_result() {
	let (connection, out_rx, in_tx) = create_test_connection();
	let connection = start(connection);
	spawn_responder(out_rx, in_tx, |request| {
		json!({"id": request["id"], "result": {"echo": request["params"]["url"]}})
	});

	let result = connection
		.send("Page.navigate", json!({"url": "https://example.com"}), Some("S1"))
		.await
		.unwrap();
	assert_eq!(result["echo"], "https://example.com");
}

#[tokio::test]
async fn requests_carry_incrementing_ids_and_session() {
	let (connection, mut out_rx, in_tx) = create_test_connection();
	let connection = start(connection);

	let sender = Arc::clone(&connection);
	let first = tokio::spawn(async move { sender.send("Target.getTargets", json!({}), None).await });
	let request = out_rx.recv().await.unwrap();
	assert_eq!(request["id"], 1);
	assert!(request.get("sessionId").is_none());
	in_tx.send(json!({"id": 1, "result": {}})).unwrap();
	first.await.unwrap().unwrap();

	let sender = Arc::clone(&connection);
	let second = tokio::spawn(async move { sender.send("Runtime.evaluate", json!({}), Some("S9")).await });
	let request = out_rx.recv().await.unwrap();
	assert_eq!(request["id"], 2);
	assert_eq!(request["sessionId"], "S9");
	in_tx.send(json!({"id": 2, "result": {}})).unwrap();
	second.await.unwrap().unwrap();
}

#[tokio::test]
async fn remote_error_names_the_method() {
	let (connection, out_rx, in_tx) = create_test_connection();
	let connection = start(connection);
	spawn_responder(out_rx, in_tx, |request| {
		json!({"id": request["id"], "error": {"code": -32000, "message": "No node with given id found"}})
	});

	let err = connection.send("DOM.resolveNode", json!({}), None).await.unwrap_err();
	match err {
		Error::Remote { method, code, message } => {
			assert_eq!(method, "DOM.resolveNode");
			assert_eq!(code, -32000);
			assert!(message.contains("No node"));
		}
		other => panic!("expected remote error, got {other:?}"),
	}
}

#[tokio::test]
async fn send_as_decodes_typed_result() {
	let (connection, out_rx, in_tx) = create_test_connection();
	let connection = start(connection);
	spawn_responder(out_rx, in_tx, |request| json!({"id": request["id"], "result": {"targetId": "T1"}}));

	let created: chatpoll_protocol::CreateTargetResult = connection
		.send_as("Target.createTarget", json!({"url": "about:blank"}), None)
		.await
		.unwrap();
	assert_eq!(created.target_id, "T1");
}

#[tokio::test]
async fn send_as_reports_shape_mismatch() {
	let (connection, out_rx, in_tx) = create_test_connection();
	let connection = start(connection);
	spawn_responder(out_rx, in_tx, |request| json!({"id": request["id"], "result": {"unexpected": true}}));

	let err = connection
		.send_as::<chatpoll_protocol::AttachToTargetResult>("Target.attachToTarget", json!({}), None)
		.await
		.unwrap_err();
	assert!(matches!(err, Error::ProtocolError(msg) if msg.contains("Target.attachToTarget")));
}

#[tokio::test]
async fn events_are_broadcast_to_subscribers() {
	let (connection, _out_rx, in_tx) = create_test_connection();
	let connection = start(connection);
	let mut events = connection.subscribe();

	in_tx
		.send(json!({
			"method": "Page.lifecycleEvent",
			"params": {"frameId": "F", "loaderId": "L", "name": "networkIdle"},
			"sessionId": "S1"
		}))
		.unwrap();

	let event = events.recv().await.unwrap();
	assert_eq!(event.method, "Page.lifecycleEvent");
	assert_eq!(event.params["name"], "networkIdle");
	assert_eq!(event.session_id.as_deref(), Some("S1"));
}

#[tokio::test]
async fn timeout_removes_pending_callback() {
	let (connection, _out_rx, _in_tx) = create_test_connection();
	let connection = start(connection.with_request_timeout(Duration::from_millis(20)));

	let err = connection.send("Page.enable", json!({}), None).await.unwrap_err();
	assert!(err.is_timeout());
	assert!(connection.callbacks.lock().is_empty());
}

#[tokio::test]
async fn closing_transport_fails_pending_and_later_requests() {
	let (connection, mut out_rx, in_tx) = create_test_connection();
	let connection = start(connection);

	let sender = Arc::clone(&connection);
	let pending = tokio::spawn(async move { sender.send("Page.enable", json!({}), None).await });
	out_rx.recv().await.unwrap();
	drop(in_tx);

	let err = pending.await.unwrap().unwrap_err();
	assert!(matches!(err, Error::ChannelClosed));
	assert!(connection.is_closed());

	let err = connection.send("Page.enable", json!({}), None).await.unwrap_err();
	assert!(err.is_closed());
}

#[tokio::test]
async fn response_for_unknown_id_is_ignored() {
	let (connection, out_rx, in_tx) = create_test_connection();
	in_tx.send(json!({"id": 999, "result": {}})).unwrap();
	let connection = start(connection);
	spawn_responder(out_rx, in_tx, |request| json!({"id": request["id"], "result": {"ok": true}}));

	let result = connection.send("Runtime.enable", json!({}), None).await.unwrap();
	assert_eq!(result["ok"], true);
}

#[tokio::test]
async fn request_parked_during_close_fails_at_once() {
	let (connection, _out_rx, _in_tx) = create_test_connection();
	// Closed and already drained: nothing will complete a callback parked now.
	connection.closed.store(true, Ordering::SeqCst);

	let err = connection.park().err().unwrap();

	assert!(matches!(err, Error::ChannelClosed));
	assert!(connection.callbacks.lock().is_empty());
}
