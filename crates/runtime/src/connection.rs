//! Request/response correlation over a DevTools transport.
//!
//! This module implements the JSON-RPC layer on top of [`TransportParts`]:
//! - Generating unique request ids
//! - Correlating responses with pending requests
//! - Distinguishing events from responses
//! - Broadcasting events to every subscriber
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send`] with method, params and optional session
//! 2. Connection allocates an id and parks a oneshot sender under it
//! 3. The request is queued on the transport's outbound channel
//! 4. The dispatch loop receives the response and completes the oneshot
//! 5. Dropping the request future removes the parked sender

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use chatpoll_protocol::{ErrorPayload, Event, Message, Request};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::transport::{TransportParts, WebSocketTransport};

/// Per-request budget applied by [`Connection::send`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 512;

type Reply = std::result::Result<Value, ErrorPayload>;
type CallbackMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// RAII guard removing the parked callback when a request future is dropped.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed && self.callbacks.lock().remove(&self.id).is_some() {
			tracing::debug!(target = "chatpoll", id = self.id, "removed orphaned callback");
		}
	}
}

/// Future returned for one in-flight request.
struct ResponseFuture {
	rx: oneshot::Receiver<Reply>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Reply>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(reply) => {
				self.guard.completed = true;
				Poll::Ready(reply.map_err(|_| Error::ChannelClosed))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to a browser's DevTools endpoint.
///
/// Uses sequential ids and oneshot channels for correlation. Events are
/// published on a broadcast channel; subscribe before issuing the command
/// whose events you need so none are missed.
pub struct Connection {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Value>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	events: broadcast::Sender<Event>,
	closed: AtomicBool,
	request_timeout: Duration,
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
	/// Creates a connection over the given transport parts.
	///
	/// The dispatch loop is not started; call [`Connection::run`] (or use
	/// [`Connection::connect`], which spawns it).
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			message_rx,
			tasks,
		} = parts;
		let (events, _) = broadcast::channel(EVENT_CAPACITY);

		Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			outbound_tx: sender,
			message_rx: Mutex::new(Some(message_rx)),
			events,
			closed: AtomicBool::new(false),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			tasks: Mutex::new(tasks),
		}
	}

	/// Overrides the per-request timeout.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Opens a WebSocket to `ws_url` and starts dispatching.
	pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
		let parts = WebSocketTransport::connect(ws_url).await?;
		let connection = Arc::new(Self::new(parts));
		connection.spawn_dispatch();
		Ok(connection)
	}

	/// Spawns the dispatch loop holding only a weak reference, so dropping the
	/// last handle tears the connection down.
	fn spawn_dispatch(self: &Arc<Self>) {
		let Some(mut message_rx) = self.message_rx.lock().take() else {
			return;
		};
		let weak = Arc::downgrade(self);
		let handle = tokio::spawn(async move {
			while let Some(value) = message_rx.recv().await {
				let Some(connection) = weak.upgrade() else {
					return;
				};
				connection.handle_frame(value);
			}
			if let Some(connection) = weak.upgrade() {
				connection.mark_closed();
			}
		});
		self.tasks.lock().push(handle);
	}

	/// Returns true once the inbound side of the transport has ended.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Subscribes to every event received from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.events.subscribe()
	}

	/// Sends a command and awaits its result.
	///
	/// `session_id` routes the command to an attached target; `None`
	/// addresses the browser itself.
	pub async fn send(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<Value> {
		let (id, response) = self.park()?;
		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		tracing::trace!(target = "chatpoll", id, method, session = ?session_id, "send");

		if self.outbound_tx.send(serde_json::to_value(&request)?).is_err() {
			return Err(Error::ChannelClosed);
		}

		let reply = tokio::time::timeout(self.request_timeout, response)
			.await
			.map_err(|_| Error::Timeout {
				method: method.to_string(),
				timeout: self.request_timeout,
			})??;

		reply.map_err(|payload| Error::Remote {
			method: method.to_string(),
			code: payload.code,
			message: payload.message,
		})
	}

	/// Allocates an id and parks its callback.
	///
	/// `closed` is checked after the insert: a close that drained the map
	/// before the insert would otherwise leave the callback waiting for the
	/// full request timeout.
	fn park(&self) -> Result<(u64, ResponseFuture)> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);
		let guard = CancelGuard {
			id,
			callbacks: Arc::clone(&self.callbacks),
			completed: false,
		};
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}
		Ok((id, ResponseFuture { rx, guard }))
	}

	/// Sends a command and deserializes its result.
	pub async fn send_as<T: DeserializeOwned>(&self, method: &str, params: Value, session_id: Option<&str>) -> Result<T> {
		let value = self.send(method, params, session_id).await?;
		serde_json::from_value(value).map_err(|e| Error::ProtocolError(format!("{method}: unexpected result shape: {e}")))
	}

	/// Runs the dispatch loop until the transport closes.
	///
	/// Pending requests fail with [`Error::ChannelClosed`] once it returns.
	pub async fn run(&self) {
		let Some(mut message_rx) = self.message_rx.lock().take() else {
			tracing::warn!(target = "chatpoll", "dispatch loop already running");
			return;
		};

		while let Some(value) = message_rx.recv().await {
			self.handle_frame(value);
		}
		self.mark_closed();
	}

	fn mark_closed(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let pending: Vec<_> = self.callbacks.lock().drain().collect();
		if !pending.is_empty() {
			tracing::debug!(target = "chatpoll", count = pending.len(), "failing pending requests on close");
		}
	}

	fn handle_frame(&self, value: Value) {
		match serde_json::from_value::<Message>(value) {
			Ok(message) => self.dispatch(message),
			Err(e) => tracing::debug!(target = "chatpoll", error = %e, "unparseable frame"),
		}
	}

	fn dispatch(&self, message: Message) {
		match message {
			Message::Response(response) => {
				let Some(callback) = self.callbacks.lock().remove(&response.id) else {
					tracing::debug!(target = "chatpoll", id = response.id, "response for unknown request");
					return;
				};
				let reply = match response.error {
					Some(error) => Err(error),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = callback.send(reply);
			}
			Message::Event(event) => {
				tracing::trace!(target = "chatpoll", method = %event.method, "event");
				let _ = self.events.send(event);
			}
			Message::Unknown(value) => {
				tracing::debug!(target = "chatpoll", frame = %value, "unknown frame ignored");
			}
		}
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		for task in self.tasks.get_mut().drain(..) {
			task.abort();
		}
	}
}

#[cfg(test)]
mod tests;
