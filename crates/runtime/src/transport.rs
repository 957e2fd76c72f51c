//! WebSocket transport for the DevTools protocol.
//!
//! The socket is split into a reader task and a writer task. Both sides talk
//! to the rest of the runtime through unbounded channels of JSON values, so
//! [`Connection`](crate::Connection) never touches the socket directly and
//! can be driven by plain channels in tests.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Channel ends handed to a [`Connection`](crate::Connection).
pub struct TransportParts {
	/// Outbound frames; each value is serialized and written as one text frame.
	pub sender: mpsc::UnboundedSender<Value>,
	/// Inbound frames, parsed as JSON. Closes when the socket closes.
	pub message_rx: mpsc::UnboundedReceiver<Value>,
	pub(crate) tasks: Vec<JoinHandle<()>>,
}

impl TransportParts {
	/// Builds parts from raw channels, with no background I/O tasks.
	pub fn new(sender: mpsc::UnboundedSender<Value>, message_rx: mpsc::UnboundedReceiver<Value>) -> Self {
		Self {
			sender,
			message_rx,
			tasks: Vec::new(),
		}
	}
}

/// WebSocket transport to a DevTools endpoint.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to `ws_url` and spawns the reader and writer tasks.
	pub async fn connect(ws_url: &str) -> Result<TransportParts> {
		let (stream, _) = connect_async(ws_url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{ws_url}: {e}")))?;
		debug!(target = "chatpoll", url = ws_url, "devtools socket connected");

		let (mut sink, mut source) = stream.split();
		let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
		let (in_tx, in_rx) = mpsc::unbounded_channel::<Value>();

		let writer = tokio::spawn(async move {
			while let Some(frame) = out_rx.recv().await {
				if let Err(e) = sink.send(WsMessage::Text(frame.to_string())).await {
					warn!(target = "chatpoll", error = %e, "devtools socket write failed");
					break;
				}
			}
			let _ = sink.close().await;
		});

		let reader = tokio::spawn(async move {
			while let Some(frame) = source.next().await {
				let text = match frame {
					Ok(WsMessage::Text(text)) => text,
					Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
						Ok(text) => text,
						Err(_) => continue,
					},
					Ok(WsMessage::Close(_)) => {
						debug!(target = "chatpoll", "devtools socket closed by peer");
						break;
					}
					Ok(_) => continue,
					Err(e) => {
						warn!(target = "chatpoll", error = %e, "devtools socket read failed");
						break;
					}
				};

				match serde_json::from_str::<Value>(&text) {
					Ok(value) => {
						if in_tx.send(value).is_err() {
							break;
						}
					}
					Err(e) => debug!(target = "chatpoll", error = %e, "ignoring non-JSON frame"),
				}
			}
		});

		Ok(TransportParts {
			sender: out_tx,
			message_rx: in_rx,
			tasks: vec![reader, writer],
		})
	}
}
