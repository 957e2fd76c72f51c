//! Error types for the browser runtime.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while launching or talking to a browser.
#[derive(Debug, Error)]
pub enum Error {
	/// No Chromium-family executable could be located.
	#[error("Chromium executable not found. Install Chrome/Chromium or set CHATPOLL_BROWSER to its path")]
	ExecutableNotFound,

	/// The browser process could not be started or died during startup.
	#[error("Failed to launch browser: {0}")]
	LaunchFailed(String),

	/// The DevTools HTTP endpoint did not answer with a WebSocket URL.
	#[error("DevTools endpoint {endpoint} unavailable: {reason}")]
	EndpointUnavailable { endpoint: String, reason: String },

	/// Failed to establish the WebSocket connection.
	#[error("Failed to connect to DevTools socket: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (WebSocket read/write).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Malformed or unexpected protocol payload.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// The browser rejected a command.
	#[error("{method} failed ({code}): {message}")]
	Remote { method: String, code: i64, message: String },

	/// No response arrived within the request budget.
	#[error("{method} timed out after {}ms", timeout.as_millis())]
	Timeout { method: String, timeout: Duration },

	/// Connection closed while a request was in flight.
	#[error("DevTools connection closed")]
	ChannelClosed,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}

	/// Returns true if the connection to the browser is gone.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed | Error::TransportError(_))
	}
}
