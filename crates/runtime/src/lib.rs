//! chatpoll runtime - browser process, transport, and correlation
//!
//! This crate provides the low-level plumbing for talking to a Chromium-family
//! browser over the DevTools protocol:
//!
//! - **Launcher**: locating the executable, spawning it with remote debugging
//!   enabled, and discovering its WebSocket endpoint
//! - **Transport**: WebSocket framing, split into reader and writer tasks
//! - **Connection**: request/response correlation by id and event fan-out
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  chatpoll   │  Browser, BrowserContext, Page, ElementHandle
//! └──────┬──────┘
//!        │ Connection::send / subscribe
//! ┌──────▼──────┐
//! │  runtime    │  This crate
//! │  ┌────────┐ │
//! │  │ Conn   │ │  id correlation, broadcast events
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  WebSocket reader/writer tasks
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Launch │ │  Process management, /json/version discovery
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod launcher;
pub mod transport;

pub use connection::{Connection, DEFAULT_REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use launcher::{BrowserProcess, LaunchOptions, fetch_version, find_executable, resolve_endpoint};
pub use transport::{TransportParts, WebSocketTransport};
