//! Wire types for the Chrome DevTools Protocol.
//!
//! This crate contains the serde-serializable shapes exchanged with a
//! Chromium-family browser over its DevTools WebSocket. It covers only the
//! handful of domains chatpoll drives (`Target`, `Page`, `Runtime`, `Input`,
//! `Emulation`, `Browser`).
//!
//! Types in this crate are pure data. Behavior lives in `chatpoll-runtime`
//! (transport and correlation) and `chatpoll` (page-level API).

pub mod message;
pub mod types;

pub use message::*;
pub use types::*;
