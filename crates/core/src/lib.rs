//! chatpoll: submit a query to a web chat page and wait for the reply.
//!
//! The crate drives a Chromium-family browser over the DevTools protocol:
//! it opens an isolated context, navigates to the chat page, fills the input,
//! clicks the submit control and polls the reply region until two
//! consecutive reads agree.
//!
//! # Example
//!
//! ```ignore
//! use chatpoll::{QueryConfig, QueryRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chatpoll::Error> {
//!     let runner = QueryRunner::from_config(QueryConfig::default());
//!     let result = runner.run("编写一个python排序代码").await?;
//!     if result.completed {
//!         println!("{}", result.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Page structure lives entirely in [`QueryConfig`]: control locators,
//! the reply selector and the interim markers can all be changed without
//! touching the workflow.

mod backend;
mod browser;
mod config;
mod context;
mod dom;
mod error;
mod interim;
mod locator;
mod page;
mod poll;
mod runner;
mod selector;

#[cfg(test)]
mod testing;

pub use backend::{ChromiumBackend, ChromiumSession};
pub use browser::Browser;
pub use chatpoll_protocol::WaitUntil;
pub use chatpoll_runtime::LaunchOptions;
pub use config::{BrowserConfig, ControlsConfig, DEFAULT_RESPONSE_SELECTOR, DEFAULT_URL, PollConfig, QueryConfig, ResponseConfig};
pub use context::{BrowserContext, ContextOptions, DEFAULT_USER_AGENT, Viewport};
pub use dom::{Control, ControlHandle, Document};
pub use error::{Error, Result};
pub use interim::{InterimState, MarkerSet};
pub use locator::{AriaRole, BoundaryMiss, ControlKind, ControlLocator, boundary_index};
pub use page::{ElementHandle, Page};
pub use poll::{PollOutcome, PollSettings, ResponseRegion, ResponseSource, Stability, poll_until_stable};
pub use runner::{Backend, QueryRequest, QueryResult, QueryRunner, RunState, Session};
pub use selector::Selector;
