//! Library half of the `chatpoll` binary, split out so the pieces are unit
//! testable.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod run;
pub mod styles;
