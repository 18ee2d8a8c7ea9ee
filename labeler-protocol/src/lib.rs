//! Labeler operator protocol
//!
//! This crate defines the text protocol spoken over the controller's
//! serial console. Everything is newline-terminated ASCII:
//!
//! ```text
//! host  -> controller   RESET | *** | NEXT_LABEL | +++ | CONFIG
//! controller -> host    STATE<nn>: <name>   ERROR<nn>: <text>   READY
//! ```
//!
//! During a configuration exchange the controller lists every parameter as
//! `name=value` followed by `END`, then accepts `name=value` lines from the
//! host until `END` (apply) or `ABORT` (discard).

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod line;
pub mod status;

pub use command::Command;
pub use config::{ConfigLine, CONFIG_ABORT, CONFIG_END};
pub use line::{Line, LineError, LineParser, MAX_LINE_LEN};
pub use status::{ErrorCode, StateCode, StatusLine};
