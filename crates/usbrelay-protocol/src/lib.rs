//! ASCII command protocol for relay boards.
//!
//! A thin, stateless translation layer between the textual command grammar
//! (`set 1 on`, `write-mask 0x0A`, ...) and the byte-oriented access
//! surface of a device instance. Parsing and execution are strictly
//! separated: a [`Command`] that exists is fully validated, and the
//! [`ProtocolEngine`] only ever receives commands it can dispatch.
//!
//! # Protocol format
//!
//! Requests are single lines of whitespace-separated words, verbs matched
//! case-insensitively. Responses are single lines:
//!
//! ```text
//! OK CH=1 STATE=ON
//! OK MASK=0x0A
//! OK
//! ERR BAD_MASK Mask must be in range 0x00-0x0F
//! ```
//!
//! Error codes: `BAD_COMMAND`, `BAD_CHANNEL`, `BAD_STATE`, `BAD_MASK`,
//! `DEVICE_UNAVAILABLE`, `INTERNAL_ERROR`. The engine never masks an
//! access-surface failure (every one surfaces as `DEVICE_UNAVAILABLE`),
//! and an impossible dispatch surfaces as `INTERNAL_ERROR` so defects are
//! distinguishable from user errors.

pub mod command;
pub mod engine;
pub mod error;
pub mod response;

pub use command::Command;
pub use engine::ProtocolEngine;
pub use error::{ErrorCode, ProtocolError};
pub use response::Response;
