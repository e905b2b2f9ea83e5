//! Core value types, constants, and validation errors shared by every crate
//! in the usbrelay workspace.
//!
//! The relay board exposes exactly one byte of state: the low four bits each
//! drive one relay channel. Everything in this crate exists to keep that byte
//! honest: channels stay in `1..=4`, masks stay below `0x10`, and device
//! identities stay inside the configured board count.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
