//! Device lifecycle and per-device access surface for relay boards.
//!
//! This crate owns the two hard invariants of the system:
//!
//! 1. **Attach is all-or-nothing.** [`DeviceManager::attach`] walks the
//!    acquisition ladder (identity, transport bind, publish, mode
//!    configuration, initial state push) and a failure at any rung unwinds
//!    exactly the rungs already climbed, in reverse. A caller can never
//!    observe a half-initialized device, a leaked identity, or a dangling
//!    transport claim.
//!
//! 2. **The mask has one writer at a time.** Every read and mutation of a
//!    board's state byte happens under that instance's guard, and the
//!    lifecycle state is checked under the same guard, so a detach racing an
//!    in-flight command surfaces as a device-unavailable error rather than
//!    an operation on freed resources.
//!
//! # Layout
//!
//! - [`pool`]: the identity allocator shared by all attach/detach events.
//! - [`instance`]: one attached board with its mask, transport, and guard.
//! - [`session`]: the byte-oriented access surface callers hold.
//! - [`manager`]: attach/detach orchestration and the published-node
//!   registry.

pub mod error;
pub mod instance;
pub mod manager;
pub mod pool;
pub mod session;

pub use error::{DeviceError, Result};
pub use instance::{LifecycleState, RelayDevice};
pub use manager::{DeviceManager, HotplugEvent};
pub use pool::{IdentityLease, IdentityPool};
pub use session::{DeviceSession, MaskAccess};
