//! Transport layer for FTDI bit-bang relay boards.
//!
//! The board is an FTDI USB-serial bridge with its four output pins wired to
//! relay drivers. The transport contract is deliberately tiny: put the chip
//! into bit-bang output mode once, then push single state bytes at it. The
//! in-memory mask held by the device layer is the canonical truth; nothing
//! here reads state back from the hardware.
//!
//! # Traits
//!
//! - [`RelayTransport`]: a bound, ready-to-use connection with one blocking
//!   mode-configuration call and a blocking confirmed single-byte push.
//! - [`RelayPort`]: something a transport can be bound from; binding is the
//!   fallible discovery/claim step of device attach.
//!
//! Both traits use native `async fn` (edition 2024 RPITIT) and are therefore
//! not object safe; the [`AnyRelayTransport`](devices::AnyRelayTransport)
//! and [`AnyRelayPort`](devices::AnyRelayPort) enum wrappers provide
//! dispatch where a single concrete type is needed.
//!
//! # Implementations
//!
//! [`ftdi::FtdiPort`] binds real hardware through rusb. [`mock::MockPort`]
//! is a fully controllable in-memory double for tests and the CLI's
//! `--mock` mode: its [`mock::MockTransportHandle`] inspects every pushed
//! byte and injects failures at bind, configure, or push.

pub mod devices;
pub mod error;
pub mod ftdi;
pub mod mock;
pub mod traits;

pub use devices::{AnyRelayPort, AnyRelayTransport};
pub use error::{Result, TransportError};
pub use ftdi::{FtdiBitbang, FtdiPort};
pub use mock::{MockPort, MockTransport, MockTransportHandle};
pub use traits::{RelayPort, RelayTransport};
