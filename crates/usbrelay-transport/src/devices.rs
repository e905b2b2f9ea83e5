//! Enum wrappers for transport dispatch.
//!
//! Native `async fn` in traits (RPITIT, edition 2024) is not object safe,
//! so the device layer cannot hold a `Box<dyn RelayTransport>`. These enums
//! provide concrete-type dispatch instead: every transport implementation
//! gets a variant, and the match arms monomorphize away.

use crate::error::Result;
use crate::ftdi::{FtdiBitbang, FtdiPort};
use crate::mock::{MockPort, MockTransport};
use crate::traits::{RelayPort, RelayTransport};

/// Enum wrapper for bound transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRelayTransport {
    /// Real FTDI bridge hardware.
    Ftdi(FtdiBitbang),

    /// Mock transport for tests and `--mock` runs.
    Mock(MockTransport),
}

impl RelayTransport for AnyRelayTransport {
    async fn configure_output_mode(&mut self) -> Result<()> {
        match self {
            Self::Ftdi(transport) => transport.configure_output_mode().await,
            Self::Mock(transport) => transport.configure_output_mode().await,
        }
    }

    async fn push(&mut self, byte: u8) -> Result<()> {
        match self {
            Self::Ftdi(transport) => transport.push(byte).await,
            Self::Mock(transport) => transport.push(byte).await,
        }
    }
}

/// Enum wrapper for unbound port dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRelayPort {
    /// A discovered FTDI bridge.
    Ftdi(FtdiPort),

    /// A mock board.
    Mock(MockPort),
}

impl RelayPort for AnyRelayPort {
    type Transport = AnyRelayTransport;

    async fn bind(self) -> Result<AnyRelayTransport> {
        match self {
            Self::Ftdi(port) => port.bind().await.map(AnyRelayTransport::Ftdi),
            Self::Mock(port) => port.bind().await.map(AnyRelayTransport::Mock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPort;

    #[tokio::test]
    async fn test_any_port_binds_to_matching_transport() {
        let (port, handle) = MockPort::new();
        let mut transport = AnyRelayPort::Mock(port).bind().await.unwrap();

        transport.configure_output_mode().await.unwrap();
        transport.push(0x0F).await.unwrap();

        assert!(handle.is_configured());
        assert_eq!(handle.last_pushed(), Some(0x0F));
    }
}
