//! Protocol engine: command in, access-surface operations out.
//!
//! The engine is a pure translator. It holds no state, touches no hardware
//! of its own, and reaches a device only through the [`MaskAccess`]
//! contract. Set and toggle go through the surface's read-modify-write so
//! the instance guard covers the whole sequence; reads reposition first so
//! every command observes the current mask regardless of what the session
//! read before.

use usbrelay_core::RelayMask;
use usbrelay_device::MaskAccess;

use crate::command::Command;
use crate::error::ProtocolError;
use crate::response::Response;

/// Stateless command executor.
pub struct ProtocolEngine;

impl ProtocolEngine {
    /// Execute one validated command against an access surface.
    ///
    /// # Errors
    ///
    /// Returns `DEVICE_UNAVAILABLE` for any access-surface failure and
    /// `INTERNAL_ERROR` if the surface violates its own contract. Commands
    /// that need no device (`version`, `help`) cannot fail.
    pub async fn execute<A: MaskAccess>(
        access: &mut A,
        command: &Command,
    ) -> Result<Response, ProtocolError> {
        match command {
            Command::Set { channel, state } => {
                Self::modify(access, |mask| mask.with(*channel, *state)).await?;
                Ok(Response::ChannelState {
                    channel: *channel,
                    state: *state,
                })
            }

            Command::Get { channel } => {
                let mask = Self::read(access).await?;
                Ok(Response::ChannelState {
                    channel: *channel,
                    state: mask.state_of(*channel),
                })
            }

            Command::GetAll | Command::ReadMask => Ok(Response::Mask(Self::read(access).await?)),

            Command::Toggle { channel } => {
                let mask = Self::modify(access, |mask| mask.toggle(*channel)).await?;
                Ok(Response::ChannelState {
                    channel: *channel,
                    state: mask.state_of(*channel),
                })
            }

            Command::WriteMask(mask) => {
                access.write_mask(mask.value()).await?;
                Ok(Response::Mask(*mask))
            }

            Command::Reset => {
                access.write_mask(RelayMask::CLEAR.value()).await?;
                Ok(Response::Mask(RelayMask::CLEAR))
            }

            Command::Ping => {
                Self::read(access).await?;
                Ok(Response::Empty)
            }

            Command::Version => Ok(Response::Version),

            Command::Help => Ok(Response::Help),
        }
    }

    /// Parse and execute one protocol line, producing the response line.
    ///
    /// Both outcomes render to text here, `OK ...` or `ERR <CODE> ...`,
    /// so front ends can pass lines through verbatim.
    pub async fn run_line<A: MaskAccess>(access: &mut A, line: &str) -> String {
        match Command::parse(line) {
            Ok(command) => match Self::execute(access, &command).await {
                Ok(response) => response.to_string(),
                Err(err) => err.to_string(),
            },
            Err(err) => err.to_string(),
        }
    }

    /// Reposition and read the current mask.
    async fn read<A: MaskAccess>(access: &mut A) -> Result<RelayMask, ProtocolError> {
        access.rewind();
        access
            .read_mask()
            .await?
            .ok_or_else(|| ProtocolError::internal("End of data after reposition"))
    }

    /// Read-modify-write under one guard acquisition.
    async fn modify<A, F>(access: &mut A, apply: F) -> Result<RelayMask, ProtocolError>
    where
        A: MaskAccess,
        F: FnOnce(RelayMask) -> RelayMask + Send,
    {
        access.modify_mask(apply).await.map_err(ProtocolError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use usbrelay_device::{DeviceError, Result as DeviceResult};

    /// In-memory stand-in for a device session.
    struct FakeEndpoint {
        mask: RelayMask,
        consumed: bool,
        available: bool,
    }

    impl FakeEndpoint {
        fn new() -> Self {
            Self {
                mask: RelayMask::CLEAR,
                consumed: false,
                available: true,
            }
        }

        fn detached() -> Self {
            Self {
                available: false,
                ..Self::new()
            }
        }
    }

    impl MaskAccess for FakeEndpoint {
        async fn read_mask(&mut self) -> DeviceResult<Option<RelayMask>> {
            if !self.available {
                return Err(DeviceError::unavailable("usbrelay0"));
            }
            if self.consumed {
                return Ok(None);
            }
            self.consumed = true;
            Ok(Some(self.mask))
        }

        async fn write_mask(&mut self, byte: u8) -> DeviceResult<()> {
            if !self.available {
                return Err(DeviceError::unavailable("usbrelay0"));
            }
            self.mask = RelayMask::truncate(byte);
            Ok(())
        }

        async fn modify_mask<F>(&mut self, apply: F) -> DeviceResult<RelayMask>
        where
            F: FnOnce(RelayMask) -> RelayMask + Send,
        {
            if !self.available {
                return Err(DeviceError::unavailable("usbrelay0"));
            }
            self.mask = apply(self.mask);
            Ok(self.mask)
        }

        fn rewind(&mut self) {
            self.consumed = false;
        }
    }

    async fn run(endpoint: &mut FakeEndpoint, line: &str) -> String {
        ProtocolEngine::run_line(endpoint, line).await
    }

    #[tokio::test]
    async fn test_set_reports_requested_state() {
        let mut endpoint = FakeEndpoint::new();
        assert_eq!(run(&mut endpoint, "set 2 on").await, "OK CH=2 STATE=ON");
        assert_eq!(endpoint.mask.value(), 0x02);

        assert_eq!(run(&mut endpoint, "set 2 off").await, "OK CH=2 STATE=OFF");
        assert_eq!(endpoint.mask.value(), 0x00);
    }

    #[tokio::test]
    async fn test_get_reads_without_writing() {
        let mut endpoint = FakeEndpoint::new();
        endpoint.mask = RelayMask::new(0x04).unwrap();

        assert_eq!(run(&mut endpoint, "get 3").await, "OK CH=3 STATE=ON");
        assert_eq!(run(&mut endpoint, "get 1").await, "OK CH=1 STATE=OFF");
        assert_eq!(endpoint.mask.value(), 0x04);
    }

    #[tokio::test]
    async fn test_consecutive_reads_reposition() {
        let mut endpoint = FakeEndpoint::new();
        // Each read command rewinds first, so back-to-back reads both see
        // the mask instead of the second hitting end-of-data.
        assert_eq!(run(&mut endpoint, "getall").await, "OK MASK=0x00");
        assert_eq!(run(&mut endpoint, "read-mask").await, "OK MASK=0x00");
    }

    #[tokio::test]
    async fn test_toggle_reports_new_state() {
        let mut endpoint = FakeEndpoint::new();
        assert_eq!(run(&mut endpoint, "toggle 1").await, "OK CH=1 STATE=ON");
        assert_eq!(run(&mut endpoint, "toggle 1").await, "OK CH=1 STATE=OFF");
    }

    #[tokio::test]
    async fn test_write_and_reset() {
        let mut endpoint = FakeEndpoint::new();
        assert_eq!(run(&mut endpoint, "write-mask 0x0F").await, "OK MASK=0x0F");
        assert_eq!(run(&mut endpoint, "reset").await, "OK MASK=0x00");
        assert_eq!(endpoint.mask.value(), 0x00);
    }

    #[tokio::test]
    async fn test_ping_discards_the_mask() {
        let mut endpoint = FakeEndpoint::new();
        assert_eq!(run(&mut endpoint, "ping").await, "OK");
    }

    #[tokio::test]
    async fn test_every_device_command_fails_unavailable_when_detached() {
        for line in [
            "set 1 on",
            "get 1",
            "getall",
            "toggle 2",
            "write-mask 0x03",
            "read-mask",
            "reset",
            "ping",
        ] {
            let mut endpoint = FakeEndpoint::detached();
            let reply = run(&mut endpoint, line).await;
            assert!(
                reply.starts_with("ERR DEVICE_UNAVAILABLE"),
                "{line}: {reply}"
            );
        }
    }

    #[tokio::test]
    async fn test_version_and_help_need_no_device() {
        // Even against a detached endpoint these succeed.
        let mut endpoint = FakeEndpoint::detached();
        assert!(run(&mut endpoint, "version").await.starts_with("OK VERSION="));
        assert!(run(&mut endpoint, "help").await.contains("write-mask"));
    }

    #[tokio::test]
    async fn test_validation_errors_never_touch_the_endpoint() {
        let mut endpoint = FakeEndpoint::new();
        endpoint.mask = RelayMask::new(0x0A).unwrap();

        let reply = run(&mut endpoint, "write-mask 0x10").await;
        assert!(reply.starts_with("ERR BAD_MASK"));
        // Rejected before reaching the device: mask untouched.
        assert_eq!(endpoint.mask.value(), 0x0A);
    }

    #[tokio::test]
    async fn test_endpoint_contract_violation_is_internal_error() {
        struct BrokenEndpoint;

        impl MaskAccess for BrokenEndpoint {
            async fn read_mask(&mut self) -> DeviceResult<Option<RelayMask>> {
                // End-of-data straight after a reposition: contract breach.
                Ok(None)
            }
            async fn write_mask(&mut self, _byte: u8) -> DeviceResult<()> {
                Ok(())
            }
            async fn modify_mask<F>(&mut self, apply: F) -> DeviceResult<RelayMask>
            where
                F: FnOnce(RelayMask) -> RelayMask + Send,
            {
                Ok(apply(RelayMask::CLEAR))
            }
            fn rewind(&mut self) {}
        }

        let command = Command::parse("getall").unwrap();
        let error = ProtocolEngine::execute(&mut BrokenEndpoint, &command)
            .await
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::InternalError);
    }
}
