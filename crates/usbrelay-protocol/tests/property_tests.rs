//! Property-based tests for the protocol engine.
//!
//! These drive the real device stack (manager, instance, session, mock
//! transport) under proptest-generated channels and masks. The stack has no
//! timers, so a plain futures executor is enough to run it.

use futures::executor::block_on;
use proptest::prelude::*;

use usbrelay_core::{Channel, RelayMask};
use usbrelay_device::{DeviceManager, DeviceSession, MaskAccess};
use usbrelay_protocol::ProtocolEngine;
use usbrelay_transport::{AnyRelayPort, MockPort};

/// Strategy for valid channels (1-4).
fn valid_channel() -> impl Strategy<Value = u8> {
    1u8..=4u8
}

/// Strategy for valid masks (0x00-0x0F).
fn valid_mask() -> impl Strategy<Value = u8> {
    0u8..=0x0Fu8
}

/// Attach one mock board and open a session with the given initial mask.
fn session_with_mask(mask: u8) -> (DeviceManager, DeviceSession) {
    block_on(async {
        let manager = DeviceManager::new();
        let (port, _handle) = MockPort::new();
        manager.attach(AnyRelayPort::Mock(port)).await.unwrap();
        let mut session = manager.open_node("usbrelay0").await.unwrap();
        session.write_mask(mask).await.unwrap();
        (manager, session)
    })
}

proptest! {
    /// Toggling any channel twice returns any initial mask to itself.
    #[test]
    fn prop_toggle_twice_is_identity(channel in valid_channel(), initial in valid_mask()) {
        let (_manager, mut session) = session_with_mask(initial);
        let line = format!("toggle {channel}");

        block_on(async {
            ProtocolEngine::run_line(&mut session, &line).await;
            ProtocolEngine::run_line(&mut session, &line).await;

            session.rewind();
            let mask = session.read_mask().await.unwrap().unwrap();
            prop_assert_eq!(mask.value(), initial);
            Ok(())
        })?;
    }

    /// After `set <ch> <state>`, `get <ch>` reports exactly that state and
    /// every other channel's bit is untouched.
    #[test]
    fn prop_set_then_get_is_faithful(
        channel in valid_channel(),
        initial in valid_mask(),
        on in any::<bool>(),
    ) {
        let (_manager, mut session) = session_with_mask(initial);
        let state = if on { "on" } else { "off" };
        let set_line = format!("set {channel} {state}");
        let get_line = format!("get {channel}");

        block_on(async {
            ProtocolEngine::run_line(&mut session, &set_line).await;
            let reply = ProtocolEngine::run_line(&mut session, &get_line).await;
            prop_assert_eq!(
                reply,
                format!("OK CH={channel} STATE={}", state.to_uppercase())
            );

            // Independence: only the addressed bit may have changed.
            session.rewind();
            let mask = session.read_mask().await.unwrap().unwrap().value();
            let bit = Channel::new(channel).unwrap().bit();
            prop_assert_eq!(mask & !bit, initial & !bit);
            Ok(())
        })?;
    }

    /// write-mask then read-mask roundtrips every valid mask.
    #[test]
    fn prop_write_read_roundtrip(initial in valid_mask(), mask in valid_mask()) {
        let (_manager, mut session) = session_with_mask(initial);

        block_on(async {
            let write = format!("write-mask 0x{mask:02X}");
            let written = ProtocolEngine::run_line(&mut session, &write).await;
            prop_assert_eq!(written, format!("OK MASK=0x{mask:02X}"));

            let read = ProtocolEngine::run_line(&mut session, "read-mask").await;
            prop_assert_eq!(read, format!("OK MASK=0x{mask:02X}"));
            Ok(())
        })?;
    }

    /// Reset yields mask 0x00 from any prior state.
    #[test]
    fn prop_reset_always_clears(initial in valid_mask()) {
        let (_manager, mut session) = session_with_mask(initial);

        block_on(async {
            let reply = ProtocolEngine::run_line(&mut session, "reset").await;
            prop_assert_eq!(reply, "OK MASK=0x00");

            session.rewind();
            let mask = session.read_mask().await.unwrap().unwrap();
            prop_assert_eq!(mask, RelayMask::CLEAR);
            Ok(())
        })?;
    }

    /// Any byte with a bit above bit 3 set is rejected as a mask argument.
    #[test]
    fn prop_high_bit_masks_are_rejected(mask in 0x10u8..=0xFFu8) {
        let (_manager, mut session) = session_with_mask(0x00);

        block_on(async {
            let line = format!("write-mask 0x{mask:02X}");
            let reply = ProtocolEngine::run_line(&mut session, &line).await;
            prop_assert!(reply.starts_with("ERR BAD_MASK"), "{}", reply);
            Ok(())
        })?;
    }
}
