//! End-to-end protocol flow against a mock-backed device stack.
//!
//! The full chain is in the loop here: command text through the engine,
//! through a real session and device instance, down to the mock transport.
//! The mock handle verifies what the hardware would actually have seen.

use usbrelay_device::DeviceManager;
use usbrelay_protocol::ProtocolEngine;
use usbrelay_transport::{AnyRelayPort, MockPort, MockTransportHandle};

async fn attach_board(manager: &DeviceManager) -> MockTransportHandle {
    let (port, handle) = MockPort::new();
    manager.attach(AnyRelayPort::Mock(port)).await.unwrap();
    handle
}

#[tokio::test]
async fn full_command_scenario() {
    let manager = DeviceManager::new();
    let handle = attach_board(&manager).await;
    let mut session = manager.open_node("usbrelay0").await.unwrap();

    // Fresh board: everything off.
    assert_eq!(
        ProtocolEngine::run_line(&mut session, "getall").await,
        "OK MASK=0x00"
    );

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "set 1 on").await,
        "OK CH=1 STATE=ON"
    );
    assert_eq!(handle.last_pushed(), Some(0x01));

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "set 3 on").await,
        "OK CH=3 STATE=ON"
    );
    assert_eq!(handle.last_pushed(), Some(0x05));

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "toggle 1").await,
        "OK CH=1 STATE=OFF"
    );
    assert_eq!(handle.last_pushed(), Some(0x04));

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "getall").await,
        "OK MASK=0x04"
    );

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "write-mask 0x0A").await,
        "OK MASK=0x0A"
    );
    assert_eq!(handle.last_pushed(), Some(0x0A));

    // Out-of-range mask: rejected before the device, state untouched.
    let reply = ProtocolEngine::run_line(&mut session, "write-mask 0x10").await;
    assert!(reply.starts_with("ERR BAD_MASK"), "{reply}");
    assert_eq!(handle.last_pushed(), Some(0x0A));
    assert_eq!(
        ProtocolEngine::run_line(&mut session, "read-mask").await,
        "OK MASK=0x0A"
    );

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "reset").await,
        "OK MASK=0x00"
    );
    assert_eq!(handle.last_pushed(), Some(0x00));

    assert_eq!(ProtocolEngine::run_line(&mut session, "ping").await, "OK");
}

#[tokio::test]
async fn write_then_read_roundtrips_every_valid_mask() {
    let manager = DeviceManager::new();
    let _handle = attach_board(&manager).await;
    let mut session = manager.open_node("usbrelay0").await.unwrap();

    for mask in 0x00..=0x0F_u8 {
        let write = format!("write-mask 0x{mask:02X}");
        assert_eq!(
            ProtocolEngine::run_line(&mut session, &write).await,
            format!("OK MASK=0x{mask:02X}")
        );
        assert_eq!(
            ProtocolEngine::run_line(&mut session, "read-mask").await,
            format!("OK MASK=0x{mask:02X}")
        );
    }
}

#[tokio::test]
async fn commands_after_detach_report_device_unavailable() {
    let manager = DeviceManager::new();
    let _handle = attach_board(&manager).await;
    let mut session = manager.open_node("usbrelay0").await.unwrap();

    assert_eq!(
        ProtocolEngine::run_line(&mut session, "set 2 on").await,
        "OK CH=2 STATE=ON"
    );

    manager.detach_all().await;

    for line in ["set 2 off", "getall", "toggle 1", "ping", "reset"] {
        let reply = ProtocolEngine::run_line(&mut session, line).await;
        assert!(
            reply.starts_with("ERR DEVICE_UNAVAILABLE"),
            "{line}: {reply}"
        );
    }

    // Device-free commands still work.
    assert!(
        ProtocolEngine::run_line(&mut session, "version")
            .await
            .starts_with("OK VERSION=1.1")
    );
}

#[tokio::test]
async fn sessions_share_one_serialized_mask() {
    let manager = DeviceManager::new();
    let handle = attach_board(&manager).await;

    let mut first = manager.open_node("usbrelay0").await.unwrap();
    let mut second = manager.open_node("usbrelay0").await.unwrap();

    ProtocolEngine::run_line(&mut first, "set 1 on").await;
    ProtocolEngine::run_line(&mut second, "set 4 on").await;

    // Both read-modify-writes landed; neither update was lost.
    assert_eq!(
        ProtocolEngine::run_line(&mut first, "getall").await,
        "OK MASK=0x09"
    );
    assert_eq!(handle.last_pushed(), Some(0x09));
}
