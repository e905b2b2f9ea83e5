//! Mock transport for testing and hardware-free development.
//!
//! The mock records every byte pushed at it and can be told to fail at any
//! of the three points a real bridge can fail: binding, mode configuration,
//! and pushing. That is exactly the failure matrix the device lifecycle
//! manager's unwind ladder has to survive, so the attach tests are built on
//! this module.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, TransportError};
use crate::traits::{RelayPort, RelayTransport};

#[derive(Debug, Default)]
struct MockState {
    configured: bool,
    pushed: Vec<u8>,
    transport_live: bool,
    fail_bind: bool,
    fail_configure: bool,
    fail_push: bool,
}

fn lock(state: &Mutex<MockState>) -> std::sync::MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An unbound mock board.
///
/// # Examples
///
/// ```
/// use usbrelay_transport::{MockPort, RelayPort, RelayTransport};
///
/// #[tokio::main]
/// async fn main() -> usbrelay_transport::Result<()> {
///     let (port, handle) = MockPort::new();
///
///     let mut transport = port.bind().await?;
///     transport.configure_output_mode().await?;
///     transport.push(0x05).await?;
///
///     assert!(handle.is_configured());
///     assert_eq!(handle.last_pushed(), Some(0x05));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPort {
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    /// Create a mock port and the handle that controls it.
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockTransportHandle { state },
        )
    }
}

impl RelayPort for MockPort {
    type Transport = MockTransport;

    async fn bind(self) -> Result<MockTransport> {
        let mut state = lock(&self.state);
        if state.fail_bind {
            return Err(TransportError::io("injected bind failure"));
        }
        state.transport_live = true;
        drop(state);

        Ok(MockTransport { state: self.state })
    }
}

/// A bound mock transport.
///
/// Dropping it marks the shared state as no longer live, which is how the
/// lifecycle tests verify that a failed or detached instance released its
/// transport.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl RelayTransport for MockTransport {
    async fn configure_output_mode(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_configure {
            return Err(TransportError::configuration(
                "injected configuration failure",
            ));
        }
        state.configured = true;
        Ok(())
    }

    async fn push(&mut self, byte: u8) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_push {
            return Err(TransportError::io("injected push failure"));
        }
        state.pushed.push(byte);
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        lock(&self.state).transport_live = false;
    }
}

/// Control and inspection handle for a mock board.
///
/// Cloneable; clones observe and steer the same shared state.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    /// Whether bit-bang output mode has been configured.
    pub fn is_configured(&self) -> bool {
        lock(&self.state).configured
    }

    /// Every byte pushed so far, oldest first.
    pub fn pushed(&self) -> Vec<u8> {
        lock(&self.state).pushed.clone()
    }

    /// The most recently pushed byte, if any.
    pub fn last_pushed(&self) -> Option<u8> {
        lock(&self.state).pushed.last().copied()
    }

    /// Number of successful pushes.
    pub fn push_count(&self) -> usize {
        lock(&self.state).pushed.len()
    }

    /// Whether a bound transport currently exists for this board.
    pub fn transport_live(&self) -> bool {
        lock(&self.state).transport_live
    }

    /// Make the next (and every later) bind attempt fail.
    pub fn fail_bind(&self, fail: bool) {
        lock(&self.state).fail_bind = fail;
    }

    /// Make mode configuration fail.
    pub fn fail_configure(&self, fail: bool) {
        lock(&self.state).fail_configure = fail;
    }

    /// Make pushes fail.
    pub fn fail_push(&self, fail: bool) {
        lock(&self.state).fail_push = fail;
    }
}
