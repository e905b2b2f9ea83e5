//! One attached relay board.
//!
//! A [`RelayDevice`] owns everything a live board needs: its identity lease,
//! the bound transport, the 4-bit state mask, and the guard that serializes
//! all of it. The mask is the canonical truth for the board's state; every
//! mutation pushes the new byte through the transport before the guard is
//! released.
//!
//! The lifecycle state lives under the same guard as the mask. That single
//! decision is what makes detach race-free: a command that loses the race
//! still takes the guard, sees `Disconnected`, and fails with a
//! device-unavailable error instead of touching released resources.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use usbrelay_core::{DeviceIdentity, RelayMask};
use usbrelay_transport::{AnyRelayTransport, RelayTransport};

use crate::error::{DeviceError, Result};
use crate::pool::IdentityLease;
use crate::session::DeviceSession;

/// Lifecycle of one device instance.
///
/// `Initializing → Ready` on a successful attach; `Ready → Disconnected` on
/// detach. `Disconnected` is terminal: an instance never becomes ready
/// again, a reattached board gets a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Attach sequence still running; not yet a valid target for callers.
    Initializing,

    /// Fully attached and accepting operations.
    Ready,

    /// Detached. All operations fail with device-unavailable.
    Disconnected,
}

/// Everything guarded by the instance lock.
///
/// Field order matters for the unwind paths: when an inner is dropped
/// whole (failed attach), the transport must release before the identity
/// lease so teardown mirrors the reverse of acquisition.
#[derive(Debug)]
struct DeviceInner {
    state: LifecycleState,
    mask: RelayMask,
    transport: Option<AnyRelayTransport>,
    lease: Option<IdentityLease>,
}

impl DeviceInner {
    fn ensure_ready(&self, node: &str) -> Result<()> {
        if self.state == LifecycleState::Ready {
            Ok(())
        } else {
            Err(DeviceError::unavailable(node))
        }
    }

    fn transport(&mut self, node: &str) -> Result<&mut AnyRelayTransport> {
        self.transport
            .as_mut()
            .ok_or_else(|| DeviceError::unavailable(node))
    }
}

/// One attached board: identity, mask, transport, and their guard.
///
/// Created only by the device manager's attach sequence and torn down only
/// by the same manager. Callers interact through [`DeviceSession`]s.
#[derive(Debug)]
pub struct RelayDevice {
    identity: DeviceIdentity,
    inner: Mutex<DeviceInner>,
}

impl RelayDevice {
    /// Assemble an instance in the `Initializing` state.
    ///
    /// The mask starts all-off; it is pushed to the hardware by
    /// [`initialize`](Self::initialize).
    pub(crate) fn new(lease: IdentityLease, transport: AnyRelayTransport) -> Arc<Self> {
        let identity = lease.identity();
        Arc::new(Self {
            identity,
            inner: Mutex::new(DeviceInner {
                state: LifecycleState::Initializing,
                mask: RelayMask::CLEAR,
                transport: Some(transport),
                lease: Some(lease),
            }),
        })
    }

    /// Identity of this instance, stable for its whole lifetime.
    #[must_use]
    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Published node name (`usbrelay<n>`).
    #[must_use]
    pub fn node_name(&self) -> String {
        self.identity.node_name()
    }

    /// Current lifecycle state.
    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    /// Configure the transport and push the all-off initial mask, then mark
    /// the instance ready.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged; the caller (the manager's
    /// attach ladder) unwinds publication and lets the instance drop.
    pub(crate) async fn initialize(&self) -> Result<()> {
        let node = self.node_name();
        let mut inner = self.inner.lock().await;

        let initial = inner.mask;
        let transport = inner.transport(&node)?;
        transport.configure_output_mode().await?;
        transport.push(initial.value()).await?;

        inner.state = LifecycleState::Ready;
        Ok(())
    }

    /// Open a caller session against this instance.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` unless the instance is `Ready`;
    /// a disconnected or still-initializing board is not a valid target.
    pub async fn open(self: &Arc<Self>) -> Result<DeviceSession> {
        let inner = self.inner.lock().await;
        inner.ensure_ready(&self.node_name())?;
        drop(inner);
        Ok(DeviceSession::new(Arc::clone(self)))
    }

    /// Read the current mask under the guard.
    pub async fn current_mask(&self) -> Result<RelayMask> {
        let node = self.node_name();
        let inner = self.inner.lock().await;
        inner.ensure_ready(&node)?;
        Ok(inner.mask)
    }

    /// Set the mask and push it through the transport, all under the guard.
    ///
    /// On push failure the in-memory mask keeps the attempted value (no
    /// silent rollback) and the caller sees the I/O error.
    pub async fn write_mask(&self, mask: RelayMask) -> Result<()> {
        let node = self.node_name();
        let mut inner = self.inner.lock().await;
        inner.ensure_ready(&node)?;

        inner.mask = mask;
        let transport = inner.transport(&node)?;
        transport.push(mask.value()).await?;

        debug!(node = %node, mask = %mask, "mask written");
        Ok(())
    }

    /// Apply a read-modify-write to the mask without releasing the guard
    /// between the read and the write.
    ///
    /// Holding the guard across the whole sequence is what prevents lost
    /// updates between concurrent set/toggle operations on different
    /// sessions.
    pub async fn modify_mask<F>(&self, apply: F) -> Result<RelayMask>
    where
        F: FnOnce(RelayMask) -> RelayMask + Send,
    {
        let node = self.node_name();
        let mut inner = self.inner.lock().await;
        inner.ensure_ready(&node)?;

        let next = apply(inner.mask);
        inner.mask = next;
        let transport = inner.transport(&node)?;
        transport.push(next.value()).await?;

        debug!(node = %node, mask = %next, "mask modified");
        Ok(next)
    }

    /// Mark the instance disconnected and strip its resources, returning
    /// them to the caller for ordered release.
    ///
    /// Runs under the guard, so any command that was racing this detach
    /// either completed before the state flip or observes `Disconnected`.
    pub(crate) async fn shutdown(&self) -> (Option<AnyRelayTransport>, Option<IdentityLease>) {
        let mut inner = self.inner.lock().await;
        inner.state = LifecycleState::Disconnected;
        (inner.transport.take(), inner.lease.take())
    }
}
