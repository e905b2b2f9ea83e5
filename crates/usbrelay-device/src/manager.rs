//! Device lifecycle manager.
//!
//! The manager reacts to attach/detach notifications from the host
//! environment. Attach walks a strict acquisition ladder; detach tears a
//! live instance down in the exact reverse order. Between the two, the
//! manager publishes each ready instance in a node registry
//! (`usbrelay0`..`usbrelay3`) where callers open sessions.
//!
//! # The attach ladder
//!
//! ```text
//! acquire identity ─► bind transport ─► publish node ─► configure mode
//!                                                        ─► push all-off ─► Ready
//! ```
//!
//! A failure at any rung unwinds only the rungs already climbed, in
//! reverse. The unwinding is structural rather than hand-sequenced:
//! publication is the one explicitly reverted step, and dropping the
//! unfinished instance releases the transport claim and then the identity
//! lease (in that order) through their owners' `Drop` impls. After a failed
//! attach, nothing of the instance remains observable.
//!
//! # Examples
//!
//! ```
//! use usbrelay_device::{DeviceManager, MaskAccess};
//! use usbrelay_transport::{AnyRelayPort, MockPort};
//!
//! #[tokio::main]
//! async fn main() -> usbrelay_device::Result<()> {
//!     let manager = DeviceManager::new();
//!
//!     let (port, _handle) = MockPort::new();
//!     let device = manager.attach(AnyRelayPort::Mock(port)).await?;
//!     assert_eq!(device.node_name(), "usbrelay0");
//!
//!     let mut session = manager.open_node("usbrelay0").await?;
//!     session.write_mask(0x05).await?;
//!
//!     manager.detach(device.identity()).await;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use usbrelay_core::{DeviceIdentity, constants::MAX_DEVICES};
use usbrelay_transport::{AnyRelayPort, RelayPort};

use crate::error::{DeviceError, Result};
use crate::instance::RelayDevice;
use crate::pool::IdentityPool;
use crate::session::DeviceSession;

/// Hotplug notification from the host environment.
#[derive(Debug)]
#[non_exhaustive]
pub enum HotplugEvent {
    /// A board appeared; attach it.
    Attached(AnyRelayPort),

    /// The board with this identity went away; detach it.
    Detached(DeviceIdentity),
}

/// Orchestrates instance creation and teardown for all attached boards.
#[derive(Debug)]
pub struct DeviceManager {
    pool: Arc<IdentityPool>,
    registry: Mutex<HashMap<DeviceIdentity, Arc<RelayDevice>>>,
}

impl DeviceManager {
    /// Create a manager for the default board count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_DEVICES)
    }

    /// Create a manager with an explicit identity range.
    #[must_use]
    pub fn with_capacity(max_devices: usize) -> Self {
        Self::with_pool(IdentityPool::new(max_devices))
    }

    /// Create a manager around an existing identity pool.
    ///
    /// The pool is an explicit collaborator rather than process-wide state,
    /// so tests (or a host embedding several managers) can construct and
    /// observe it independently.
    #[must_use]
    pub fn with_pool(pool: Arc<IdentityPool>) -> Self {
        Self {
            pool,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Attach a board, producing a fully initialized, published instance.
    ///
    /// Either every step succeeds and the returned instance is `Ready`, or
    /// the failing step's error comes back with every completed step undone:
    /// identity released, transport claim dropped, node unpublished.
    ///
    /// # Errors
    ///
    /// - `DeviceError::IdentityExhausted` when the board limit is reached.
    /// - `DeviceError::Transport` when binding, mode configuration, or the
    ///   initial state push fails.
    pub async fn attach(&self, port: AnyRelayPort) -> Result<Arc<RelayDevice>> {
        // Identity first: the node name is needed by every later step.
        let lease = self.pool.acquire()?;
        let identity = lease.identity();
        debug!(node = %identity, "attach: identity acquired");

        // Bind the physical device. On failure `lease` drops here and the
        // identity returns to the pool.
        let transport = port.bind().await?;

        // The instance now owns lease and transport; from here, dropping it
        // unwinds both in reverse acquisition order.
        let device = RelayDevice::new(lease, transport);

        self.publish(&device)?;

        // Mode configuration and the all-off initial push. The node is
        // already visible but the instance is still `Initializing`, so
        // concurrent opens are refused until this completes.
        if let Err(err) = device.initialize().await {
            warn!(node = %identity, error = %err, "attach failed, unwinding");
            self.unpublish(identity);
            return Err(err);
        }

        info!(node = %identity, "device attached");
        Ok(device)
    }

    /// Detach an instance by identity.
    ///
    /// The instance is marked `Disconnected` under its own guard first, so
    /// concurrent commands fail fast; then the node is unpublished, the
    /// transport released, and the identity returned to the pool.
    ///
    /// Idempotent: detaching an unknown or already-detached identity is a
    /// no-op, not an error.
    pub async fn detach(&self, identity: DeviceIdentity) {
        let device = {
            let registry = self.lock_registry();
            registry.get(&identity).cloned()
        };

        let Some(device) = device else {
            debug!(node = %identity, "detach for absent node, ignoring");
            return;
        };

        let (transport, lease) = device.shutdown().await;
        self.unpublish(identity);
        drop(transport);
        drop(lease);

        info!(node = %identity, "device detached");
    }

    /// Detach every live instance.
    pub async fn detach_all(&self) {
        for identity in self.identities() {
            self.detach(identity).await;
        }
    }

    /// Open a session on a published instance.
    ///
    /// # Errors
    ///
    /// `DeviceError::UnknownNode` if no such identity is published;
    /// `DeviceError::Unavailable` if the instance is not ready.
    pub async fn open(&self, identity: DeviceIdentity) -> Result<DeviceSession> {
        let device = {
            let registry = self.lock_registry();
            registry.get(&identity).cloned()
        };
        match device {
            Some(device) => device.open().await,
            None => Err(DeviceError::unknown_node(identity.node_name())),
        }
    }

    /// Open a session by node name (`usbrelay<n>`).
    ///
    /// # Errors
    ///
    /// `DeviceError::UnknownNode` for malformed or unpublished names;
    /// `DeviceError::Unavailable` if the instance is not ready.
    pub async fn open_node(&self, node: &str) -> Result<DeviceSession> {
        let identity = DeviceIdentity::from_node_name(node)
            .map_err(|_| DeviceError::unknown_node(node))?;
        self.open(identity).await
    }

    /// Identities of every published instance, lowest first.
    #[must_use]
    pub fn identities(&self) -> Vec<DeviceIdentity> {
        let mut identities: Vec<_> = self.lock_registry().keys().copied().collect();
        identities.sort_unstable();
        identities
    }

    /// Number of published instances.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.lock_registry().len()
    }

    /// Number of identities still free in the pool.
    #[must_use]
    pub fn free_identities(&self) -> usize {
        self.pool.free_count()
    }

    /// Drive the manager from a hotplug event stream until it closes.
    ///
    /// Attach failures are logged and swallowed; a board that failed to
    /// attach simply is not there, and the next event is processed.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<HotplugEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                HotplugEvent::Attached(port) => {
                    if let Err(err) = self.attach(port).await {
                        warn!(error = %err, "hotplug attach failed");
                    }
                }
                HotplugEvent::Detached(identity) => {
                    self.detach(identity).await;
                }
            }
        }
        debug!("hotplug event stream closed");
    }

    fn publish(&self, device: &Arc<RelayDevice>) -> Result<()> {
        let mut registry = self.lock_registry();
        let identity = device.identity();
        if registry.contains_key(&identity) {
            return Err(DeviceError::AlreadyPublished {
                node: identity.node_name(),
            });
        }
        registry.insert(identity, Arc::clone(device));
        Ok(())
    }

    fn unpublish(&self, identity: DeviceIdentity) {
        self.lock_registry().remove(&identity);
    }

    fn lock_registry(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<DeviceIdentity, Arc<RelayDevice>>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
