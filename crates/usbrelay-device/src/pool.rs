//! Fixed-range identity allocator.
//!
//! Identities number the attached boards (`usbrelay0`..`usbrelay3` by
//! default) and must never collide across concurrently live instances. The
//! pool is the only state shared between independent attach/detach events,
//! so it synchronizes internally and independently of any instance's guard.
//!
//! An acquired identity is wrapped in an [`IdentityLease`] that returns its
//! slot on `Drop`. That makes release unconditional on every attach-failure
//! path: unwinding a half-finished attach is just letting the lease fall
//! out of scope.

use std::sync::{Arc, Mutex, PoisonError};

use usbrelay_core::DeviceIdentity;

use crate::error::DeviceError;

/// Allocator for the fixed range of device identities.
///
/// # Examples
///
/// ```
/// use usbrelay_device::IdentityPool;
///
/// let pool = IdentityPool::new(2);
/// let first = pool.acquire().unwrap();
/// let second = pool.acquire().unwrap();
/// assert_ne!(first.identity(), second.identity());
///
/// // The range is exhausted; attach fails cleanly.
/// assert!(pool.acquire().is_err());
///
/// // Releasing an identity makes it immediately reusable.
/// drop(first);
/// let reused = pool.acquire().unwrap();
/// assert_eq!(reused.identity().as_u8(), 0);
/// ```
#[derive(Debug)]
pub struct IdentityPool {
    slots: Mutex<Vec<bool>>,
}

impl IdentityPool {
    /// Create a pool handing out identities `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(vec![false; capacity]),
        })
    }

    /// Acquire the lowest free identity.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::IdentityExhausted` when every slot is held by
    /// a live lease. Exhaustion is an expected condition, not a defect.
    pub fn acquire(self: &Arc<Self>) -> Result<IdentityLease, DeviceError> {
        let mut slots = self.lock();
        match slots.iter().position(|taken| !taken) {
            Some(index) => {
                slots[index] = true;
                Ok(IdentityLease {
                    pool: Arc::clone(self),
                    identity: DeviceIdentity::new(index as u8),
                })
            }
            None => Err(DeviceError::IdentityExhausted { max: slots.len() }),
        }
    }

    /// Number of identities not currently leased.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.lock().iter().filter(|taken| !**taken).count()
    }

    /// Total number of identities in the range.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, identity: DeviceIdentity) {
        let mut slots = self.lock();
        let index = identity.as_u8() as usize;
        if let Some(slot) = slots.get_mut(index) {
            *slot = false;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<bool>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An acquired identity, released back to its pool on `Drop`.
#[derive(Debug)]
pub struct IdentityLease {
    pool: Arc<IdentityPool>,
    identity: DeviceIdentity,
}

impl IdentityLease {
    /// The leased identity.
    #[must_use]
    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }
}

impl Drop for IdentityLease {
    fn drop(&mut self) {
        self.pool.release(self.identity);
    }
}
