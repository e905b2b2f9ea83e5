//! Byte-oriented access surface.
//!
//! A [`DeviceSession`] is what external callers hold: a binding to one
//! instance with file-like semantics over the single state byte. A session
//! carries a read position: the mask reads once per position, then reports
//! end-of-data until [`rewind`](MaskAccess::rewind), mirroring "one
//! logical value per open read position" from the byte ABI.
//!
//! The [`MaskAccess`] trait captures the capability set the protocol engine
//! needs, so the engine can be exercised against fakes without a device
//! manager in the loop.

#![allow(async_fn_in_trait)]

use std::sync::Arc;

use usbrelay_core::RelayMask;

use crate::error::Result;
use crate::instance::RelayDevice;

/// The access-surface contract consumed by the protocol engine.
pub trait MaskAccess: Send {
    /// Read the mask at the current position.
    ///
    /// Returns `Some(mask)` on the first read after open or rewind, then
    /// `None` (end-of-data) until the position is reset.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the instance is disconnected.
    async fn read_mask(&mut self) -> Result<Option<RelayMask>>;

    /// Apply a raw byte as the new mask.
    ///
    /// The byte is sanitized to the low 4 bits before it is stored, keeping
    /// the unused high bits zero no matter what the caller hands in.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the instance is disconnected,
    /// or the transport error if the push fails (in which case the
    /// in-memory mask keeps the attempted value).
    async fn write_mask(&mut self, byte: u8) -> Result<()>;

    /// Read-modify-write the mask under a single guard acquisition.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write_mask`](Self::write_mask).
    async fn modify_mask<F>(&mut self, apply: F) -> Result<RelayMask>
    where
        F: FnOnce(RelayMask) -> RelayMask + Send;

    /// Reset the read position so the next read yields the current mask.
    fn rewind(&mut self);
}

/// A caller's open session on one device instance.
///
/// Sessions are independent: each has its own read position, and any number
/// may be open against one instance. Mask operations from all of them are
/// serialized by the instance guard. Dropping (or [`close`](Self::close)-ing)
/// a session releases the binding and never touches relay state.
#[derive(Debug)]
pub struct DeviceSession {
    device: Arc<RelayDevice>,
    consumed: bool,
}

impl DeviceSession {
    pub(crate) fn new(device: Arc<RelayDevice>) -> Self {
        Self {
            device,
            consumed: false,
        }
    }

    /// Node name of the bound instance.
    #[must_use]
    pub fn node_name(&self) -> String {
        self.device.node_name()
    }

    /// Read into a byte buffer, file-style.
    ///
    /// Returns the number of bytes produced: 1 at a fresh position, 0 at
    /// end-of-data (or for an empty buffer).
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the instance is disconnected.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read_mask().await? {
            Some(mask) => {
                buf[0] = mask.value();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Write a byte buffer, file-style.
    ///
    /// A write of one or more bytes consumes exactly the first byte as the
    /// new mask and reports the whole buffer as consumed, matching the byte
    /// ABI contract. An empty write is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the instance is disconnected,
    /// or the transport error if the push fails.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let Some(&byte) = buf.first() else {
            return Ok(0);
        };
        self.write_mask(byte).await?;
        Ok(buf.len())
    }

    /// Release the session binding. Relay state is untouched.
    pub fn close(self) {}
}

impl MaskAccess for DeviceSession {
    async fn read_mask(&mut self) -> Result<Option<RelayMask>> {
        if self.consumed {
            return Ok(None);
        }
        let mask = self.device.current_mask().await?;
        self.consumed = true;
        Ok(Some(mask))
    }

    async fn write_mask(&mut self, byte: u8) -> Result<()> {
        self.device.write_mask(RelayMask::truncate(byte)).await
    }

    async fn modify_mask<F>(&mut self, apply: F) -> Result<RelayMask>
    where
        F: FnOnce(RelayMask) -> RelayMask + Send,
    {
        self.device.modify_mask(apply).await
    }

    fn rewind(&mut self) {
        self.consumed = false;
    }
}
