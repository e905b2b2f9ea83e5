//! Transport trait definitions.
//!
//! These traits are the seam between the device lifecycle layer and the
//! physical USB bridge. The device layer never touches rusb directly; it
//! binds a transport through a [`RelayPort`] during attach and pushes state
//! bytes through the resulting [`RelayTransport`] for the rest of the
//! instance's life.

#![allow(async_fn_in_trait)]

use crate::error::Result;

/// A bound connection to one relay board.
///
/// Both operations block until the device confirms or the bounded transfer
/// timeout expires; neither hangs indefinitely. Implementations hold
/// exclusive ownership of the underlying connection; the device layer
/// guarantees a transport is only ever driven under its instance guard.
pub trait RelayTransport: Send {
    /// Put every channel pin into bit-bang output mode.
    ///
    /// Called exactly once, during device attach, before the first push.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the mode change, disappears
    /// mid-transfer, or the transfer times out.
    async fn configure_output_mode(&mut self) -> Result<()>;

    /// Push one state byte to the board.
    ///
    /// Succeeds only if the device confirms exactly one byte accepted;
    /// partial transmission is reported as an error, never as success.
    ///
    /// # Errors
    ///
    /// Returns an error on transfer failure, short write, or timeout. The
    /// caller's in-memory mask is not rolled back on failure; the mask
    /// keeps the attempted value and the error propagates.
    async fn push(&mut self, byte: u8) -> Result<()>;
}

/// A discovered but not yet bound relay board.
///
/// Binding performs the fallible claim work of attach: opening the device,
/// claiming its interface, and locating the bulk OUT endpoint. A port is
/// consumed by binding; on failure everything it touched is released before
/// the error returns.
pub trait RelayPort: Send {
    /// The transport produced by a successful bind.
    type Transport: RelayTransport;

    /// Bind the port, producing a ready-to-configure transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened or claimed, or if
    /// it exposes no bulk OUT endpoint.
    async fn bind(self) -> Result<Self::Transport>;
}
