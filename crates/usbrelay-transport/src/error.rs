//! Error types for transport operations.

use usbrelay_core::constants::TRANSFER_TIMEOUT_MS;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while binding to or driving the USB bridge.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No matching hardware on the bus.
    #[error("No relay hardware found ({vid:04x}:{pid:04x})")]
    NotFound { vid: u16, pid: u16 },

    /// The claimed interface exposes no bulk OUT endpoint to push through.
    #[error("No bulk OUT endpoint on the claimed interface")]
    NoBulkOutEndpoint,

    /// Bit-bang mode configuration was rejected by the device.
    #[error("Mode configuration failed: {message}")]
    Configuration { message: String },

    /// A transfer did not complete within the bounded timeout.
    #[error("Transfer timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The device accepted fewer bytes than required. Partial transmission
    /// is a hard failure; the state byte is all-or-nothing.
    #[error("Short write: device accepted {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Generic transport I/O failure.
    #[error("Transport I/O failed: {message}")]
    Io { message: String },

    /// Underlying USB stack error.
    #[error("USB error: {0}")]
    Usb(String),
}

impl TransportError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a generic I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

impl From<rusb::Error> for TransportError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => TransportError::Timeout {
                duration_ms: TRANSFER_TIMEOUT_MS,
            },
            other => TransportError::Usb(other.to_string()),
        }
    }
}
