//! Error types for device lifecycle and access-surface operations.

use usbrelay_transport::TransportError;

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur while attaching, detaching, or driving a board.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The instance is disconnected or not yet ready for callers.
    #[error("Device {node} is not available")]
    Unavailable { node: String },

    /// Every identity in the pool is held by a live instance. Attach fails
    /// cleanly; nothing is displaced.
    #[error("No free device identity (limit {max})")]
    IdentityExhausted { max: usize },

    /// The registry already publishes a node under this identity.
    #[error("Device node {node} is already published")]
    AlreadyPublished { node: String },

    /// No published node with this name.
    #[error("Unknown device node: {node}")]
    UnknownNode { node: String },

    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DeviceError {
    /// Create an unavailable error for a node.
    pub fn unavailable(node: impl Into<String>) -> Self {
        Self::Unavailable { node: node.into() }
    }

    /// Create an unknown-node error.
    pub fn unknown_node(node: impl Into<String>) -> Self {
        Self::UnknownNode { node: node.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let error = DeviceError::unavailable("usbrelay0");
        assert_eq!(error.to_string(), "Device usbrelay0 is not available");
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let error: DeviceError = TransportError::io("broken wire").into();
        assert_eq!(error.to_string(), "Transport I/O failed: broken wire");
    }
}
