//! Protocol error codes and wire rendering.

use usbrelay_device::DeviceError;

/// Machine-readable error code carried on every `ERR` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadCommand,
    BadChannel,
    BadState,
    BadMask,
    DeviceUnavailable,
    InternalError,
}

impl ErrorCode {
    /// The wire spelling of the code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadCommand => "BAD_COMMAND",
            Self::BadChannel => "BAD_CHANNEL",
            Self::BadState => "BAD_STATE",
            Self::BadMask => "BAD_MASK",
            Self::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol-level failure, rendered as a single `ERR <CODE> <message>`
/// line.
///
/// Validation failures (`BAD_*`) never reach a device; `DEVICE_UNAVAILABLE`
/// wraps every access-surface failure without masking it into anything
/// softer; `INTERNAL_ERROR` marks invariant violations so tests and callers
/// can tell defects from user errors.
#[derive(Debug, thiserror::Error)]
#[error("ERR {code} {message}")]
pub struct ProtocolError {
    code: ErrorCode,
    message: String,
}

impl ProtocolError {
    /// Create an error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a `BAD_COMMAND` error.
    pub fn bad_command(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadCommand, message)
    }

    /// Create a `DEVICE_UNAVAILABLE` error.
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeviceUnavailable, message)
    }

    /// Create an `INTERNAL_ERROR` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error's code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human-readable message (without the `ERR <CODE>` prefix).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Validation errors from the core value types keep their message and gain
/// the matching protocol code.
impl From<usbrelay_core::Error> for ProtocolError {
    fn from(err: usbrelay_core::Error) -> Self {
        let code = match err {
            usbrelay_core::Error::InvalidChannel { .. } => ErrorCode::BadChannel,
            usbrelay_core::Error::InvalidMask { .. } => ErrorCode::BadMask,
            usbrelay_core::Error::InvalidState { .. } => ErrorCode::BadState,
            usbrelay_core::Error::InvalidNode { .. } => ErrorCode::BadCommand,
        };
        Self::new(code, err.to_string())
    }
}

/// Every access-surface failure maps to `DEVICE_UNAVAILABLE`; the engine
/// never downgrades or masks one.
impl From<DeviceError> for ProtocolError {
    fn from(err: DeviceError) -> Self {
        Self::device_unavailable(err.to_string())
    }
}
