use thiserror::Error;

/// Validation errors for the core value types.
///
/// These are always caller errors: the input never reaches a device, and
/// retrying with the same input will fail the same way.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Channel must be {min}-{max}, got {value}", min = crate::constants::MIN_CHANNEL, max = crate::constants::MAX_CHANNEL)]
    InvalidChannel { value: String },

    #[error("Mask must be in range 0x00-0x{max:02X}, got {value}", max = crate::constants::MASK_ALL)]
    InvalidMask { value: String },

    #[error("State must be ON or OFF, got {value}")]
    InvalidState { value: String },

    #[error("Invalid device node name: {value}")]
    InvalidNode { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
