//! Board, protocol, and transport constants.
//!
//! Values here describe the SainSmart-style 4-channel relay board and the
//! ASCII command protocol spoken on top of its single-byte mask ABI.
//! Changing the channel count or mask width changes the wire behavior of
//! every layer above, so they live in one place.

// ============================================================================
// Relay channels and mask
// ============================================================================

/// Number of relay channels on the board.
pub const NUM_CHANNELS: u8 = 4;

/// Lowest valid channel number (channels are 1-based on the faceplate).
pub const MIN_CHANNEL: u8 = 1;

/// Highest valid channel number.
pub const MAX_CHANNEL: u8 = NUM_CHANNELS;

/// Mask covering every channel bit: `0b0000_1111`.
///
/// Bits 4..7 of the state byte are unused and must stay zero through every
/// mutation.
pub const MASK_ALL: u8 = (1 << NUM_CHANNELS) - 1;

// ============================================================================
// Device identities
// ============================================================================

/// Maximum number of boards attached concurrently.
///
/// Identities are drawn from `0..MAX_DEVICES`; an attach beyond this count
/// fails with identity exhaustion rather than displacing a live board.
pub const MAX_DEVICES: usize = 4;

/// Prefix for published device node names (`usbrelay0`, `usbrelay1`, ...).
pub const DEVICE_NODE_PREFIX: &str = "usbrelay";

/// Node name of the first board, the default target for the CLI.
pub const DEFAULT_DEVICE_NODE: &str = "usbrelay0";

// ============================================================================
// Protocol identification
// ============================================================================

/// ASCII command protocol version reported by `version`.
pub const PROTOCOL_VERSION: &str = "1.1";

/// Tool name reported by `version` (`TOOL=relayctl/<version>`).
pub const TOOL_NAME: &str = "relayctl";

/// Longest accepted protocol input line, in bytes.
pub const MAX_LINE_LEN: usize = 128;

// ============================================================================
// Transport timing
// ============================================================================

/// Timeout applied to every USB control and bulk transfer (milliseconds).
///
/// A transfer that has not completed within this window fails with a
/// timeout error; the in-memory mask keeps the attempted value.
pub const TRANSFER_TIMEOUT_MS: u64 = 1000;
