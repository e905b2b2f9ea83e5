use crate::{
    Result,
    constants::{DEVICE_NODE_PREFIX, MASK_ALL, MAX_CHANNEL, MIN_CHANNEL},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay channel number (1-based, as printed on the board faceplate).
///
/// Channel *n* drives bit `n - 1` of the state byte: channel 1 is the least
/// significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel(u8);

impl Channel {
    /// Create a channel with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidChannel` if the number is outside `1..=4`.
    pub fn new(channel: u8) -> Result<Self> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(Error::InvalidChannel {
                value: channel.to_string(),
            });
        }
        Ok(Channel(channel))
    }

    /// Get the channel number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// The mask bit this channel occupies (`1 << (n - 1)`).
    #[must_use]
    pub fn bit(&self) -> u8 {
        1 << (self.0 - 1)
    }

    /// Iterate over every channel on the board, lowest first.
    pub fn all() -> impl Iterator<Item = Channel> {
        (MIN_CHANNEL..=MAX_CHANNEL).map(Channel)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let channel: u8 = s.parse().map_err(|_| Error::InvalidChannel {
            value: s.to_string(),
        })?;
        Channel::new(channel)
    }
}

/// Desired or reported state of a single relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchState {
    Off,
    On,
}

impl SwitchState {
    /// Convert a mask bit test into a state.
    #[inline]
    #[must_use]
    pub fn from_bool(on: bool) -> Self {
        if on { SwitchState::On } else { SwitchState::Off }
    }

    /// Returns `true` for `On`.
    #[inline]
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, SwitchState::On)
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SwitchState::On => write!(f, "ON"),
            SwitchState::Off => write!(f, "OFF"),
        }
    }
}

impl std::str::FromStr for SwitchState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("on") {
            Ok(SwitchState::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(SwitchState::Off)
        } else {
            Err(Error::InvalidState {
                value: s.to_string(),
            })
        }
    }
}

/// The 4-bit relay state mask.
///
/// One bit per channel, channel 1 in bit 0. Bits 4..7 are unused and a
/// `RelayMask` can never carry them: `new` rejects them and `truncate`
/// drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMask(u8);

impl RelayMask {
    /// The all-off mask.
    pub const CLEAR: RelayMask = RelayMask(0);

    /// Create a mask with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidMask` if any bit above bit 3 is set.
    pub fn new(mask: u8) -> Result<Self> {
        if mask & !MASK_ALL != 0 {
            return Err(Error::InvalidMask {
                value: format!("0x{mask:02X}"),
            });
        }
        Ok(RelayMask(mask))
    }

    /// Sanitize a raw byte into a mask by dropping the unused high bits.
    #[must_use]
    pub fn truncate(byte: u8) -> Self {
        RelayMask(byte & MASK_ALL)
    }

    /// Get the mask byte.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Test whether a channel's bit is set.
    #[must_use]
    pub fn contains(&self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// State of one channel under this mask.
    #[must_use]
    pub fn state_of(&self, channel: Channel) -> SwitchState {
        SwitchState::from_bool(self.contains(channel))
    }

    /// Mask with the channel's bit set.
    #[must_use]
    pub fn set(&self, channel: Channel) -> Self {
        RelayMask(self.0 | channel.bit())
    }

    /// Mask with the channel's bit cleared.
    #[must_use]
    pub fn clear(&self, channel: Channel) -> Self {
        RelayMask(self.0 & !channel.bit())
    }

    /// Mask with the channel's bit flipped.
    #[must_use]
    pub fn toggle(&self, channel: Channel) -> Self {
        RelayMask(self.0 ^ channel.bit())
    }

    /// Mask with one channel forced to the given state.
    #[must_use]
    pub fn with(&self, channel: Channel, state: SwitchState) -> Self {
        match state {
            SwitchState::On => self.set(channel),
            SwitchState::Off => self.clear(channel),
        }
    }
}

impl fmt::Display for RelayMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl std::str::FromStr for RelayMask {
    type Err = Error;

    /// Parse a mask argument: `0xHH` hex or plain decimal.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidMask {
            value: s.to_string(),
        };

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u8::from_str_radix(hex, 16).map_err(|_| invalid())?
        } else {
            s.parse::<u8>().map_err(|_| invalid())?
        };

        RelayMask::new(value).map_err(|_| invalid())
    }
}

/// Identity of one attached board, unique among live device instances.
///
/// Identities are small integers handed out by the identity pool; the
/// identity also names the board's published node (`usbrelay<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIdentity(u8);

impl DeviceIdentity {
    /// Wrap a pool-allocated identity number.
    #[must_use]
    pub fn new(id: u8) -> Self {
        DeviceIdentity(id)
    }

    /// Get the raw identity number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// The published node name for this identity (`usbrelay<n>`).
    #[must_use]
    pub fn node_name(&self) -> String {
        format!("{DEVICE_NODE_PREFIX}{}", self.0)
    }

    /// Parse an identity back out of a node name.
    ///
    /// # Errors
    /// Returns `Error::InvalidNode` if the name does not have the
    /// `usbrelay<n>` shape. Whether the identity is currently published is
    /// the registry's concern, not the parser's.
    pub fn from_node_name(name: &str) -> Result<Self> {
        let digits = name
            .strip_prefix(DEVICE_NODE_PREFIX)
            .ok_or_else(|| Error::InvalidNode {
                value: name.to_string(),
            })?;
        let id: u8 = digits.parse().map_err(|_| Error::InvalidNode {
            value: name.to_string(),
        })?;
        Ok(DeviceIdentity(id))
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.node_name())
    }
}
