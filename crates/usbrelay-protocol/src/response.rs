//! Success responses and their wire rendering.

use std::fmt;

use usbrelay_core::constants::{PROTOCOL_VERSION, TOOL_NAME};
use usbrelay_core::{Channel, RelayMask, SwitchState};

/// Command summary shown by `help`.
///
/// Protocol-level only; option flags belong to whichever front end hosts
/// the protocol.
pub const HELP_TEXT: &str = "\
Commands:
  set <ch> <on|off>   Set channel <ch> (1-4) ON or OFF
  get <ch>            Report one channel: OK CH=<ch> STATE=<ON|OFF>
  getall              Report the full 4-bit mask: OK MASK=0xHH
  toggle <ch>         Flip one channel and report its new state
  write-mask 0xHH     Write the full mask (0x00-0x0F, bit 0 = CH1)
  read-mask           Report the current mask: OK MASK=0xHH
  reset               Turn all channels OFF (mask 0x00)
  ping                Check device availability; prints OK
  version             Print protocol and tool versions
  help                Print this text";

/// A successful command result, rendered as a single `OK ...` line
/// (`help` excepted, which is multi-line human text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One channel's (requested or observed) state.
    ChannelState { channel: Channel, state: SwitchState },

    /// The full mask.
    Mask(RelayMask),

    /// Bare acknowledgement.
    Empty,

    /// Protocol and tool version report.
    Version,

    /// Human-readable command summary.
    Help,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::ChannelState { channel, state } => {
                write!(f, "OK CH={channel} STATE={state}")
            }
            Response::Mask(mask) => write!(f, "OK MASK={mask}"),
            Response::Empty => write!(f, "OK"),
            Response::Version => write!(
                f,
                "OK VERSION={PROTOCOL_VERSION} TOOL={TOOL_NAME}/{}",
                usbrelay_core::VERSION
            ),
            Response::Help => f.write_str(HELP_TEXT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_state_line() {
        let response = Response::ChannelState {
            channel: Channel::new(1).unwrap(),
            state: SwitchState::On,
        };
        assert_eq!(response.to_string(), "OK CH=1 STATE=ON");
    }

    #[test]
    fn test_mask_line_is_zero_padded_hex() {
        assert_eq!(
            Response::Mask(RelayMask::new(0x04).unwrap()).to_string(),
            "OK MASK=0x04"
        );
        assert_eq!(Response::Mask(RelayMask::CLEAR).to_string(), "OK MASK=0x00");
    }

    #[test]
    fn test_version_line() {
        let line = Response::Version.to_string();
        assert!(line.starts_with("OK VERSION=1.1 TOOL=relayctl/"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = Response::Help.to_string();
        for verb in [
            "set", "get", "getall", "toggle", "write-mask", "read-mask", "reset", "ping",
            "version", "help",
        ] {
            assert!(help.contains(verb), "help text missing {verb}");
        }
    }
}
