//! Command grammar and parsing.
//!
//! One line of text in, one fully validated [`Command`] out. Validation
//! happens here and nowhere later: an out-of-range channel or mask never
//! reaches the engine, so dispatch can assume every command is well formed.

use std::str::FromStr;

use usbrelay_core::constants::MAX_LINE_LEN;
use usbrelay_core::{Channel, RelayMask, SwitchState};

use crate::error::{ErrorCode, ProtocolError};

/// A validated protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Force one channel on or off.
    Set { channel: Channel, state: SwitchState },

    /// Report one channel's state.
    Get { channel: Channel },

    /// Report the full mask.
    GetAll,

    /// Flip one channel and report its new state.
    Toggle { channel: Channel },

    /// Replace the full mask.
    WriteMask(RelayMask),

    /// Report the full mask.
    ReadMask,

    /// Turn every channel off.
    Reset,

    /// Probe device availability.
    Ping,

    /// Report protocol and tool versions. Touches no device.
    Version,

    /// Show the command summary. Touches no device.
    Help,
}

impl Command {
    /// Parse one protocol line.
    ///
    /// The verb matches case-insensitively; arguments are validated through
    /// the core value types, so their error codes (`BAD_CHANNEL`,
    /// `BAD_STATE`, `BAD_MASK`) carry through. Surplus arguments are a
    /// `BAD_COMMAND`, same as an unknown verb.
    ///
    /// # Errors
    ///
    /// Returns a `ProtocolError` with the appropriate code for empty input,
    /// overlong input, unknown verbs, wrong arity, or invalid arguments.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        if line.len() > MAX_LINE_LEN {
            return Err(ProtocolError::bad_command(format!(
                "Line exceeds {MAX_LINE_LEN} bytes"
            )));
        }

        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| ProtocolError::bad_command("Empty command"))?;

        let command = if verb.eq_ignore_ascii_case("set") {
            let channel = Self::parse_arg::<Channel>(&mut words, "set requires: set <ch> <on|off>")?;
            let state =
                Self::parse_arg::<SwitchState>(&mut words, "set requires: set <ch> <on|off>")?;
            Command::Set { channel, state }
        } else if verb.eq_ignore_ascii_case("get") {
            let channel = Self::parse_arg::<Channel>(&mut words, "get requires: get <ch>")?;
            Command::Get { channel }
        } else if verb.eq_ignore_ascii_case("getall") {
            Command::GetAll
        } else if verb.eq_ignore_ascii_case("toggle") {
            let channel = Self::parse_arg::<Channel>(&mut words, "toggle requires: toggle <ch>")?;
            Command::Toggle { channel }
        } else if verb.eq_ignore_ascii_case("write-mask") {
            let mask =
                Self::parse_arg::<RelayMask>(&mut words, "write-mask requires: write-mask 0xHH")?;
            Command::WriteMask(mask)
        } else if verb.eq_ignore_ascii_case("read-mask") {
            Command::ReadMask
        } else if verb.eq_ignore_ascii_case("reset") {
            Command::Reset
        } else if verb.eq_ignore_ascii_case("ping") {
            Command::Ping
        } else if verb.eq_ignore_ascii_case("version") {
            Command::Version
        } else if verb.eq_ignore_ascii_case("help") {
            Command::Help
        } else {
            return Err(ProtocolError::bad_command(format!(
                "Unknown command: {verb}"
            )));
        };

        if words.next().is_some() {
            return Err(ProtocolError::bad_command("Unexpected extra arguments"));
        }

        Ok(command)
    }

    fn parse_arg<'a, T>(
        words: &mut impl Iterator<Item = &'a str>,
        missing: &str,
    ) -> Result<T, ProtocolError>
    where
        T: FromStr<Err = usbrelay_core::Error>,
    {
        let word = words
            .next()
            .ok_or_else(|| ProtocolError::bad_command(missing))?;
        word.parse::<T>().map_err(ProtocolError::from)
    }

    /// Whether executing this command requires an open device session.
    #[must_use]
    pub fn needs_device(&self) -> bool {
        !matches!(self, Command::Version | Command::Help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn channel(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[rstest]
    #[case("set 1 on", Command::Set { channel: Channel::new(1).unwrap(), state: SwitchState::On })]
    #[case("SET 4 OFF", Command::Set { channel: Channel::new(4).unwrap(), state: SwitchState::Off })]
    #[case("get 2", Command::Get { channel: Channel::new(2).unwrap() })]
    #[case("getall", Command::GetAll)]
    #[case("toggle 3", Command::Toggle { channel: Channel::new(3).unwrap() })]
    #[case("write-mask 0x0A", Command::WriteMask(RelayMask::new(0x0A).unwrap()))]
    #[case("read-mask", Command::ReadMask)]
    #[case("reset", Command::Reset)]
    #[case("ping", Command::Ping)]
    #[case("version", Command::Version)]
    #[case("help", Command::Help)]
    fn test_parse_valid(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(line).unwrap(), expected);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let command = Command::parse("  set   2  on ").unwrap();
        assert_eq!(
            command,
            Command::Set {
                channel: channel(2),
                state: SwitchState::On
            }
        );
    }

    #[rstest]
    #[case("", ErrorCode::BadCommand)]
    #[case("frobnicate", ErrorCode::BadCommand)]
    #[case("set 1", ErrorCode::BadCommand)] // missing state
    #[case("get", ErrorCode::BadCommand)] // missing channel
    #[case("reset now", ErrorCode::BadCommand)] // extra argument
    #[case("set 5 on", ErrorCode::BadChannel)]
    #[case("get 0", ErrorCode::BadChannel)]
    #[case("toggle x", ErrorCode::BadChannel)]
    #[case("set 1 maybe", ErrorCode::BadState)]
    #[case("write-mask 0x10", ErrorCode::BadMask)]
    #[case("write-mask banana", ErrorCode::BadMask)]
    fn test_parse_invalid(#[case] line: &str, #[case] code: ErrorCode) {
        let error = Command::parse(line).unwrap_err();
        assert_eq!(error.code(), code, "line: {line:?}");
    }

    #[test]
    fn test_parse_rejects_overlong_lines() {
        let line = format!("set 1 {}", "x".repeat(MAX_LINE_LEN));
        let error = Command::parse(&line).unwrap_err();
        assert_eq!(error.code(), ErrorCode::BadCommand);
    }

    #[test]
    fn test_needs_device() {
        assert!(Command::parse("ping").unwrap().needs_device());
        assert!(Command::parse("reset").unwrap().needs_device());
        assert!(!Command::parse("version").unwrap().needs_device());
        assert!(!Command::parse("help").unwrap().needs_device());
    }
}
