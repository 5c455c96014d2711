// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The remote-control command vocabulary.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;
use crate::types::PowerState;

/// One button of the physical remote.
///
/// The set is closed: every value has exactly one frame in the
/// [`CommandCatalog`](crate::catalog::CommandCatalog). Parsing accepts the
/// wire tokens `ON OFF FLAME SOUND LEFT RIGHT PLUS MINUS`, ignoring case and
/// surrounding whitespace.
///
/// # Examples
///
/// ```
/// use fireplace_bridge::types::CommandName;
///
/// let cmd: CommandName = " on ".parse().unwrap();
/// assert_eq!(cmd, CommandName::PowerOn);
/// assert_eq!(cmd.as_str(), "ON");
///
/// assert!("garbage".parse::<CommandName>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandName {
    /// Power button, switching on.
    PowerOn,
    /// Power button, switching off.
    PowerOff,
    /// Flame effect button.
    Flame,
    /// Sound button.
    Sound,
    /// Left arrow button.
    Left,
    /// Right arrow button.
    Right,
    /// Plus button.
    Plus,
    /// Minus button.
    Minus,
}

impl CommandName {
    /// Every command, in catalog order.
    pub const ALL: [Self; 8] = [
        Self::PowerOn,
        Self::PowerOff,
        Self::Flame,
        Self::Sound,
        Self::Left,
        Self::Right,
        Self::Plus,
        Self::Minus,
    ];

    /// Returns the wire token for this command.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOn => "ON",
            Self::PowerOff => "OFF",
            Self::Flame => "FLAME",
            Self::Sound => "SOUND",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
        }
    }

    /// Returns the lowercase HTTP path segment for this command.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::PowerOn => "on",
            Self::PowerOff => "off",
            Self::Flame => "flame",
            Self::Sound => "sound",
            Self::Left => "left",
            Self::Right => "right",
            Self::Plus => "plus",
            Self::Minus => "minus",
        }
    }

    /// Returns the power state this command sets, if it is a power command.
    #[must_use]
    pub const fn power_state(&self) -> Option<PowerState> {
        match self {
            Self::PowerOn => Some(PowerState::On),
            Self::PowerOff => Some(PowerState::Off),
            _ => None,
        }
    }

    /// Returns `true` for `PowerOn` and `PowerOff`.
    #[must_use]
    pub const fn is_power(&self) -> bool {
        self.power_state().is_some()
    }

    /// Position of this command in [`CommandName::ALL`].
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ValueError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_trimmed_and_case_insensitive() {
        for raw in ["ON", "On", "on", " on ", "\tON\n"] {
            assert_eq!(raw.parse::<CommandName>().unwrap(), CommandName::PowerOn);
        }
        assert_eq!("minus".parse::<CommandName>().unwrap(), CommandName::Minus);
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        for raw in ["", "garbage", "O N", "TOGGLE", "FLAMES", "1", "true", "0"] {
            let err = raw.parse::<CommandName>().unwrap_err();
            assert_eq!(err, ValueError::UnknownCommand(raw.to_string()));
        }
    }

    #[test]
    fn every_command_parses_from_its_token_and_path() {
        for cmd in CommandName::ALL {
            assert_eq!(cmd.as_str().parse::<CommandName>().unwrap(), cmd);
            assert_eq!(cmd.path().parse::<CommandName>().unwrap(), cmd);
        }
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, cmd) in CommandName::ALL.into_iter().enumerate() {
            assert_eq!(cmd.index(), i);
        }
    }

    #[test]
    fn only_power_commands_carry_a_state() {
        assert_eq!(CommandName::PowerOn.power_state(), Some(PowerState::On));
        assert_eq!(CommandName::PowerOff.power_state(), Some(PowerState::Off));
        assert!(
            CommandName::ALL[2..]
                .iter()
                .all(|cmd| !cmd.is_power())
        );
    }
}
