// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command catalog: the immutable mapping from buttons to radio frames.
//!
//! The catalog decouples dispatch logic from the RF bit layout. It is built
//! once at startup, validated, and never mutated afterwards. The transceiver
//! runs in fixed packet length mode, so every non-empty frame must have the
//! same length; that length becomes the configured packet length.
//!
//! # Examples
//!
//! ```
//! use fireplace_bridge::catalog::CommandCatalog;
//! use fireplace_bridge::types::CommandName;
//!
//! let catalog = CommandCatalog::builtin();
//! assert!(catalog.frame_for(CommandName::PowerOff).is_empty());
//! assert_eq!(catalog.frame_for(CommandName::Flame).len(), catalog.packet_length());
//! ```

use crate::error::ValueError;
use crate::types::{CommandName, RadioFrame};

/// Largest frame the transceiver can send without refilling its TX FIFO.
pub const MAX_FRAME_LEN: usize = 64;

/// Device identifier baked into the default frames.
const DEFAULT_REMOTE_ID: [u8; 3] = [0x2C, 0x91, 0x5E];

/// Lead-in byte preceding each repetition of the button word.
const FRAME_LEAD: u8 = 0x8E;

/// Builds a default frame: the button word `lead, id, code, !code` sent twice.
const fn default_press(code: u8) -> [u8; 12] {
    let [a, b, c] = DEFAULT_REMOTE_ID;
    [
        FRAME_LEAD, a, b, c, code, !code, FRAME_LEAD, a, b, c, code, !code,
    ]
}

/// Immutable mapping from every [`CommandName`] to its [`RadioFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    frames: [RadioFrame; CommandName::ALL.len()],
    packet_length: usize,
}

impl CommandCatalog {
    /// Builds a catalog from one frame per command.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if a command is missing or repeated, if non-empty
    /// frames disagree on length, if a frame exceeds [`MAX_FRAME_LEN`], or if
    /// every frame is empty.
    pub fn new(
        entries: impl IntoIterator<Item = (CommandName, RadioFrame)>,
    ) -> Result<Self, ValueError> {
        let mut slots: [Option<RadioFrame>; CommandName::ALL.len()] = Default::default();
        for (command, frame) in entries {
            let slot = &mut slots[command.index()];
            if slot.is_some() {
                return Err(ValueError::DuplicateFrame(command.to_string()));
            }
            *slot = Some(frame);
        }

        let mut frames: [RadioFrame; CommandName::ALL.len()] = Default::default();
        for (command, slot) in CommandName::ALL.into_iter().zip(slots) {
            frames[command.index()] =
                slot.ok_or_else(|| ValueError::MissingFrame(command.to_string()))?;
        }

        let packet_length = validate(&frames)?;
        Ok(Self {
            frames,
            packet_length,
        })
    }

    /// Returns the default catalog.
    ///
    /// The power button only switches the fireplace on; OFF has no RF
    /// equivalent and is a state-only update. Frames of a different remote
    /// can be supplied through [`CommandCatalog::with_overrides`].
    #[must_use]
    pub fn builtin() -> Self {
        let frames = [
            RadioFrame::from(&default_press(0x01)[..]),
            RadioFrame::empty(),
            RadioFrame::from(&default_press(0x04)[..]),
            RadioFrame::from(&default_press(0x08)[..]),
            RadioFrame::from(&default_press(0x10)[..]),
            RadioFrame::from(&default_press(0x20)[..]),
            RadioFrame::from(&default_press(0x40)[..]),
            RadioFrame::from(&default_press(0x80)[..]),
        ];
        Self {
            frames,
            packet_length: 12,
        }
    }

    /// Returns a copy of this catalog with some frames replaced.
    ///
    /// Keys are command tokens (case-insensitive), values are hex strings as
    /// accepted by [`RadioFrame::from_hex`].
    ///
    /// # Errors
    ///
    /// Returns `ValueError` for unknown command tokens, two tokens naming
    /// the same command, invalid hex, or a resulting catalog that fails
    /// validation.
    pub fn with_overrides<K, V>(
        &self,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ValueError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut frames = self.frames.clone();
        let mut overridden = [false; CommandName::ALL.len()];
        for (token, hex) in overrides {
            let command: CommandName = token.as_ref().parse()?;
            if std::mem::replace(&mut overridden[command.index()], true) {
                return Err(ValueError::DuplicateFrame(command.to_string()));
            }
            let frame = RadioFrame::from_hex(hex.as_ref()).map_err(|e| ValueError::InvalidHex {
                command: command.to_string(),
                message: e.to_string(),
            })?;
            frames[command.index()] = frame;
        }
        let packet_length = validate(&frames)?;
        Ok(Self {
            frames,
            packet_length,
        })
    }

    /// Returns the frame for a command.
    #[must_use]
    pub fn frame_for(&self, command: CommandName) -> &RadioFrame {
        &self.frames[command.index()]
    }

    /// Returns the fixed packet length: the length of every non-empty frame.
    #[must_use]
    pub fn packet_length(&self) -> usize {
        self.packet_length
    }

    /// Iterates over `(command, frame)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (CommandName, &RadioFrame)> {
        CommandName::ALL.into_iter().zip(self.frames.iter())
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Checks the fixed-length invariant and returns the packet length.
fn validate(frames: &[RadioFrame; CommandName::ALL.len()]) -> Result<usize, ValueError> {
    let mut packet_length = None;
    for (command, frame) in CommandName::ALL.into_iter().zip(frames) {
        if frame.is_empty() {
            continue;
        }
        if frame.len() > MAX_FRAME_LEN {
            return Err(ValueError::FrameTooLong {
                command: command.to_string(),
                max: MAX_FRAME_LEN,
                actual: frame.len(),
            });
        }
        match packet_length {
            None => packet_length = Some(frame.len()),
            Some(expected) if expected != frame.len() => {
                return Err(ValueError::FrameLengthMismatch {
                    command: command.to_string(),
                    expected,
                    actual: frame.len(),
                });
            }
            Some(_) => {}
        }
    }
    packet_length.ok_or(ValueError::EmptyCatalog)
}
