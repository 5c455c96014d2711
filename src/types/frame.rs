// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw radio frames.

use std::fmt;
use std::sync::Arc;

/// The exact on-air payload of one button press.
///
/// Frames are captured from the original remote and carry its device and
/// button identifier bits. An empty frame means the command has no RF
/// equivalent and only updates bookkeeping.
///
/// Cloning is cheap; the bytes are shared.
///
/// # Examples
///
/// ```
/// use fireplace_bridge::types::RadioFrame;
///
/// let frame = RadioFrame::from_hex("a55a0f").unwrap();
/// assert_eq!(frame.as_bytes(), &[0xA5, 0x5A, 0x0F]);
/// assert_eq!(frame.len(), 3);
/// assert!(RadioFrame::empty().is_empty());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RadioFrame(Arc<[u8]>);

impl RadioFrame {
    /// Creates a frame from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Creates a zero-length frame.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a frame from a hex string.
    ///
    /// Whitespace, `_` and `:` separators and an optional `0x` prefix are
    /// accepted. An empty string yields an empty frame.
    ///
    /// # Errors
    ///
    /// Returns `hex::FromHexError` if the string is not valid hex.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let trimmed = s.trim();
        let digits: String = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed)
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != ':')
            .collect();
        hex::decode(digits).map(Self::new)
    }

    /// Returns the frame bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the frame length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the frame has no RF equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the frame as a lowercase hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for RadioFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RadioFrame({})", self.to_hex())
    }
}

impl From<&[u8]> for RadioFrame {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<Vec<u8>> for RadioFrame {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_accepts_separators_and_prefix() {
        let frame = RadioFrame::from_hex("0xA5 5A:0f_10").unwrap();
        assert_eq!(frame.as_bytes(), &[0xA5, 0x5A, 0x0F, 0x10]);
    }

    #[test]
    fn from_hex_empty_is_empty_frame() {
        assert!(RadioFrame::from_hex("").unwrap().is_empty());
        assert!(RadioFrame::from_hex("   ").unwrap().is_empty());
    }

    #[test]
    fn from_hex_rejects_odd_length_and_bad_digits() {
        assert!(RadioFrame::from_hex("abc").is_err());
        assert!(RadioFrame::from_hex("zz").is_err());
    }

    #[test]
    fn debug_shows_hex() {
        let frame = RadioFrame::from(vec![0xDE, 0xAD]);
        assert_eq!(format!("{frame:?}"), "RadioFrame(dead)");
    }
}
