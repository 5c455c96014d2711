// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Radio link: the sub-GHz transceiver that replays the remote's frames.
//!
//! The [`RadioLink`] trait is the seam between the dispatcher and the
//! hardware. [`Cc1101`] implements it for a TI CC1101 attached over SPI;
//! tests substitute fakes.
//!
//! The on-air framing (fixed length, no CRC, no whitening) reproduces the
//! captured remote bit for bit. Preamble, sync word and bit rate are part of
//! the appliance's contract, not tunable defaults: see [`RadioConfig`].

mod cc1101;
mod config;
pub(crate) mod registers;

pub use cc1101::Cc1101;
pub use config::{Modulation, RadioConfig, RegisterImage, SyncMode};

use std::fmt;

use crate::error::RadioError;
use crate::types::RadioFrame;

/// Identity read from the transceiver during [`RadioLink::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipInfo {
    /// Content of the `PARTNUM` register.
    pub partnum: u8,
    /// Content of the `VERSION` register.
    pub version: u8,
}

/// Outcome of a single transmit attempt.
///
/// Transmissions are never retried; the result is reported to the caller and
/// logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransmissionResult {
    /// The frame left the air, or the frame was empty and nothing was sent.
    Success,
    /// The radio has not been initialized and configured.
    RadioNotReady,
    /// The hardware reported an error while sending.
    TransmitFailed,
}

impl TransmissionResult {
    /// Returns a short uppercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::RadioNotReady => "RADIO_NOT_READY",
            Self::TransmitFailed => "TRANSMIT_FAILED",
        }
    }
}

impl fmt::Display for TransmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transmit-only radio link.
///
/// Call order is `initialize`, then `configure`, then any number of
/// `transmit` calls. Implementations block for the duration of one frame.
pub trait RadioLink {
    /// Resets the transceiver and verifies its chip identity.
    ///
    /// # Errors
    ///
    /// Returns `RadioError::ChipNotFound` if no supported chip answers, or
    /// `RadioError::Bus` if the control bus fails.
    fn initialize(&mut self) -> Result<ChipInfo, RadioError>;

    /// Applies the modulation and framing configuration. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RadioError::NotInitialized` before a successful
    /// [`initialize`](RadioLink::initialize), `RadioError::InvalidConfig` if
    /// the configuration cannot be expressed, or `RadioError::Bus`.
    fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError>;

    /// Sends one frame and waits until it has left the air.
    ///
    /// An empty frame returns [`TransmissionResult::Success`] without
    /// touching the hardware.
    fn transmit(&mut self, frame: &RadioFrame) -> TransmissionResult;
}

impl<R: RadioLink + ?Sized> RadioLink for Box<R> {
    fn initialize(&mut self) -> Result<ChipInfo, RadioError> {
        (**self).initialize()
    }

    fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        (**self).configure(config)
    }

    fn transmit(&mut self, frame: &RadioFrame) -> TransmissionResult {
        (**self).transmit(frame)
    }
}
