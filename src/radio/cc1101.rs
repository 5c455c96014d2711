// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TI CC1101 driver over `embedded-hal` SPI.
//!
//! Transmit-only: the FIFO is loaded with one fixed-length frame, `STX` is
//! strobed, and `MARCSTATE`/`TXBYTES` are polled until the chip falls back
//! to IDLE with an empty FIFO (`MCSM1.TXOFF_MODE = IDLE`).

use std::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use crate::error::RadioError;
use crate::radio::registers::{self as reg, marcstate};
use crate::radio::{ChipInfo, RadioConfig, RadioLink, TransmissionResult};
use crate::types::RadioFrame;

/// Default delay between two `MARCSTATE` polls.
const DEFAULT_POLL_INTERVAL_US: u32 = 500;

/// Default number of polls before a transmission is declared stuck.
///
/// 200 polls of 500 µs cover a 64-byte frame at 2.4 kBaud.
const DEFAULT_POLL_BUDGET: u32 = 200;

/// Time the crystal needs to settle after `SRES`.
const RESET_SETTLE_US: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Uninitialized,
    Initialized,
    Configured { packet_length: usize },
}

/// Why a transmission did not complete.
#[derive(Debug)]
enum TxFault {
    Bus(RadioError),
    FifoUnderflow,
    Timeout { polls: u32 },
}

impl fmt::Display for TxFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "{err}"),
            Self::FifoUnderflow => f.write_str("TX FIFO underflow"),
            Self::Timeout { polls } => write!(f, "still transmitting after {polls} polls"),
        }
    }
}

impl From<RadioError> for TxFault {
    fn from(err: RadioError) -> Self {
        Self::Bus(err)
    }
}

/// A CC1101 transceiver.
///
/// # Examples
///
/// ```ignore
/// use fireplace_bridge::radio::{Cc1101, RadioConfig, RadioLink};
/// use linux_embedded_hal::{Delay, SpidevDevice};
///
/// let spi = SpidevDevice::open("/dev/spidev0.0")?;
/// let mut radio = Cc1101::new(spi, Delay);
/// radio.initialize()?;
/// radio.configure(&RadioConfig::fireplace(12))?;
/// ```
#[derive(Debug)]
pub struct Cc1101<SPI, D> {
    spi: SPI,
    delay: D,
    state: LinkState,
    poll_interval_us: u32,
    poll_budget: u32,
}

impl<SPI, D> Cc1101<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Creates a driver; the chip is not touched until
    /// [`initialize`](RadioLink::initialize).
    #[must_use]
    pub fn new(spi: SPI, delay: D) -> Self {
        Self {
            spi,
            delay,
            state: LinkState::Uninitialized,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }

    /// Sets how often and how long the end of a transmission is polled for.
    #[must_use]
    pub fn with_polling(mut self, interval_us: u32, budget: u32) -> Self {
        self.poll_interval_us = interval_us;
        self.poll_budget = budget.max(1);
        self
    }

    /// Returns `true` once the radio has been configured.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LinkState::Configured { .. })
    }

    /// Releases the bus and delay provider.
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    fn strobe(&mut self, command: u8) -> Result<u8, RadioError> {
        let mut buf = [command];
        self.spi.transfer_in_place(&mut buf).map_err(bus_error)?;
        Ok(buf[0])
    }

    fn read_register(&mut self, address: u8) -> Result<u8, RadioError> {
        let mut buf = [address | reg::READ, 0];
        self.spi.transfer_in_place(&mut buf).map_err(bus_error)?;
        Ok(buf[1])
    }

    fn read_status(&mut self, address: u8) -> Result<u8, RadioError> {
        self.read_register(address | reg::BURST)
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), RadioError> {
        self.spi.write(&[address, value]).map_err(bus_error)
    }

    fn write_burst(&mut self, address: u8, data: &[u8]) -> Result<(), RadioError> {
        let mut buf = Vec::with_capacity(data.len() + 1);
        buf.push(address | reg::BURST);
        buf.extend_from_slice(data);
        self.spi.write(&buf).map_err(bus_error)
    }

    fn send(&mut self, frame: &RadioFrame) -> Result<(), TxFault> {
        self.strobe(reg::SIDLE)?;
        self.strobe(reg::SFTX)?;
        self.write_burst(reg::FIFO, frame.as_bytes())?;
        self.strobe(reg::STX)?;

        for _ in 0..self.poll_budget {
            let state = self.read_status(reg::MARCSTATE)? & marcstate::MASK;
            match state {
                marcstate::TXFIFO_UNDERFLOW => return Err(TxFault::FifoUnderflow),
                marcstate::IDLE => {
                    let pending = self.read_status(reg::TXBYTES)? & 0x7F;
                    if pending == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.delay.delay_us(self.poll_interval_us);
        }
        Err(TxFault::Timeout {
            polls: self.poll_budget,
        })
    }

    /// Returns the chip to IDLE with an empty TX FIFO after a failed send.
    fn recover(&mut self) {
        if let Err(e) = self
            .strobe(reg::SIDLE)
            .and_then(|_| self.strobe(reg::SFTX))
        {
            tracing::warn!(error = %e, "Failed to reset CC1101 after TX error");
        }
    }
}

impl<SPI, D> RadioLink for Cc1101<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    fn initialize(&mut self) -> Result<ChipInfo, RadioError> {
        self.state = LinkState::Uninitialized;
        self.strobe(reg::SRES)?;
        self.delay.delay_us(RESET_SETTLE_US);

        let partnum = self.read_status(reg::PARTNUM)?;
        let version = self.read_status(reg::VERSION)?;
        tracing::debug!(partnum, version, "Read CC1101 identity");

        if partnum != 0x00 || !reg::KNOWN_VERSIONS.contains(&version) {
            return Err(RadioError::ChipNotFound { partnum, version });
        }

        self.state = LinkState::Initialized;
        tracing::info!(version = format_args!("{version:#04x}"), "CC1101 found");
        Ok(ChipInfo { partnum, version })
    }

    fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        if self.state == LinkState::Uninitialized {
            return Err(RadioError::NotInitialized);
        }
        let image = config.register_image()?;

        self.strobe(reg::SIDLE)?;
        for &(address, value) in &image.registers {
            self.write_register(address, value)?;
        }
        self.write_burst(reg::PATABLE, &image.patable)?;

        let expected = image.get(reg::PKTLEN).unwrap_or_default();
        let readback = self.read_register(reg::PKTLEN)?;
        if readback != expected {
            return Err(RadioError::Bus(format!(
                "PKTLEN readback {readback} does not match {expected}"
            )));
        }

        self.state = LinkState::Configured {
            packet_length: config.packet_length,
        };
        tracing::info!(
            frequency_mhz = config.frequency_mhz,
            data_rate_kbaud = config.data_rate_kbaud,
            packet_length = config.packet_length,
            "CC1101 configured"
        );
        Ok(())
    }

    fn transmit(&mut self, frame: &RadioFrame) -> TransmissionResult {
        if frame.is_empty() {
            tracing::debug!("Empty frame, nothing sent");
            return TransmissionResult::Success;
        }
        let LinkState::Configured { packet_length } = self.state else {
            return TransmissionResult::RadioNotReady;
        };
        if frame.len() != packet_length {
            tracing::error!(
                len = frame.len(),
                packet_length,
                "Frame length does not match configured packet length"
            );
            return TransmissionResult::TransmitFailed;
        }

        match self.send(frame) {
            Ok(()) => TransmissionResult::Success,
            Err(fault) => {
                tracing::error!(%fault, "CC1101 transmission failed");
                self.recover();
                TransmissionResult::TransmitFailed
            }
        }
    }
}

fn bus_error<E: embedded_hal::spi::Error>(err: E) -> RadioError {
    RadioError::Bus(format!("{:?}", err.kind()))
}
