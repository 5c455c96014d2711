// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transceiver configuration and its CC1101 register encoding.
//!
//! [`RadioConfig`] holds physical parameters in engineering units. It is set
//! once at startup and never mutated afterwards. [`RadioConfig::register_image`]
//! converts it into the register values written by the driver, choosing the
//! closest value the chip can express for each parameter.
//!
//! # Examples
//!
//! ```
//! use fireplace_bridge::catalog::CommandCatalog;
//! use fireplace_bridge::radio::RadioConfig;
//!
//! let catalog = CommandCatalog::builtin();
//! let config = RadioConfig::for_catalog(&catalog);
//! assert_eq!(config.packet_length, catalog.packet_length());
//!
//! let image = config.register_image().unwrap();
//! assert_eq!(image.frequency_word(), 0x10_B0_60);
//! ```

use crate::catalog::CommandCatalog;
use crate::error::RadioError;
use crate::radio::registers as reg;

/// Crystal frequency of common CC1101 modules.
pub const XOSC_HZ: f64 = 26_000_000.0;

/// Modulation format (`MDMCFG2.MOD_FORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// Binary frequency-shift keying.
    Fsk2,
    /// Gaussian-filtered FSK.
    Gfsk,
    /// Amplitude-shift / on-off keying.
    AskOok,
    /// Four-level FSK.
    Fsk4,
    /// Minimum-shift keying.
    Msk,
}

impl Modulation {
    const fn format_bits(self) -> u8 {
        match self {
            Self::Fsk2 => 0,
            Self::Gfsk => 1,
            Self::AskOok => 3,
            Self::Fsk4 => 4,
            Self::Msk => 7,
        }
    }
}

/// Sync word detection mode (`MDMCFG2.SYNC_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No preamble/sync detection.
    None,
    /// 15 of 16 sync word bits must match.
    Sync15Of16,
    /// All 16 sync word bits must match.
    Sync16Of16,
    /// 30 of 32 bits must match (sync word sent twice).
    Sync30Of32,
}

impl SyncMode {
    const fn mode_bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Sync15Of16 => 1,
            Self::Sync16Of16 => 2,
            Self::Sync30Of32 => 3,
        }
    }
}

/// Physical and framing parameters of the radio link.
///
/// CRC, data whitening, Manchester coding, FEC and address filtering are
/// always disabled: the frames are replayed exactly as captured.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioConfig {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f64,
    /// Modulation format.
    pub modulation: Modulation,
    /// Frequency deviation in kHz.
    pub deviation_khz: f64,
    /// Symbol rate in kBaud.
    pub data_rate_kbaud: f64,
    /// Receiver channel filter bandwidth in kHz.
    pub rx_bandwidth_khz: f64,
    /// Output power in dBm.
    pub output_power_dbm: i8,
    /// Preamble length in bits.
    pub preamble_bits: u16,
    /// Sync word.
    pub sync_word: u16,
    /// Sync word detection mode.
    pub sync_mode: SyncMode,
    /// Fixed packet length in bytes.
    pub packet_length: usize,
}

impl RadioConfig {
    /// Returns the fireplace remote's on-air parameters for a given packet
    /// length.
    #[must_use]
    pub fn fireplace(packet_length: usize) -> Self {
        Self {
            frequency_mhz: 433.913,
            modulation: Modulation::Fsk2,
            deviation_khz: 20.0,
            data_rate_kbaud: 20.0,
            rx_bandwidth_khz: 58.0,
            output_power_dbm: 10,
            preamble_bits: 64,
            sync_word: 0xA55A,
            sync_mode: SyncMode::Sync16Of16,
            packet_length,
        }
    }

    /// Returns the fireplace configuration sized to a catalog's frames.
    #[must_use]
    pub fn for_catalog(catalog: &CommandCatalog) -> Self {
        Self::fireplace(catalog.packet_length())
    }

    /// Encodes this configuration as CC1101 register values.
    ///
    /// # Errors
    ///
    /// Returns `RadioError::InvalidConfig` if a parameter is outside what
    /// the chip supports.
    pub fn register_image(&self) -> Result<RegisterImage, RadioError> {
        let packet_length = u8::try_from(self.packet_length)
            .ok()
            .filter(|len| (1..=reg::TX_FIFO_SIZE).contains(&usize::from(*len)))
            .ok_or_else(|| {
                RadioError::InvalidConfig(format!(
                    "packet length {} outside 1..={}",
                    self.packet_length,
                    reg::TX_FIFO_SIZE
                ))
            })?;

        let freq = frequency_word(self.frequency_mhz * 1e6)?;
        let (dev_e, dev_m) = deviation_exponent_mantissa(self.deviation_khz * 1e3)?;
        let (dr_e, dr_m) = data_rate_exponent_mantissa(self.data_rate_kbaud * 1e3)?;
        let (bw_e, bw_m) = rx_bandwidth_exponent_mantissa(self.rx_bandwidth_khz * 1e3)?;
        let preamble = preamble_code(self.preamble_bits)?;
        let power = pa_table_value(self.output_power_dbm);
        let [sync1, sync0] = self.sync_word.to_be_bytes();
        let [_, freq2, freq1, freq0] = freq.to_be_bytes();

        // ASK/OOK ramps between PATABLE[0] (off) and PATABLE[1] (on).
        let (frend0, patable) = match self.modulation {
            Modulation::AskOok => (0x11, vec![0x00, power]),
            _ => (0x10, vec![power]),
        };

        let registers = vec![
            (reg::IOCFG2, 0x29),
            // Asserts when the sync word is sent, deasserts at end of packet.
            (reg::IOCFG0, 0x06),
            (reg::FIFOTHR, 0x47),
            (reg::SYNC1, sync1),
            (reg::SYNC0, sync0),
            (reg::PKTLEN, packet_length),
            (reg::PKTCTRL1, 0x00),
            (reg::PKTCTRL0, 0x00),
            (reg::ADDR, 0x00),
            (reg::CHANNR, 0x00),
            (reg::FSCTRL1, 0x06),
            (reg::FSCTRL0, 0x00),
            (reg::FREQ2, freq2),
            (reg::FREQ1, freq1),
            (reg::FREQ0, freq0),
            (reg::MDMCFG4, (bw_e << 6) | (bw_m << 4) | dr_e),
            (reg::MDMCFG3, dr_m),
            (
                reg::MDMCFG2,
                (self.modulation.format_bits() << 4) | self.sync_mode.mode_bits(),
            ),
            (reg::MDMCFG1, (preamble << 4) | 0x02),
            (reg::MDMCFG0, 0xF8),
            (reg::DEVIATN, (dev_e << 4) | dev_m),
            (reg::MCSM1, 0x30),
            (reg::MCSM0, 0x18),
            (reg::FOCCFG, 0x16),
            (reg::BSCFG, 0x6C),
            (reg::AGCCTRL2, 0x43),
            (reg::AGCCTRL1, 0x40),
            (reg::AGCCTRL0, 0x91),
            (reg::FREND1, 0x56),
            (reg::FREND0, frend0),
            (reg::FSCAL3, 0xE9),
            (reg::FSCAL2, 0x2A),
            (reg::FSCAL1, 0x00),
            (reg::FSCAL0, 0x1F),
            (reg::TEST2, 0x81),
            (reg::TEST1, 0x35),
            (reg::TEST0, 0x09),
        ];

        Ok(RegisterImage {
            registers,
            patable,
        })
    }
}

/// Register values produced by [`RadioConfig::register_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterImage {
    /// `(address, value)` pairs for the configuration registers.
    pub registers: Vec<(u8, u8)>,
    /// PATABLE contents, starting at index 0.
    pub patable: Vec<u8>,
}

impl RegisterImage {
    /// Returns the value of one configuration register, if present.
    #[must_use]
    pub fn get(&self, address: u8) -> Option<u8> {
        self.registers
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, v)| *v)
    }

    /// Returns the 24-bit `FREQ2:FREQ1:FREQ0` word.
    #[must_use]
    pub fn frequency_word(&self) -> u32 {
        let byte = |address| u32::from(self.get(address).unwrap_or(0));
        (byte(reg::FREQ2) << 16) | (byte(reg::FREQ1) << 8) | byte(reg::FREQ0)
    }
}

fn invalid(message: String) -> RadioError {
    RadioError::InvalidConfig(message)
}

/// `FREQ = f_carrier * 2^16 / f_xosc`, restricted to the chip's bands.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn frequency_word(hz: f64) -> Result<u32, RadioError> {
    const BANDS_MHZ: [(f64, f64); 3] = [(300.0, 348.0), (387.0, 464.0), (779.0, 928.0)];
    let mhz = hz / 1e6;
    if !BANDS_MHZ.iter().any(|(lo, hi)| (*lo..=*hi).contains(&mhz)) {
        return Err(invalid(format!("carrier {mhz} MHz outside supported bands")));
    }
    Ok((hz * 65_536.0 / XOSC_HZ).round() as u32)
}

/// `f_dev = f_xosc / 2^17 * (8 + M) * 2^E`, nearest E in 0..=7, M in 0..=7.
fn deviation_exponent_mantissa(hz: f64) -> Result<(u8, u8), RadioError> {
    if !(1_500.0..=381_000.0).contains(&hz) {
        return Err(invalid(format!("deviation {hz} Hz out of range")));
    }
    Ok(nearest(0..8, 0..8, hz, |e, m| {
        XOSC_HZ / f64::from(1u32 << 17) * f64::from(8 + m) * f64::from(1u32 << e)
    }))
}

/// `R = (256 + M) * 2^E * f_xosc / 2^28`, nearest E in 0..=15, M in 0..=255.
fn data_rate_exponent_mantissa(baud: f64) -> Result<(u8, u8), RadioError> {
    if !(600.0..=500_000.0).contains(&baud) {
        return Err(invalid(format!("data rate {baud} Bd out of range")));
    }
    Ok(nearest(0..16, 0..=255, baud, |e, m| {
        f64::from(256 + u32::from(m)) * f64::from(1u32 << e) * XOSC_HZ / f64::from(1u32 << 28)
    }))
}

/// `BW = f_xosc / (8 * (4 + M) * 2^E)`, the narrowest filter not below the
/// requested bandwidth.
fn rx_bandwidth_exponent_mantissa(hz: f64) -> Result<(u8, u8), RadioError> {
    let bandwidth = |e: u8, m: u8| XOSC_HZ / (8.0 * f64::from(4 + m) * f64::from(1u32 << e));
    (0..4u8)
        .flat_map(|e| (0..4u8).map(move |m| (e, m)))
        .filter(|(e, m)| bandwidth(*e, *m) >= hz)
        .min_by(|a, b| bandwidth(a.0, a.1).total_cmp(&bandwidth(b.0, b.1)))
        .ok_or_else(|| invalid(format!("RX bandwidth {hz} Hz too wide")))
}

/// `MDMCFG1.NUM_PREAMBLE` for the shortest preamble covering `bits`.
fn preamble_code(bits: u16) -> Result<u8, RadioError> {
    const PREAMBLE_BYTES: [u16; 8] = [2, 3, 4, 6, 8, 12, 16, 24];
    let bytes = bits.div_ceil(8);
    PREAMBLE_BYTES
        .iter()
        .position(|n| *n >= bytes)
        .and_then(|code| u8::try_from(code).ok())
        .ok_or_else(|| invalid(format!("preamble of {bits} bits too long")))
}

/// PATABLE setting for 433 MHz: the strongest entry not above `dbm`.
fn pa_table_value(dbm: i8) -> u8 {
    const PA_TABLE_433: [(i8, u8); 8] = [
        (-30, 0x12),
        (-20, 0x0E),
        (-15, 0x1D),
        (-10, 0x34),
        (0, 0x60),
        (5, 0x84),
        (7, 0xC8),
        (10, 0xC0),
    ];
    PA_TABLE_433
        .iter()
        .rev()
        .find(|(level, _)| *level <= dbm)
        .map_or(PA_TABLE_433[0].1, |(_, value)| *value)
}

/// Searches an exponent/mantissa grid for the value closest to `target`.
fn nearest(
    exponents: impl Iterator<Item = u8> + Clone,
    mantissas: impl Iterator<Item = u8> + Clone,
    target: f64,
    value: impl Fn(u8, u8) -> f64,
) -> (u8, u8) {
    let mut best = (0, 0);
    let mut best_error = f64::INFINITY;
    for e in exponents {
        for m in mantissas.clone() {
            let error = (value(e, m) - target).abs();
            if error < best_error {
                best = (e, m);
                best_error = error;
            }
        }
    }
    best
}
