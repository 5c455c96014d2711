// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CC1101 register map (datasheet SWRS061, section 29).

/// SPI header bit: read access.
pub const READ: u8 = 0x80;
/// SPI header bit: burst access.
pub const BURST: u8 = 0x40;

// Configuration registers.
pub const IOCFG2: u8 = 0x00;
pub const IOCFG0: u8 = 0x02;
pub const FIFOTHR: u8 = 0x03;
pub const SYNC1: u8 = 0x04;
pub const SYNC0: u8 = 0x05;
pub const PKTLEN: u8 = 0x06;
pub const PKTCTRL1: u8 = 0x07;
pub const PKTCTRL0: u8 = 0x08;
pub const ADDR: u8 = 0x09;
pub const CHANNR: u8 = 0x0A;
pub const FSCTRL1: u8 = 0x0B;
pub const FSCTRL0: u8 = 0x0C;
pub const FREQ2: u8 = 0x0D;
pub const FREQ1: u8 = 0x0E;
pub const FREQ0: u8 = 0x0F;
pub const MDMCFG4: u8 = 0x10;
pub const MDMCFG3: u8 = 0x11;
pub const MDMCFG2: u8 = 0x12;
pub const MDMCFG1: u8 = 0x13;
pub const MDMCFG0: u8 = 0x14;
pub const DEVIATN: u8 = 0x15;
pub const MCSM1: u8 = 0x17;
pub const MCSM0: u8 = 0x18;
pub const FOCCFG: u8 = 0x19;
pub const BSCFG: u8 = 0x1A;
pub const AGCCTRL2: u8 = 0x1B;
pub const AGCCTRL1: u8 = 0x1C;
pub const AGCCTRL0: u8 = 0x1D;
pub const FREND1: u8 = 0x21;
pub const FREND0: u8 = 0x22;
pub const FSCAL3: u8 = 0x23;
pub const FSCAL2: u8 = 0x24;
pub const FSCAL1: u8 = 0x25;
pub const FSCAL0: u8 = 0x26;
pub const TEST2: u8 = 0x2C;
pub const TEST1: u8 = 0x2D;
pub const TEST0: u8 = 0x2E;

// Command strobes.
pub const SRES: u8 = 0x30;
pub const STX: u8 = 0x35;
pub const SIDLE: u8 = 0x36;
pub const SFTX: u8 = 0x3B;

// Status registers, read with READ | BURST.
pub const PARTNUM: u8 = 0x30;
pub const VERSION: u8 = 0x31;
pub const MARCSTATE: u8 = 0x35;
pub const TXBYTES: u8 = 0x3A;

// Multi-byte access.
pub const PATABLE: u8 = 0x3E;
pub const FIFO: u8 = 0x3F;

/// `MARCSTATE` values the driver cares about.
pub mod marcstate {
    pub const IDLE: u8 = 0x01;
    #[cfg(test)]
    pub const TX: u8 = 0x13;
    pub const TXFIFO_UNDERFLOW: u8 = 0x16;
    /// Bits [4:0] hold the state.
    pub const MASK: u8 = 0x1F;
}

/// `VERSION` values of shipped CC1101 silicon.
pub const KNOWN_VERSIONS: [u8; 3] = [0x04, 0x14, 0x17];

/// Size of the TX FIFO in bytes.
pub const TX_FIFO_SIZE: usize = 64;
