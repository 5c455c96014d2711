// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fireplace Bridge - drive an RF-remote fireplace from MQTT and HTTP.
//!
//! The bridge replays the frames of a sub-GHz remote control through a TI
//! CC1101 transceiver and keeps a best-effort mirror of the appliance's
//! ON/OFF state for the network side.
//!
//! # Architecture
//!
//! - [`radio`]: the [`RadioLink`](radio::RadioLink) seam and the
//!   [`Cc1101`](radio::Cc1101) driver over `embedded-hal` SPI
//! - [`catalog`]: immutable command-to-frame table
//! - [`dispatcher`]: the single path from a command to the air
//! - [`state`] and [`event`]: the power state mirror and its notifications
//! - [`protocol`]: MQTT and HTTP adapters (features `mqtt` and `http`)
//! - [`config`] and [`bridge`]: configuration, startup and supervision
//!
//! Fire-and-forget: the appliance never acknowledges, so a power command
//! updates the mirror whatever the transmission outcome.
//!
//! # Quick Start
//!
//! ```ignore
//! use fireplace_bridge::bridge;
//! use fireplace_bridge::config::BridgeConfig;
//! use fireplace_bridge::radio::Cc1101;
//! use linux_embedded_hal::{Delay, SpidevDevice};
//!
//! #[tokio::main]
//! async fn main() -> fireplace_bridge::Result<()> {
//!     let config = BridgeConfig::load(None)?;
//!     let spi = SpidevDevice::open(&config.radio.spidev).unwrap();
//!     bridge::run(&config, Cc1101::new(spi, Delay)).await?;
//!     Ok(())
//! }
//! ```

#[cfg(all(feature = "http", feature = "mqtt"))]
pub mod bridge;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod protocol;
pub mod radio;
pub mod state;
pub mod types;

pub use catalog::CommandCatalog;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{ConfigError, Error, ProtocolError, RadioError, Result, ValueError};
pub use radio::{RadioLink, TransmissionResult};
pub use types::{CommandName, PowerState, RadioFrame};
