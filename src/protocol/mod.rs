// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control-plane adapters.
//!
//! Both adapters are thin: they turn an inbound message into a dispatcher
//! call and never touch the radio or the state store themselves.
//!
//! - [`http`]: axum router with one `GET` route per command plus `/state`
//! - [`MqttAdapter`]: command topic listener, retained state publisher and
//!   Home Assistant discovery
//!
//! Each adapter sits behind a cargo feature of the same name.

#[cfg(feature = "mqtt")]
mod discovery;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "mqtt")]
pub use discovery::{DeviceBlock, DiscoveryDocument, DiscoveryMessage, discovery_messages};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttAdapter, command_payload};
