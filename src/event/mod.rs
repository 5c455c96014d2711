// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State notifications.
//!
//! Every time the dispatcher records a power state it publishes a
//! [`StateEvent`] on the [`EventBus`]. Control-plane adapters subscribe and
//! mirror the state outward (the MQTT adapter republishes the retained state
//! topic).
//!
//! # Examples
//!
//! ```
//! use fireplace_bridge::event::{EventBus, StateEvent};
//! use fireplace_bridge::types::PowerState;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(StateEvent::startup(PowerState::Off));
//! assert_eq!(rx.try_recv().unwrap().state, PowerState::Off);
//! ```

mod event_bus;
mod state_event;

pub use event_bus::EventBus;
pub use state_event::{StateEvent, StateSource};
