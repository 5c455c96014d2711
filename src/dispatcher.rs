// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatcher: the single path from a command to the air.
//!
//! Both control-plane adapters funnel every command through
//! [`Dispatcher::dispatch`] or [`Dispatcher::dispatch_raw`]. The whole
//! dispatch (frame lookup, transmission, state update and notification) runs
//! while holding the radio lock, so two commands never interleave on the air
//! and state notifications are emitted in transmission order.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use fireplace_bridge::catalog::CommandCatalog;
//! use fireplace_bridge::dispatcher::{DispatchOutcome, Dispatcher};
//! use fireplace_bridge::event::EventBus;
//! use fireplace_bridge::radio::{ChipInfo, RadioConfig, RadioLink, TransmissionResult};
//! use fireplace_bridge::state::StateStore;
//! use fireplace_bridge::types::{PowerState, RadioFrame};
//! use fireplace_bridge::RadioError;
//!
//! struct Loopback;
//!
//! impl RadioLink for Loopback {
//!     fn initialize(&mut self) -> Result<ChipInfo, RadioError> {
//!         Ok(ChipInfo { partnum: 0, version: 0x14 })
//!     }
//!     fn configure(&mut self, _: &RadioConfig) -> Result<(), RadioError> {
//!         Ok(())
//!     }
//!     fn transmit(&mut self, _: &RadioFrame) -> TransmissionResult {
//!         TransmissionResult::Success
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new(
//!     Loopback,
//!     CommandCatalog::builtin(),
//!     Arc::new(StateStore::new()),
//!     EventBus::new(),
//! );
//! assert!(matches!(dispatcher.dispatch_raw(" on "), DispatchOutcome::Ok(_, TransmissionResult::Success)));
//! assert_eq!(dispatcher.state(), PowerState::On);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::catalog::CommandCatalog;
use crate::event::{EventBus, StateEvent};
use crate::radio::{RadioLink, TransmissionResult};
use crate::state::StateStore;
use crate::types::{CommandName, PowerState};

/// Result of dispatching an untrusted command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The token named a command, which was dispatched.
    Ok(CommandName, TransmissionResult),
    /// The token is not part of the vocabulary; nothing happened.
    UnknownCommand,
}

impl DispatchOutcome {
    /// Returns the dispatched command, if any.
    #[must_use]
    pub fn command(&self) -> Option<CommandName> {
        match self {
            Self::Ok(command, _) => Some(*command),
            Self::UnknownCommand => None,
        }
    }
}

/// Owner of the radio, the catalog and the state store.
///
/// Adapters hold an `Arc<Dispatcher<R>>`; they can dispatch and read the
/// state but never reach the radio or write the state directly.
#[derive(Debug)]
pub struct Dispatcher<R> {
    radio: Mutex<R>,
    catalog: CommandCatalog,
    state: Arc<StateStore>,
    events: EventBus,
}

impl<R: RadioLink> Dispatcher<R> {
    /// Creates a dispatcher around an initialized and configured radio.
    #[must_use]
    pub fn new(radio: R, catalog: CommandCatalog, state: Arc<StateStore>, events: EventBus) -> Self {
        Self {
            radio: Mutex::new(radio),
            catalog,
            state,
            events,
        }
    }

    /// Sends the frame for `command` and updates the power state.
    ///
    /// Power commands record their state whatever the transmission result:
    /// the bridge cannot observe the appliance, so the last command wins.
    pub fn dispatch(&self, command: CommandName) -> TransmissionResult {
        let mut radio = self.radio.lock();

        let frame = self.catalog.frame_for(command);
        let result = radio.transmit(frame);

        if let Some(power) = command.power_state() {
            let changed = self.state.set(power);
            self.events
                .publish(StateEvent::command(command, power, changed));
        }
        drop(radio);

        match result {
            TransmissionResult::Success => {
                tracing::info!(command = %command, bytes = frame.len(), "Command dispatched");
            }
            TransmissionResult::RadioNotReady | TransmissionResult::TransmitFailed => {
                tracing::error!(command = %command, result = %result, "Command transmission failed");
            }
        }
        result
    }

    /// Parses an untrusted token and dispatches it.
    ///
    /// Surrounding whitespace and letter case are ignored. Unknown tokens
    /// are logged and dropped without touching the radio or the state.
    pub fn dispatch_raw(&self, raw: &str) -> DispatchOutcome {
        match raw.parse::<CommandName>() {
            Ok(command) => DispatchOutcome::Ok(command, self.dispatch(command)),
            Err(_) => {
                tracing::warn!(command = raw.trim(), "Unknown command ignored");
                DispatchOutcome::UnknownCommand
            }
        }
    }

    /// Records a state without transmitting and notifies subscribers.
    ///
    /// Used once at startup to put the mirror in a known state.
    pub fn force_state(&self, state: PowerState) {
        let _radio = self.radio.lock();
        self.state.set(state);
        self.events.publish(StateEvent::startup(state));
        tracing::info!(state = %state, "Power state forced");
    }
}

impl<R> Dispatcher<R> {
    /// Returns the last recorded power state.
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state.get()
    }

    /// Subscribes to state notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Returns the frames this dispatcher transmits.
    #[must_use]
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }
}
