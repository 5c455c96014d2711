// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State notification payload.

use crate::types::{CommandName, PowerState};

/// What caused a state notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    /// A dispatched power command.
    Command(CommandName),
    /// The startup sequence forcing a known state.
    Startup,
}

/// A recorded power state that should be mirrored to the control plane.
///
/// Emitted after every power command, whether or not the state actually
/// changed, so a retained state topic is always refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEvent {
    /// The state now held by the store.
    pub state: PowerState,
    /// Whether `state` differs from the previous value.
    pub changed: bool,
    /// Origin of the update.
    pub source: StateSource,
}

impl StateEvent {
    /// Creates an event caused by a dispatched command.
    #[must_use]
    pub fn command(command: CommandName, state: PowerState, changed: bool) -> Self {
        Self {
            state,
            changed,
            source: StateSource::Command(command),
        }
    }

    /// Creates an event for the boot-time state reset.
    #[must_use]
    pub fn startup(state: PowerState) -> Self {
        Self {
            state,
            changed: true,
            source: StateSource::Startup,
        }
    }

    /// Returns the payload published on the state topic (`ON` / `OFF`).
    #[must_use]
    pub fn payload(&self) -> &'static str {
        self.state.as_str()
    }
}
