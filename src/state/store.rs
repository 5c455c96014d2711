// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::PowerState;

/// Shared ON/OFF mirror of the appliance.
///
/// Starts at [`PowerState::Off`] and is not persisted: a restart forgets the
/// last known state.
#[derive(Debug, Default)]
pub struct StateStore {
    on: AtomicBool,
}

impl StateStore {
    /// Creates a store holding [`PowerState::Off`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last recorded power state.
    #[must_use]
    pub fn get(&self) -> PowerState {
        PowerState::from(self.on.load(Ordering::Acquire))
    }

    /// Records a new power state and returns `true` if it differs from the
    /// previous one.
    pub(crate) fn set(&self, state: PowerState) -> bool {
        self.on.swap(state.is_on(), Ordering::AcqRel) != state.is_on()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn starts_off() {
        assert_eq!(StateStore::new().get(), PowerState::Off);
    }

    #[test]
    fn set_reports_change() {
        let store = StateStore::new();
        assert!(store.set(PowerState::On));
        assert!(!store.set(PowerState::On));
        assert_eq!(store.get(), PowerState::On);
        assert!(store.set(PowerState::Off));
        assert_eq!(store.get(), PowerState::Off);
    }

    #[test]
    fn visible_across_threads() {
        let store = Arc::new(StateStore::new());
        let writer = Arc::clone(&store);
        std::thread::spawn(move || writer.set(PowerState::On))
            .join()
            .unwrap();
        assert_eq!(store.get(), PowerState::On);
    }
}
