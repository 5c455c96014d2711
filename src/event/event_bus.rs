// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for state notifications.

use tokio::sync::broadcast;

use super::StateEvent;

/// Default channel capacity.
///
/// Notifications are rare (one per power command), so a small buffer is
/// enough for a subscriber that is momentarily busy.
const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Fan-out of [`StateEvent`]s to every active adapter.
///
/// Backed by a tokio broadcast channel: each subscriber gets its own copy.
/// A subscriber that falls more than the channel capacity behind loses the
/// oldest events and sees `RecvError::Lagged`; it should then re-read the
/// current state from the dispatcher.
///
/// # Examples
///
/// ```
/// use fireplace_bridge::event::{EventBus, StateEvent};
/// use fireplace_bridge::types::{CommandName, PowerState};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StateEvent::command(CommandName::PowerOn, PowerState::On, true));
///
/// let mut rx2 = bus.subscribe();
/// assert!(rx2.try_recv().is_err());
/// assert_eq!(rx.try_recv().unwrap().state, PowerState::On);
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StateEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering at most `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event; discarded when nobody listens.
    pub fn publish(&self, event: StateEvent) {
        let delivered = self.publish_counted(event);
        tracing::trace!(state = %event.state, delivered, "State event published");
    }

    /// Publishes an event and returns how many subscribers received it.
    #[must_use]
    pub fn publish_counted(&self, event: StateEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
