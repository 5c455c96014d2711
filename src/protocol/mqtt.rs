// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT adapter: command listener and state publisher.
//!
//! Topic layout (configurable, see [`MqttSettings`]):
//! - Commands: `fireplace/cmnd`, payload is a command token (`ON`, `FLAME`, ...)
//! - State: `fireplace/state`, retained, `ON` / `OFF`
//! - Discovery: `homeassistant/<component>/<node>_<object>/config`, retained
//!
//! The session is driven by a single task. On every ConnAck the adapter
//! subscribes to the command topic and republishes discovery and the current
//! state, so a broker restart or a lost session heals on its own.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use tokio::sync::broadcast::error::RecvError;

use crate::config::MqttSettings;
use crate::dispatcher::Dispatcher;
use crate::error::ProtocolError;
use crate::protocol::discovery::discovery_messages;
use crate::radio::RadioLink;
use crate::types::PowerState;

/// Capacity of the request channel between the client and the event loop.
///
/// One announcement queues nine requests (subscribe, seven discovery
/// documents, state).
const REQUEST_CAPACITY: usize = 32;

/// A configured MQTT session that is not yet being polled.
///
/// # Examples
///
/// ```ignore
/// use fireplace_bridge::config::MqttSettings;
/// use fireplace_bridge::protocol::MqttAdapter;
///
/// let settings = MqttSettings {
///     host: Some("mqtt://192.168.1.10:1883".to_string()),
///     ..MqttSettings::default()
/// };
/// let adapter = MqttAdapter::new(&settings)?;
/// tokio::spawn(adapter.run(dispatcher));
/// ```
pub struct MqttAdapter {
    client: AsyncClient,
    event_loop: EventLoop,
    settings: MqttSettings,
}

impl fmt::Debug for MqttAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttAdapter")
            .field("client", &self.client)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MqttAdapter {
    /// Creates the session. No network traffic happens until
    /// [`run`](Self::run) is polled.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if no usable broker address
    /// is configured.
    pub fn new(settings: &MqttSettings) -> Result<Self, ProtocolError> {
        let (host, port) = settings
            .broker_address()
            .map_err(|e| ProtocolError::InvalidAddress(e.to_string()))?;

        let mut options = MqttOptions::new(&settings.client_id, host.as_str(), port);
        options.set_keep_alive(settings.keep_alive());
        options.set_clean_session(true);
        if let Some(username) = &settings.username {
            options.set_credentials(
                username.as_str(),
                settings.password.as_deref().unwrap_or_default(),
            );
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        tracing::info!(%host, port, client_id = %settings.client_id, "MQTT session created");

        Ok(Self {
            client,
            event_loop,
            settings: settings.clone(),
        })
    }

    /// Returns a handle for publishing outside the adapter.
    #[must_use]
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    /// Drives the session forever.
    ///
    /// The state subscription is taken immediately, before the returned
    /// future is first polled, so no notification emitted after this call
    /// is missed.
    pub fn run<R>(self, dispatcher: Arc<Dispatcher<R>>) -> impl Future<Output = ()> + Send
    where
        R: RadioLink + Send + 'static,
    {
        let mut states = dispatcher.subscribe();
        let Self {
            client,
            mut event_loop,
            settings,
        } = self;
        let mut session = Session::new(client, settings);

        async move {
            let mut forwarding = true;
            loop {
                tokio::select! {
                    event = event_loop.poll() => match event {
                        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                            tracing::info!(code = ?ack.code, "MQTT connected");
                            if let Err(e) = session.on_connack(dispatcher.state()) {
                                tracing::error!(error = %e, "Failed to queue MQTT subscription");
                            }
                        }
                        Ok(Event::Incoming(Packet::SubAck(suback))) => {
                            tracing::debug!(?suback, "MQTT subscription acknowledged");
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            if let Some(token) = command_payload(&publish, &session.settings.command_topic) {
                                handle_command(&dispatcher, token).await;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            session.on_connection_lost();
                            let delay = session.settings.reconnect_delay();
                            tracing::warn!(error = %e, ?delay, "MQTT connection lost, retrying");
                            tokio::time::sleep(delay).await;
                        }
                    },
                    received = states.recv(), if forwarding => match received {
                        Ok(event) => session.forward_state(event.state),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "State notifications lagged");
                            session.forward_state(dispatcher.state());
                        }
                        Err(RecvError::Closed) => forwarding = false,
                    },
                }
            }
        }
    }
}

/// Extracts the command token from a message on the command topic.
///
/// Returns `None` for other topics and for payloads that are not UTF-8.
#[must_use]
pub fn command_payload(publish: &Publish, command_topic: &str) -> Option<String> {
    if publish.topic != command_topic {
        return None;
    }
    match std::str::from_utf8(&publish.payload) {
        Ok(token) => Some(token.to_string()),
        Err(_) => {
            tracing::warn!(topic = %publish.topic, "Ignoring non UTF-8 command payload");
            None
        }
    }
}

async fn handle_command<R>(dispatcher: &Arc<Dispatcher<R>>, token: String)
where
    R: RadioLink + Send + 'static,
{
    tracing::debug!(command = %token.trim(), "MQTT command received");
    let dispatcher = Arc::clone(dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.dispatch_raw(&token)).await {
        Ok(outcome) => tracing::debug!(?outcome, "MQTT command handled"),
        Err(e) => tracing::error!(error = %e, "Dispatch task failed"),
    }
}

/// Outgoing side of the session, owned by the polling task.
///
/// Every call uses the non-blocking client API: this runs on the task that
/// drains the request channel. Nothing is queued while the broker is
/// unreachable, so the channel has room for the announcement on ConnAck.
struct Session {
    client: AsyncClient,
    settings: MqttSettings,
    connected: bool,
}

impl Session {
    fn new(client: AsyncClient, settings: MqttSettings) -> Self {
        Self {
            client,
            settings,
            connected: false,
        }
    }

    /// Queues the subscription, discovery documents and current state.
    ///
    /// Only a failed subscription is returned; discovery and state are
    /// best-effort and logged.
    fn on_connack(&mut self, state: PowerState) -> Result<(), ClientError> {
        self.connected = true;
        let subscribed = self
            .client
            .try_subscribe(self.settings.command_topic.as_str(), QoS::AtLeastOnce);

        let mut queued = 0usize;
        for message in discovery_messages(&self.settings) {
            let payload = match message.payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(topic = %message.topic, error = %e, "Discovery document not serializable");
                    continue;
                }
            };
            match self
                .client
                .try_publish(message.topic.as_str(), QoS::AtLeastOnce, true, payload)
            {
                Ok(()) => queued += 1,
                Err(e) => tracing::warn!(topic = %message.topic, error = %e, "Discovery document not queued"),
            }
        }
        tracing::info!(prefix = %self.settings.discovery_prefix, documents = queued, "Discovery published");

        self.publish_state(state);
        subscribed
    }

    fn on_connection_lost(&mut self) {
        self.connected = false;
    }

    /// Publishes a state change; dropped while offline since the next
    /// ConnAck republishes the current state.
    fn forward_state(&self, state: PowerState) {
        if self.connected {
            self.publish_state(state);
        } else {
            tracing::trace!(state = %state, "Offline, state deferred to reconnect");
        }
    }

    fn publish_state(&self, state: PowerState) {
        match self.client.try_publish(
            self.settings.state_topic.as_str(),
            QoS::AtLeastOnce,
            true,
            state.as_str(),
        ) {
            Ok(()) => tracing::debug!(topic = %self.settings.state_topic, state = %state, "State published"),
            Err(e) => tracing::warn!(error = %e, "Failed to queue state publish"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MqttSettings {
        MqttSettings {
            host: Some("mqtt://127.0.0.1:1883".to_string()),
            ..MqttSettings::default()
        }
    }

    #[test]
    fn command_payload_matches_topic() {
        let publish = Publish::new("fireplace/cmnd", QoS::AtLeastOnce, " on ");
        assert_eq!(
            command_payload(&publish, "fireplace/cmnd").as_deref(),
            Some(" on ")
        );
    }

    #[test]
    fn command_payload_ignores_other_topics() {
        let publish = Publish::new("fireplace/state", QoS::AtLeastOnce, "ON");
        assert_eq!(command_payload(&publish, "fireplace/cmnd"), None);
    }

    #[test]
    fn command_payload_rejects_invalid_utf8() {
        let publish = Publish::new("fireplace/cmnd", QoS::AtLeastOnce, vec![0xFF, 0xFE]);
        assert_eq!(command_payload(&publish, "fireplace/cmnd"), None);
    }

    #[test]
    fn new_requires_broker() {
        let err = MqttAdapter::new(&MqttSettings::default()).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    /// The event loop owns the receiving end; keep it alive or every
    /// `try_*` call fails as disconnected.
    fn session(capacity: usize) -> (Session, EventLoop) {
        let (client, event_loop) =
            AsyncClient::new(MqttOptions::new("test", "127.0.0.1", 1883), capacity);
        (Session::new(client, settings()), event_loop)
    }

    #[test]
    fn adapter_debug_omits_event_loop() {
        let adapter = MqttAdapter::new(&settings()).unwrap();
        let debug = format!("{adapter:?}");
        assert!(debug.starts_with("MqttAdapter"));
        assert!(debug.contains("fireplace/cmnd"));
    }

    #[test]
    fn announcement_fits_request_channel() {
        let (mut session, _event_loop) = session(REQUEST_CAPACITY);
        session.on_connack(PowerState::Off).unwrap();
        assert!(session.connected);
    }

    #[test]
    fn offline_state_changes_leave_room_for_resubscribe() {
        let (mut session, _event_loop) = session(REQUEST_CAPACITY);

        for i in 0..REQUEST_CAPACITY + 8 {
            session.forward_state(PowerState::from(i % 2 == 0));
        }
        session.on_connack(PowerState::On).unwrap();

        session.on_connection_lost();
        assert!(!session.connected);
        for _ in 0..REQUEST_CAPACITY {
            session.forward_state(PowerState::Off);
        }
        session.on_connack(PowerState::Off).unwrap();
    }

    #[test]
    fn connected_session_forwards_state() {
        let (mut session, _event_loop) = session(1);
        session.connected = true;

        session.forward_state(PowerState::On);
        assert!(
            session
                .client
                .try_subscribe("fireplace/cmnd", QoS::AtLeastOnce)
                .is_err()
        );
    }

    #[test]
    fn subscription_is_queued_before_discovery() {
        let (mut session, _event_loop) = session(1);
        assert!(session.on_connack(PowerState::On).is_ok());
    }

    #[test]
    fn failed_subscription_is_reported() {
        let (mut session, _event_loop) = session(1);
        session
            .client
            .try_publish("other", QoS::AtMostOnce, false, "x")
            .unwrap();

        assert!(session.on_connack(PowerState::On).is_err());
        assert!(session.connected);
    }
}
