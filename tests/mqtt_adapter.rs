// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT adapter using mockforge-mqtt.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::FakeRadio;
use fireplace_bridge::bridge::Bridge;
use fireplace_bridge::config::BridgeConfig;
use fireplace_bridge::protocol::discovery_messages;
use fireplace_bridge::{CommandCatalog, CommandName, Dispatcher, PowerState};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(10);

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_port(port: u16) {
    timeout(WAIT, async {
        while TcpStream::connect(("127.0.0.1", port)).await.is_err() {
            sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("nothing listening on port {port}"));
}

/// Starts a mock MQTT broker on a free port and returns the port.
async fn start_mock_broker() -> u16 {
    let port = free_port().await;
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    wait_for_port(port).await;
    port
}

fn bridge_config(broker_port: u16) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.http.bind = "127.0.0.1:0".to_string();
    config.mqtt.host = Some("127.0.0.1".to_string());
    config.mqtt.port = broker_port;
    config.mqtt.reconnect_delay_secs = 1;
    config
}

/// Starts the bridge in the background and returns its dispatcher.
async fn start_bridge(config: &BridgeConfig, radio: FakeRadio) -> Arc<Dispatcher<FakeRadio>> {
    let bridge = Bridge::start(config, radio).await.unwrap();
    let dispatcher = Arc::clone(bridge.dispatcher());
    tokio::spawn(bridge.serve());
    dispatcher
}

fn discovery_topics(config: &BridgeConfig) -> BTreeSet<String> {
    discovery_messages(&config.mqtt)
        .into_iter()
        .map(|message| message.topic)
        .collect()
}

/// TCP relay in front of the broker. Stopping it cuts every session
/// passing through, as a broker restart would.
struct Relay {
    port: u16,
    broker_port: u16,
    task: Option<JoinHandle<()>>,
}

impl Relay {
    async fn start(broker_port: u16) -> Self {
        let mut relay = Self {
            port: free_port().await,
            broker_port,
            task: None,
        };
        relay.resume().await;
        relay
    }

    async fn resume(&mut self) {
        let listener = TcpListener::bind(("127.0.0.1", self.port)).await.unwrap();
        let broker_port = self.broker_port;
        self.task = Some(tokio::spawn(async move {
            // Dropping the set aborts every forwarded connection.
            let mut links = JoinSet::new();
            loop {
                let Ok((mut inbound, _)) = listener.accept().await else {
                    continue;
                };
                links.spawn(async move {
                    if let Ok(mut outbound) = TcpStream::connect(("127.0.0.1", broker_port)).await {
                        let _ = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await;
                    }
                });
            }
        }));
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

/// A second client recording what the bridge publishes.
struct Observer {
    client: AsyncClient,
    messages: mpsc::UnboundedReceiver<(String, String)>,
    history: Vec<(String, String)>,
    _pump: JoinHandle<()>,
}

impl Observer {
    async fn connect(broker_port: u16, filters: &[&str]) -> Self {
        let mut options = MqttOptions::new("observer", "127.0.0.1", broker_port);
        options.set_keep_alive(Duration::from_secs(30));
        let (client, mut event_loop) = AsyncClient::new(options, 16);
        let (tx, messages) = mpsc::unbounded_channel();

        let pump = tokio::spawn(async move {
            while let Ok(event) = event_loop.poll().await {
                if let Event::Incoming(Packet::Publish(publish)) = event {
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    if tx.send((publish.topic, payload)).is_err() {
                        break;
                    }
                }
            }
        });

        for filter in filters {
            client.subscribe(*filter, QoS::AtLeastOnce).await.unwrap();
        }

        Self {
            client,
            messages,
            history: Vec::new(),
            _pump: pump,
        }
    }

    async fn send_command(&self, topic: &str, token: &str) {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, token)
            .await
            .unwrap();
    }

    /// Receives until `done` holds for everything seen since the last
    /// [`Observer::clear`].
    async fn wait_until(&mut self, done: impl Fn(&[(String, String)]) -> bool) -> bool {
        let history = &mut self.history;
        let messages = &mut self.messages;
        timeout(WAIT, async {
            while !done(history) {
                match messages.recv().await {
                    Some(message) => history.push(message),
                    None => return false,
                }
            }
            true
        })
        .await
        .unwrap_or(false)
    }

    async fn wait_for(&mut self, topic: &str, payload: &str) {
        let found = self
            .wait_until(|seen| seen.iter().any(|(t, p)| t == topic && p == payload))
            .await;
        assert!(found, "no {payload:?} on {topic}, got {:?}", self.history);
    }

    /// Waits until every topic in `expected` has been seen.
    async fn wait_for_topics(&mut self, expected: &BTreeSet<String>) {
        let found = self
            .wait_until(|seen| {
                expected
                    .iter()
                    .all(|topic| seen.iter().any(|(t, _)| t == topic))
            })
            .await;
        assert!(found, "missing discovery topics, got {:?}", self.history);
    }

    fn clear(&mut self) {
        while self.messages.try_recv().is_ok() {}
        self.history.clear();
    }
}

// ============================================================================
// Announcement
// ============================================================================

mod announcement {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connack_publishes_discovery_and_state() {
        let broker = start_mock_broker().await;
        let config = bridge_config(broker);
        start_bridge(&config, FakeRadio::new()).await;

        let mut observer = Observer::connect(broker, &["homeassistant/#", "fireplace/state"]).await;

        let expected = discovery_topics(&config);
        assert_eq!(expected.len(), 7);
        observer.wait_for_topics(&expected).await;
        observer.wait_for("fireplace/state", "OFF").await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn state_changes_are_published() {
        let broker = start_mock_broker().await;
        let config = bridge_config(broker);
        let dispatcher = start_bridge(&config, FakeRadio::new()).await;

        let mut observer = Observer::connect(broker, &["homeassistant/#", "fireplace/state"]).await;
        observer.wait_for_topics(&discovery_topics(&config)).await;

        dispatcher.dispatch(CommandName::PowerOn);
        observer.wait_for("fireplace/state", "ON").await;
    }
}

// ============================================================================
// Command topic
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn command_topic_drives_dispatcher() {
        let broker = start_mock_broker().await;
        let config = bridge_config(broker);
        let radio = FakeRadio::new();
        let dispatcher = start_bridge(&config, radio.clone()).await;

        let mut observer = Observer::connect(broker, &["homeassistant/#", "fireplace/state"]).await;
        // Discovery is queued after the subscription, so the bridge listens.
        observer.wait_for_topics(&discovery_topics(&config)).await;

        observer.send_command("fireplace/cmnd", " on ").await;
        observer.wait_for("fireplace/state", "ON").await;

        assert_eq!(dispatcher.state(), PowerState::On);
        assert_eq!(
            radio.sent(),
            vec![CommandCatalog::builtin().frame_for(CommandName::PowerOn).clone()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unknown_tokens_are_ignored() {
        let broker = start_mock_broker().await;
        let config = bridge_config(broker);
        let radio = FakeRadio::new();
        start_bridge(&config, radio.clone()).await;

        let mut observer = Observer::connect(broker, &["homeassistant/#", "fireplace/state"]).await;
        observer.wait_for_topics(&discovery_topics(&config)).await;

        observer.send_command("fireplace/cmnd", "garbage").await;
        observer.send_command("fireplace/cmnd", "ON").await;
        observer.wait_for("fireplace/state", "ON").await;

        assert_eq!(radio.sent().len(), 1);
    }
}

// ============================================================================
// Reconnection
// ============================================================================

mod reconnect {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn outage_restores_subscription_and_announcement() {
        let broker = start_mock_broker().await;
        let mut relay = Relay::start(broker).await;
        let config = bridge_config(relay.port);
        let dispatcher = start_bridge(&config, FakeRadio::new()).await;

        let mut observer = Observer::connect(broker, &["homeassistant/#", "fireplace/state"]).await;
        let expected = discovery_topics(&config);
        observer.wait_for_topics(&expected).await;
        observer.wait_for("fireplace/state", "OFF").await;

        relay.stop().await;
        sleep(Duration::from_millis(300)).await;

        // More state changes than the request channel holds.
        for i in 0..=40 {
            let command = if i % 2 == 0 {
                CommandName::PowerOn
            } else {
                CommandName::PowerOff
            };
            dispatcher.dispatch(command);
        }
        assert_eq!(dispatcher.state(), PowerState::On);

        observer.clear();
        relay.resume().await;

        observer.wait_for_topics(&expected).await;
        observer.wait_for("fireplace/state", "ON").await;

        observer.send_command("fireplace/cmnd", "off").await;
        observer.wait_for("fireplace/state", "OFF").await;
        assert_eq!(dispatcher.state(), PowerState::Off);
    }
}
