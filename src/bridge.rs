// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Startup sequence and duty supervision.
//!
//! [`Bridge::start`] performs the startup steps in order and fails fast:
//!
//! 1. bind the HTTP listener,
//! 2. create the MQTT session (when a broker is configured),
//! 3. initialize the radio (a missing chip aborts startup),
//! 4. configure the radio for the catalog's packet length,
//! 5. build the dispatcher and force the state to OFF.
//!
//! [`Bridge::serve`] then runs HTTP, MQTT and the restart timer side by side
//! until one of them ends.

use std::future::pending;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::BridgeConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{ProtocolError, RadioError, Result};
use crate::event::EventBus;
use crate::protocol::{MqttAdapter, http};
use crate::radio::{ChipInfo, RadioConfig, RadioLink};
use crate::state::StateStore;
use crate::types::PowerState;

/// Why [`Bridge::serve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The restart interval elapsed; the process should re-execute itself.
    ScheduledRestart,
    /// Ctrl-C was received.
    Shutdown,
}

/// A started bridge, ready to serve.
pub struct Bridge<R> {
    dispatcher: Arc<Dispatcher<R>>,
    listener: TcpListener,
    mqtt: Option<MqttAdapter>,
    restart_interval: Option<Duration>,
    chip: ChipInfo,
}

impl<R> Bridge<R>
where
    R: RadioLink + Send + 'static,
{
    /// Runs the startup sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame overrides are invalid, the listener
    /// cannot be bound, the MQTT settings are unusable, or the radio cannot
    /// be initialized or configured. No dispatcher exists in that case, so
    /// nothing is ever transmitted.
    pub async fn start(config: &BridgeConfig, radio: R) -> Result<Self> {
        let catalog = config.catalog()?;

        let listener = http::bind(config.http_bind()?).await?;

        let mqtt = if config.mqtt.is_enabled() {
            Some(MqttAdapter::new(&config.mqtt)?)
        } else {
            tracing::info!("No MQTT broker configured, HTTP only");
            None
        };

        let radio_config = RadioConfig::for_catalog(&catalog);
        let (radio, chip) = tokio::task::spawn_blocking(move || {
            let mut radio = radio;
            let setup = radio
                .initialize()
                .and_then(|chip| radio.configure(&radio_config).map(|()| chip));
            (radio, setup)
        })
        .await
        .map_err(|e| RadioError::Bus(format!("radio setup task failed: {e}")))?;
        let chip = chip.inspect_err(|e| tracing::error!(error = %e, "Radio setup failed"))?;

        let dispatcher = Arc::new(Dispatcher::new(
            radio,
            catalog,
            Arc::new(StateStore::new()),
            EventBus::new(),
        ));
        dispatcher.force_state(PowerState::Off);

        Ok(Self {
            dispatcher,
            listener,
            mqtt,
            restart_interval: config.restart_interval(),
            chip,
        })
    }

    /// Returns the dispatcher shared by the adapters.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher<R>> {
        &self.dispatcher
    }

    /// Returns the identity reported by the transceiver.
    #[must_use]
    pub fn chip(&self) -> ChipInfo {
        self.chip
    }

    /// Returns the bound HTTP address.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Server` if the socket address is unavailable.
    pub fn http_addr(&self) -> std::result::Result<SocketAddr, ProtocolError> {
        self.listener.local_addr().map_err(ProtocolError::Server)
    }

    /// Serves every duty until the restart timer fires, Ctrl-C is received,
    /// or the HTTP server fails.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Server` if the HTTP server stops.
    pub async fn serve(self) -> Result<Exit> {
        let Self {
            dispatcher,
            listener,
            mqtt,
            restart_interval,
            chip: _,
        } = self;

        let mqtt = mqtt.map(|adapter| adapter.run(Arc::clone(&dispatcher)));
        let mqtt = async move {
            match mqtt {
                Some(session) => session.await,
                None => pending().await,
            }
        };
        let restart = async move {
            match restart_interval {
                Some(interval) => tokio::time::sleep(interval).await,
                None => pending().await,
            }
        };

        tracing::info!(?restart_interval, "Bridge running");
        tokio::select! {
            served = http::serve(listener, dispatcher) => {
                served?;
                Err(ProtocolError::Server(std::io::Error::other("HTTP server stopped")).into())
            }
            () = mqtt => {
                Err(ProtocolError::Server(std::io::Error::other("MQTT session ended")).into())
            }
            () = restart => {
                tracing::info!("Scheduled restart");
                Ok(Exit::ScheduledRestart)
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                Ok(Exit::Shutdown)
            }
        }
    }
}

/// Starts the bridge and serves until it exits.
///
/// # Errors
///
/// See [`Bridge::start`] and [`Bridge::serve`].
pub async fn run<R>(config: &BridgeConfig, radio: R) -> Result<Exit>
where
    R: RadioLink + Send + 'static,
{
    let bridge = Bridge::start(config, radio).await?;
    tracing::info!(
        version = format_args!("{:#04x}", bridge.chip().version),
        "Bridge started"
    );
    bridge.serve().await
}
