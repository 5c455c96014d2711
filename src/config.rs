// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! Settings come from an optional TOML file where every key has a default,
//! then from `FIREPLACE_*` environment variables, which take precedence.
//!
//! ```toml
//! restart_interval_secs = 43200
//!
//! [http]
//! bind = "0.0.0.0:8080"
//!
//! [mqtt]
//! host = "192.168.1.10"
//! username = "bridge"
//! password = "secret"
//!
//! [radio]
//! spidev = "/dev/spidev0.0"
//!
//! [frames]
//! FLAME = "8e2c915e04fb8e2c915e04fb"
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::CommandCatalog;
use crate::error::{ConfigError, ValueError};

/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

const ENV_MQTT_HOST: &str = "FIREPLACE_MQTT_HOST";
const ENV_MQTT_PORT: &str = "FIREPLACE_MQTT_PORT";
const ENV_MQTT_USER: &str = "FIREPLACE_MQTT_USER";
const ENV_MQTT_PASSWORD: &str = "FIREPLACE_MQTT_PASSWORD";
const ENV_HTTP_BIND: &str = "FIREPLACE_HTTP_BIND";

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Seconds between scheduled restarts; `0` disables them.
    pub restart_interval_secs: u64,
    pub http: HttpSettings,
    pub mqtt: MqttSettings,
    pub radio: RadioSettings,
    /// Frame overrides: command token to hex string.
    pub frames: BTreeMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            restart_interval_secs: 12 * 60 * 60,
            http: HttpSettings::default(),
            mqtt: MqttSettings::default(),
            radio: RadioSettings::default(),
            frames: BTreeMap::new(),
        }
    }
}

/// HTTP control interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Listen address, `host:port`.
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// MQTT session and topic layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttSettings {
    /// Broker host, optionally as `mqtt://host:port`. MQTT is disabled when
    /// unset.
    pub host: Option<String>,
    /// Broker port used when `host` carries none.
    pub port: u16,
    /// Credentials are sent only when `username` is set.
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    /// Topic the bridge listens on for command tokens.
    pub command_topic: String,
    /// Retained topic carrying `ON` / `OFF`.
    pub state_topic: String,
    /// Home Assistant discovery prefix.
    pub discovery_prefix: String,
    /// Prefix of the discovery object ids and unique ids.
    pub node_id: String,
    /// MQTT keep-alive interval.
    pub keep_alive_secs: u64,
    /// Pause after a broker error before the session is polled again.
    pub reconnect_delay_secs: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_MQTT_PORT,
            username: None,
            password: None,
            client_id: "fireplace_bridge".to_string(),
            command_topic: "fireplace/cmnd".to_string(),
            state_topic: "fireplace/state".to_string(),
            discovery_prefix: "homeassistant".to_string(),
            node_id: "fireplace".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_secs: 2,
        }
    }
}

impl MqttSettings {
    /// Returns `true` when a broker host is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }

    /// Resolves the broker host and port.
    ///
    /// A port embedded in `host` (`mqtt://broker:1884`) wins over `port`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if MQTT is disabled or the embedded
    /// port is not a number.
    pub fn broker_address(&self) -> Result<(String, u16), ConfigError> {
        let raw = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::Invalid("mqtt.host is not set".to_string()))?;

        let url = raw
            .strip_prefix("mqtt://")
            .or_else(|| raw.strip_prefix("tcp://"))
            .unwrap_or(raw);

        match url.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("invalid MQTT port: {port}")))?;
                Ok((host.to_string(), port))
            }
            None => Ok((url.to_string(), self.port)),
        }
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

/// Transceiver wiring and transmit polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadioSettings {
    /// `spidev` character device the CC1101 is attached to.
    pub spidev: PathBuf,
    /// SPI clock in Hz (the CC1101 accepts up to 6.5 MHz in burst mode).
    pub spi_hz: u32,
    /// Microseconds between two end-of-transmission polls.
    pub poll_interval_us: u32,
    /// Polls before a transmission is declared failed.
    pub poll_budget: u32,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            spidev: PathBuf::from("/dev/spidev0.0"),
            spi_hz: 4_000_000,
            poll_interval_us: 500,
            poll_budget: 200,
        }
    }
}

impl BridgeConfig {
    /// Loads the configuration file (or defaults when `path` is `None`),
    /// applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or if a
    /// setting is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::info!(path = %path.display(), "Loading configuration");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies `FIREPLACE_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `FIREPLACE_MQTT_PORT` is not a port
    /// number.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup(ENV_MQTT_HOST) {
            self.mqtt.host = Some(v);
        }
        if let Some(v) = lookup(ENV_MQTT_PORT) {
            self.mqtt.port = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_MQTT_PORT}={v} is not a port")))?;
        }
        if let Some(v) = lookup(ENV_MQTT_USER) {
            self.mqtt.username = Some(v);
        }
        if let Some(v) = lookup(ENV_MQTT_PASSWORD) {
            self.mqtt.password = Some(v);
        }
        if let Some(v) = lookup(ENV_HTTP_BIND) {
            self.http.bind = v;
        }
        Ok(())
    }

    /// Checks settings that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http_bind()?;
        if self.mqtt.is_enabled() {
            self.mqtt.broker_address()?;
            for (key, topic) in [
                ("mqtt.command_topic", &self.mqtt.command_topic),
                ("mqtt.state_topic", &self.mqtt.state_topic),
            ] {
                if topic.is_empty() || topic.contains(['+', '#']) {
                    return Err(ConfigError::Invalid(format!(
                        "{key} must be a non-empty topic without wildcards"
                    )));
                }
            }
            if self.mqtt.username.is_none() && self.mqtt.password.is_some() {
                return Err(ConfigError::Invalid(
                    "mqtt.password requires mqtt.username".to_string(),
                ));
            }
        }
        if self.radio.poll_budget == 0 {
            return Err(ConfigError::Invalid(
                "radio.poll_budget must be at least 1".to_string(),
            ));
        }
        self.catalog()
            .map_err(|e| ConfigError::Invalid(format!("frames: {e}")))?;
        Ok(())
    }

    /// Parses the HTTP listen address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `http.bind` is not `ip:port`.
    pub fn http_bind(&self) -> Result<SocketAddr, ConfigError> {
        self.http
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("http.bind: invalid address {}", self.http.bind)))
    }

    /// Builds the command catalog: built-in frames with overrides applied.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if an override is invalid.
    pub fn catalog(&self) -> Result<CommandCatalog, ValueError> {
        if self.frames.is_empty() {
            return Ok(CommandCatalog::builtin());
        }
        CommandCatalog::builtin().with_overrides(&self.frames)
    }

    /// Interval between scheduled restarts, `None` if disabled.
    #[must_use]
    pub fn restart_interval(&self) -> Option<Duration> {
        (self.restart_interval_secs > 0).then_some(Duration::from_secs(self.restart_interval_secs))
    }

    /// Renders the effective configuration as TOML with the password masked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if serialization fails.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.mqtt.password.is_some() {
            shown.mqtt.password = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
