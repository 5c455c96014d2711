// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Home Assistant MQTT discovery documents.
//!
//! One `switch` entity mirrors the power state; every other command is a
//! stateless `button`. All entities share one device block, keyed by the
//! configured node id, and point at the configured command/state topics.

use serde::Serialize;

use crate::config::MqttSettings;
use crate::types::{CommandName, PowerState};

/// The `device` block grouping all entities in Home Assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceBlock {
    /// Stable identifiers; the node id.
    pub identifiers: Vec<String>,
    /// Device name shown in Home Assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Shown as the manufacturer in the device registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Shown as the model in the device registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Body of one discovery `config` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryDocument {
    /// Entity name.
    pub name: String,
    /// Entity id, `<node_id>_<object>`.
    pub unique_id: String,
    /// Topic the entity publishes its payloads to.
    pub command_topic: String,
    /// Topic the switch reads its state from. Buttons have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    /// Switch payload for turning on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<&'static str>,
    /// Switch payload for turning off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<&'static str>,
    /// State payload meaning on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_on: Option<&'static str>,
    /// State payload meaning off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_off: Option<&'static str>,
    /// Button payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_press: Option<&'static str>,
    /// Shared device block.
    pub device: DeviceBlock,
}

/// A discovery document together with the topic it is published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    /// `<prefix>/<component>/<node_id>_<object>/config`.
    pub topic: String,
    /// Retained JSON body.
    pub document: DiscoveryDocument,
}

impl DiscoveryMessage {
    /// Serializes the document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which the document's
    /// plain fields cannot cause.
    pub fn payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.document)
    }
}

/// Buttons in announcement order, with their entity suffix and label.
const BUTTONS: [(CommandName, &str, &str); 6] = [
    (CommandName::Left, "left", "Left"),
    (CommandName::Right, "right", "Right"),
    (CommandName::Flame, "flame_effect", "Flame Effect"),
    (CommandName::Sound, "sound", "Sound"),
    (CommandName::Plus, "plus", "Plus"),
    (CommandName::Minus, "minus", "Minus"),
];

/// Builds the seven discovery messages: the power switch, then the buttons.
#[must_use]
pub fn discovery_messages(settings: &MqttSettings) -> Vec<DiscoveryMessage> {
    let node = &settings.node_id;
    let mut messages = Vec::with_capacity(BUTTONS.len() + 1);

    let switch_id = format!("{node}_switch");
    messages.push(DiscoveryMessage {
        topic: config_topic(settings, "switch", &switch_id),
        document: DiscoveryDocument {
            name: "Fireplace".to_string(),
            unique_id: switch_id,
            command_topic: settings.command_topic.clone(),
            state_topic: Some(settings.state_topic.clone()),
            payload_on: Some(CommandName::PowerOn.as_str()),
            payload_off: Some(CommandName::PowerOff.as_str()),
            state_on: Some(PowerState::On.as_str()),
            state_off: Some(PowerState::Off.as_str()),
            payload_press: None,
            device: DeviceBlock {
                identifiers: vec![node.clone()],
                name: Some("Fireplace Controller".to_string()),
                manufacturer: Some("Custom".to_string()),
                model: Some("CC1101 FSK bridge".to_string()),
            },
        },
    });

    for (command, suffix, label) in BUTTONS {
        let object_id = format!("{node}_{suffix}");
        messages.push(DiscoveryMessage {
            topic: config_topic(settings, "button", &object_id),
            document: DiscoveryDocument {
                name: format!("Fireplace {label}"),
                unique_id: object_id,
                command_topic: settings.command_topic.clone(),
                state_topic: None,
                payload_on: None,
                payload_off: None,
                state_on: None,
                state_off: None,
                payload_press: Some(command.as_str()),
                device: DeviceBlock {
                    identifiers: vec![node.clone()],
                    name: None,
                    manufacturer: None,
                    model: None,
                },
            },
        });
    }
    messages
}

fn config_topic(settings: &MqttSettings, component: &str, object_id: &str) -> String {
    format!("{}/{component}/{object_id}/config", settings.discovery_prefix)
}
