// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the fireplace bridge.
//!
//! This module provides the error hierarchy used across the crate: value
//! validation (command tokens, captured frames), the radio link, the
//! control-plane protocols, and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error reported by the radio link.
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),

    /// Error occurred in one of the control-plane protocols.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while loading the configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to command tokens and radio frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A command token outside the vocabulary was received.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// A frame override could not be decoded as hex.
    #[error("invalid hex frame for {command}: {message}")]
    InvalidHex {
        /// The command the frame was meant for.
        command: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// Non-empty frames in a catalog disagree on their length.
    #[error("frame for {command} is {actual} bytes, expected {expected}")]
    FrameLengthMismatch {
        /// The offending command.
        command: String,
        /// Length shared by the other frames.
        expected: usize,
        /// Length of the offending frame.
        actual: usize,
    },

    /// A frame does not fit into the transceiver's TX FIFO.
    #[error("frame for {command} is {actual} bytes, at most {max} allowed")]
    FrameTooLong {
        /// The offending command.
        command: String,
        /// Maximum frame length.
        max: usize,
        /// Length of the offending frame.
        actual: usize,
    },

    /// A catalog was built without a frame for some command.
    #[error("no frame for {0}")]
    MissingFrame(String),

    /// A catalog was built with two frames for the same command.
    #[error("duplicate frame for {0}")]
    DuplicateFrame(String),

    /// Every frame in the catalog is empty, so nothing could ever be sent.
    #[error("catalog contains no transmittable frame")]
    EmptyCatalog,
}

/// Errors reported by the radio link driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// The transceiver did not answer with a known chip identity.
    #[error("CC1101 not found (partnum {partnum:#04x}, version {version:#04x})")]
    ChipNotFound {
        /// Value read from the `PARTNUM` register.
        partnum: u8,
        /// Value read from the `VERSION` register.
        version: u8,
    },

    /// `configure` was called before a successful `initialize`.
    #[error("radio has not been initialized")]
    NotInitialized,

    /// The control bus reported an error.
    #[error("bus error: {0}")]
    Bus(String),

    /// The requested configuration cannot be expressed by the chip.
    #[error("invalid radio configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to the MQTT and HTTP adapters.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT request could not be queued.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: std::net::SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("HTTP server error: {0}")]
    Server(#[source] std::io::Error),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
