// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared test doubles.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fireplace_bridge::radio::{ChipInfo, RadioConfig, RadioLink, TransmissionResult};
use fireplace_bridge::{CommandCatalog, Dispatcher, RadioError, RadioFrame};
use fireplace_bridge::event::EventBus;
use fireplace_bridge::state::StateStore;
use parking_lot::Mutex;

#[derive(Debug)]
struct Recorder {
    chip: Option<ChipInfo>,
    initialized: bool,
    packet_length: Option<usize>,
    result: TransmissionResult,
    sent: Vec<RadioFrame>,
    bus_ops: usize,
    in_flight: bool,
    overlaps: usize,
    airtime: Duration,
}

/// A radio that records what it is asked to send.
///
/// Clones share the same log, so a test can keep a handle after moving the
/// radio into a dispatcher.
#[derive(Debug, Clone)]
pub struct FakeRadio {
    inner: Arc<Mutex<Recorder>>,
}

impl FakeRadio {
    pub fn new() -> Self {
        Self::with_chip(Some(ChipInfo {
            partnum: 0x00,
            version: 0x14,
        }))
    }

    /// A radio whose chip does not answer.
    pub fn absent() -> Self {
        Self::with_chip(None)
    }

    fn with_chip(chip: Option<ChipInfo>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorder {
                chip,
                initialized: false,
                packet_length: None,
                result: TransmissionResult::Success,
                sent: Vec::new(),
                bus_ops: 0,
                in_flight: false,
                overlaps: 0,
                airtime: Duration::ZERO,
            })),
        }
    }

    /// Makes every non-empty transmission report `result`.
    pub fn reporting(self, result: TransmissionResult) -> Self {
        self.inner.lock().result = result;
        self
    }

    /// Makes every transmission block for `airtime`.
    pub fn with_airtime(self, airtime: Duration) -> Self {
        self.inner.lock().airtime = airtime;
        self
    }

    /// Initializes and configures the radio for `catalog`.
    pub fn ready(mut self, catalog: &CommandCatalog) -> Self {
        self.initialize().unwrap();
        self.configure(&RadioConfig::for_catalog(catalog)).unwrap();
        self
    }

    pub fn sent(&self) -> Vec<RadioFrame> {
        self.inner.lock().sent.clone()
    }

    pub fn bus_ops(&self) -> usize {
        self.inner.lock().bus_ops
    }

    pub fn overlaps(&self) -> usize {
        self.inner.lock().overlaps
    }

    pub fn packet_length(&self) -> Option<usize> {
        self.inner.lock().packet_length
    }
}

impl RadioLink for FakeRadio {
    fn initialize(&mut self) -> Result<ChipInfo, RadioError> {
        let mut rec = self.inner.lock();
        rec.bus_ops += 1;
        match rec.chip {
            Some(chip) => {
                rec.initialized = true;
                Ok(chip)
            }
            None => Err(RadioError::ChipNotFound {
                partnum: 0xFF,
                version: 0xFF,
            }),
        }
    }

    fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        let mut rec = self.inner.lock();
        if !rec.initialized {
            return Err(RadioError::NotInitialized);
        }
        rec.bus_ops += 1;
        rec.packet_length = Some(config.packet_length);
        Ok(())
    }

    fn transmit(&mut self, frame: &RadioFrame) -> TransmissionResult {
        let airtime = {
            let mut rec = self.inner.lock();
            if frame.is_empty() {
                return TransmissionResult::Success;
            }
            if rec.packet_length.is_none() {
                return TransmissionResult::RadioNotReady;
            }
            if rec.in_flight {
                rec.overlaps += 1;
            }
            rec.in_flight = true;
            rec.bus_ops += 1;
            rec.sent.push(frame.clone());
            rec.airtime
        };

        if !airtime.is_zero() {
            std::thread::sleep(airtime);
        }

        let mut rec = self.inner.lock();
        rec.in_flight = false;
        rec.result
    }
}

/// Builds a dispatcher over a ready fake radio and the built-in catalog.
pub fn dispatcher(radio: &FakeRadio) -> Arc<Dispatcher<FakeRadio>> {
    let catalog = CommandCatalog::builtin();
    Arc::new(Dispatcher::new(
        radio.clone().ready(&catalog),
        catalog,
        Arc::new(StateStore::new()),
        EventBus::new(),
    ))
}
