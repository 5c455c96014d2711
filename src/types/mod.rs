// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the radio link, the dispatcher and the adapters.
//!
//! # Types
//!
//! - [`CommandName`] - The closed vocabulary of remote-control buttons
//! - [`PowerState`] - Last commanded ON/OFF state of the appliance
//! - [`RadioFrame`] - Exact on-air payload of one button press

mod command;
mod frame;
mod power;

pub use command::CommandName;
pub use frame::RadioFrame;
pub use power::PowerState;
