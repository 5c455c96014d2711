// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.
//!
//! The appliance never reports back, so the bridge keeps a best-effort mirror
//! of the last power command it sent. [`StateStore`] holds that mirror. It
//! can be read from any task; only the dispatcher writes it.
//!
//! # Examples
//!
//! ```
//! use fireplace_bridge::state::StateStore;
//! use fireplace_bridge::types::PowerState;
//!
//! let store = StateStore::new();
//! assert_eq!(store.get(), PowerState::Off);
//! ```

mod store;

pub use store::StateStore;
