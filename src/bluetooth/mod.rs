// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bluetooth communication module.
//!
//! Frame codec, status correlation and the per-command GATT session used to
//! switch a light on or off.

pub mod address;
pub mod ble_constants;
pub mod bluez;
pub mod correlator;
pub mod protocol;
pub mod session;
pub mod transport;

pub use address::{AddressError, DeviceAddress};
pub use correlator::NotificationCorrelator;
pub use protocol::{decode_status, encode, encode_status, CommandFrame, PowerState, POWER_OFF, POWER_ON};
pub use session::{DeviceSession, ExchangeOptions};
pub use transport::{Connector, GattTransport, NotifyCallback};
