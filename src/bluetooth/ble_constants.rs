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

//! BLE characteristic UUIDs and protocol constants for the GL1 Pro.

use std::time::Duration;
use uuid::Uuid;

/// Command characteristic UUID (host writes power frames here).
/// Properties: Write
pub const WRITE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x69400002_b5a3_f393_e0a9_e50e24dcca99);

/// Status characteristic UUID (light reports its power state here).
/// Sibling of the write characteristic in the same vendor service.
/// Properties: Notify
pub const NOTIFY_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x69400003_b5a3_f393_e0a9_e50e24dcca99);

/// Advertised local name prefix of the fixture family.
pub const LOCAL_NAME_PREFIX: &str = "NEEWER-GL1";

pub const MANUFACTURER: &str = "Neewer";
pub const MODEL: &str = "GL1 Pro";

/// Frame tags and payload values.
pub mod tags {
    /// First byte of every frame.
    pub const SYNC: u8 = 0x78;
    /// Power command (host -> light).
    pub const POWER: u8 = 0x81;
    /// Status report (light -> host).
    pub const STATUS: u8 = 0x02;

    pub const STATE_ON: u8 = 0x01;
    pub const STATE_OFF: u8 = 0x02;
}

/// Timing defaults.
pub mod timing {
    use super::Duration;

    /// How long to wait for a status notification after a write.
    pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

    /// How long to wait for BlueZ to finish service discovery.
    pub const SERVICES_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Poll interval while waiting for service discovery.
    pub const SERVICES_RESOLVE_POLL: Duration = Duration::from_millis(100);

    /// Delay between cached connection attempts.
    pub const CONNECT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

    /// Connection attempts through a cached device.
    pub const CONNECT_ATTEMPTS: u32 = 3;
}
