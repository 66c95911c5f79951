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

//! Last-known state of a light.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Result of one power command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// State the light is believed to be in.
    pub is_on: bool,
    /// Whether the light reported this state itself.
    pub confirmed: bool,
}

impl CommandOutcome {
    /// The light reported `is_on`.
    pub fn confirmed(is_on: bool) -> Self {
        Self {
            is_on,
            confirmed: true,
        }
    }

    /// Nothing was reported; `is_on` is what was asked for.
    pub fn assumed(is_on: bool) -> Self {
        Self {
            is_on,
            confirmed: false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match (self.is_on, self.confirmed) {
            (true, true) => "on (confirmed)",
            (true, false) => "on (assumed)",
            (false, true) => "off (confirmed)",
            (false, false) => "off (assumed)",
        }
    }
}

/// Best-known state of one light.
///
/// Only a completed command exchange writes here.
#[derive(Debug)]
pub struct DeviceState {
    is_on: RwLock<bool>,
    last_outcome: RwLock<Option<CommandOutcome>>,
    updated_at: RwLock<Option<DateTime<Utc>>>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            is_on: RwLock::new(false),
            last_outcome: RwLock::new(None),
            updated_at: RwLock::new(None),
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: CommandOutcome) {
        *self.is_on.write() = outcome.is_on;
        *self.last_outcome.write() = Some(outcome);
        *self.updated_at.write() = Some(Utc::now());
    }

    pub fn is_on(&self) -> bool {
        *self.is_on.read()
    }

    pub fn last_outcome(&self) -> Option<CommandOutcome> {
        *self.last_outcome.read()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        *self.updated_at.read()
    }
}
