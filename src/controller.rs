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

//! Power control for one paired light.
//!
//! Every command opens its own connection, writes the power frame and waits
//! briefly for the light to report back. Notification delivery over BLE is
//! best effort and some firmware never sends one, so when nothing comes back
//! the requested state is assumed: the write is what switches the light.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::bluetooth::ble_constants::{MANUFACTURER, MODEL};
use crate::bluetooth::{Connector, DeviceAddress, DeviceSession, ExchangeOptions, PowerState};
use crate::state::{CommandOutcome, DeviceState};

/// Descriptive information about a light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub unique_id: String,
    pub name: String,
    pub address: DeviceAddress,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

/// Title used when no name is configured.
pub fn default_name(address: &DeviceAddress) -> String {
    format!("{} {} ({})", MANUFACTURER, MODEL, address)
}

/// Controller for one light.
pub struct DeviceController {
    address: DeviceAddress,
    name: String,
    connectors: Vec<Arc<dyn Connector>>,
    options: ExchangeOptions,
    state: Arc<DeviceState>,
    // Held for a whole exchange so commands never overlap on one light.
    command_lock: Arc<Mutex<()>>,
}

impl DeviceController {
    /// Create a controller that reaches the light through `connectors`,
    /// tried in order.
    pub fn new(
        address: DeviceAddress,
        name: Option<String>,
        connectors: Vec<Arc<dyn Connector>>,
        options: ExchangeOptions,
    ) -> Self {
        Self {
            address,
            name: name.unwrap_or_else(|| default_name(&address)),
            connectors,
            options,
            state: Arc::new(DeviceState::new()),
            command_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            unique_id: self.address.unique_id(),
            name: self.name.clone(),
            address: self.address,
            manufacturer: MANUFACTURER,
            model: MODEL,
        }
    }

    /// Switch the light on. Ends on, unless the light reports otherwise.
    pub async fn turn_on(&self) -> CommandOutcome {
        self.set_power(PowerState::On).await
    }

    /// Switch the light off. Ends off, unless the light reports otherwise.
    pub async fn turn_off(&self) -> CommandOutcome {
        self.set_power(PowerState::Off).await
    }

    /// Last recorded on/off state. No I/O.
    pub fn current_state(&self) -> bool {
        self.state.is_on()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Run one command exchange.
    ///
    /// The exchange runs in its own task that owns the transport and the
    /// command lock. Dropping the returned future does not cut it short, so
    /// the connection is still released and the state still recorded.
    async fn set_power(&self, requested: PowerState) -> CommandOutcome {
        let guard = self.command_lock.clone().lock_owned().await;

        let address = self.address;
        let connectors = self.connectors.clone();
        let options = self.options.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            info!("Turning {} {}", address, requested.as_str());

            let reported = match DeviceSession::acquire(address, &connectors).await {
                Some(session) => {
                    debug!("{}: exchange over {} connection", address, session.strategy());
                    session.exchange(&requested.command(), &options).await
                }
                None => None,
            };

            let outcome = resolve(address, requested, reported);
            state.record(outcome);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Command task for {} failed: {}", self.address, e);
                let outcome = CommandOutcome::assumed(requested.is_on());
                self.state.record(outcome);
                outcome
            }
        }
    }
}

/// Adopt the reported state, or assume the requested one.
fn resolve(address: DeviceAddress, requested: PowerState, reported: Option<bool>) -> CommandOutcome {
    match reported {
        Some(is_on) => {
            info!("{} reports {}", address, PowerState::from(is_on).as_str());
            CommandOutcome::confirmed(is_on)
        }
        None => {
            info!(
                "No confirmation from {}, assuming {}",
                address,
                requested.as_str()
            );
            CommandOutcome::assumed(requested.is_on())
        }
    }
}
