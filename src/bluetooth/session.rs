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

//! One command exchange over one short-lived connection.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::address::DeviceAddress;
use super::ble_constants::{timing, NOTIFY_CHARACTERISTIC_UUID, WRITE_CHARACTERISTIC_UUID};
use super::correlator::NotificationCorrelator;
use super::protocol::CommandFrame;
use super::transport::{Connector, GattTransport, NotifyCallback};

/// Per-exchange behaviour.
#[derive(Debug, Clone)]
pub struct ExchangeOptions {
    /// How long to wait for a status notification after the write.
    pub notify_timeout: Duration,
    /// Subscribe and wait for a status notification at all.
    pub await_status: bool,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            notify_timeout: timing::NOTIFY_TIMEOUT,
            await_status: true,
        }
    }
}

/// Owns a transport for the duration of one command.
pub struct DeviceSession {
    address: DeviceAddress,
    strategy: &'static str,
    transport: Box<dyn GattTransport>,
}

impl DeviceSession {
    /// Obtain a transport from the first connector that applies.
    ///
    /// Returns `None` (after logging) when no strategy yields a transport.
    pub async fn acquire(address: DeviceAddress, connectors: &[Arc<dyn Connector>]) -> Option<Self> {
        for connector in connectors {
            match connector.open(address).await {
                Ok(Some(transport)) => {
                    debug!("{}: using {} connection", address, connector.name());
                    return Some(Self {
                        address,
                        strategy: connector.name(),
                        transport,
                    });
                }
                Ok(None) => {
                    debug!("{}: {} connection not applicable", address, connector.name());
                }
                Err(e) => {
                    warn!("{}: {} connection unavailable: {:#}", address, connector.name(), e);
                }
            }
        }

        error!("Failed to send command to {}: no connection strategy available", address);
        None
    }

    /// Name of the strategy that produced the transport.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    /// Send `frame` and wait for the light to report its state.
    ///
    /// Returns the reported on/off state, or `None` if nothing was reported
    /// in time or the transport failed. The transport is disconnected
    /// before this returns, on every path.
    pub async fn exchange(mut self, frame: &CommandFrame, options: &ExchangeOptions) -> Option<bool> {
        let result = self.run(frame, options).await;

        if let Err(e) = self.transport.disconnect().await {
            warn!("{}: disconnect failed: {:#}", self.address, e);
        }

        match result {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to send command to {}: {:#}", self.address, e);
                None
            }
        }
    }

    async fn run(&mut self, frame: &CommandFrame, options: &ExchangeOptions) -> Result<Option<bool>> {
        self.transport.connect().await?;

        if !options.await_status {
            self.write(frame).await?;
            return Ok(None);
        }

        let correlator = Arc::new(NotificationCorrelator::new(self.address));
        correlator.arm();

        let sink = correlator.clone();
        let callback: NotifyCallback = Arc::new(move |raw: &[u8]| {
            sink.on_event(raw);
        });
        self.transport
            .subscribe(NOTIFY_CHARACTERISTIC_UUID, callback)
            .await?;

        self.write(frame).await?;

        let state = correlator.await_result(options.notify_timeout).await;

        // The write already happened; a failed unsubscribe must not discard
        // the state the light reported.
        if let Err(e) = self.transport.unsubscribe(NOTIFY_CHARACTERISTIC_UUID).await {
            warn!("{}: unsubscribe failed: {:#}", self.address, e);
        }

        Ok(state)
    }

    async fn write(&mut self, frame: &CommandFrame) -> Result<()> {
        debug!("{}: writing [{}]", self.address, frame);
        self.transport
            .write(WRITE_CHARACTERISTIC_UUID, frame.as_bytes())
            .await
    }
}
