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

//! BlueZ-backed transports.
//!
//! Two strategies reach a light: through the device object BlueZ already
//! holds from an earlier scan or connection, or by connecting directly to
//! the address when BlueZ has never seen it.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AddressType, Device};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::address::DeviceAddress;
use super::ble_constants::{timing, LOCAL_NAME_PREFIX};
use super::transport::{Connector, GattTransport, NotifyCallback};

/// Connection tuning shared by both strategies.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Attempts when connecting through a cached device.
    pub connect_attempts: u32,
    /// Upper bound on waiting for service discovery after connecting.
    pub services_resolve_timeout: Duration,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            connect_attempts: timing::CONNECT_ATTEMPTS,
            services_resolve_timeout: timing::SERVICES_RESOLVE_TIMEOUT,
        }
    }
}

/// Open a BlueZ session and return a powered adapter.
pub async fn open_adapter(name: Option<&str>) -> Result<Adapter> {
    let session = bluer::Session::new().await?;
    debug!("BlueZ session created");

    let adapter = match name {
        Some(name) => session.adapter(name)?,
        None => session.default_adapter().await?,
    };
    info!("Using Bluetooth adapter: {}", adapter.name());

    if !adapter.is_powered().await? {
        info!("Powering on Bluetooth adapter...");
        adapter.set_powered(true).await?;
    }

    Ok(adapter)
}

/// Strategies in preference order: cached device first, then direct.
pub fn connectors(adapter: &Adapter, options: &LinkOptions) -> Vec<Arc<dyn Connector>> {
    vec![
        Arc::new(CachedDeviceConnector {
            adapter: adapter.clone(),
            options: options.clone(),
        }),
        Arc::new(DirectConnector {
            adapter: adapter.clone(),
            options: options.clone(),
        }),
    ]
}

/// Connects through a device BlueZ already knows about.
pub struct CachedDeviceConnector {
    adapter: Adapter,
    options: LinkOptions,
}

#[async_trait]
impl Connector for CachedDeviceConnector {
    fn name(&self) -> &'static str {
        "cached"
    }

    async fn open(&self, address: DeviceAddress) -> Result<Option<Box<dyn GattTransport>>> {
        let bluez_address: bluer::Address = address.into();
        let known = self.adapter.device_addresses().await?;
        if !known.contains(&bluez_address) {
            debug!("Device {} not in BlueZ cache", address);
            return Ok(None);
        }

        let device = self.adapter.device(bluez_address)?;
        if let Ok(Some(name)) = device.name().await {
            if !name.starts_with(LOCAL_NAME_PREFIX) {
                warn!(
                    "{} advertises as '{}', expected a {} light",
                    address, name, LOCAL_NAME_PREFIX
                );
            }
        }

        Ok(Some(Box::new(BluezTransport::new(
            address,
            Link::Cached(device),
            self.options.clone(),
        ))))
    }
}

/// Connects straight to the address without a prior scan.
pub struct DirectConnector {
    adapter: Adapter,
    options: LinkOptions,
}

#[async_trait]
impl Connector for DirectConnector {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn open(&self, address: DeviceAddress) -> Result<Option<Box<dyn GattTransport>>> {
        Ok(Some(Box::new(BluezTransport::new(
            address,
            Link::Direct(self.adapter.clone()),
            self.options.clone(),
        ))))
    }
}

/// How the transport reaches the device.
enum Link {
    Cached(Device),
    Direct(Adapter),
}

/// GATT transport over a BlueZ device object.
pub struct BluezTransport {
    address: DeviceAddress,
    link: Link,
    options: LinkOptions,
    device: Option<Device>,
    characteristics: HashMap<Uuid, Characteristic>,
    subscriptions: HashMap<Uuid, JoinHandle<()>>,
}

impl BluezTransport {
    fn new(address: DeviceAddress, link: Link, options: LinkOptions) -> Self {
        Self {
            address,
            link,
            options,
            device: None,
            characteristics: HashMap::new(),
            subscriptions: HashMap::new(),
        }
    }

    async fn connect_cached(&self, device: &Device) -> Result<()> {
        let attempts = self.options.connect_attempts.max(1);

        for attempt in 1..=attempts {
            if device.is_connected().await? {
                debug!("{} already connected", self.address);
                return Ok(());
            }

            match device.connect().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(
                        "Connection attempt {}/{} to {} failed: {}",
                        attempt, attempts, self.address, e
                    );
                    sleep(timing::CONNECT_RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    async fn wait_for_services(&self, device: &Device) -> Result<()> {
        let deadline = Instant::now() + self.options.services_resolve_timeout;

        while !device.is_services_resolved().await? {
            if Instant::now() >= deadline {
                bail!(
                    "services of {} not resolved within {:?}",
                    self.address,
                    self.options.services_resolve_timeout
                );
            }
            sleep(timing::SERVICES_RESOLVE_POLL).await;
        }

        Ok(())
    }

    async fn load_characteristics(&mut self, device: &Device) -> Result<()> {
        self.characteristics.clear();
        for service in device.services().await? {
            for characteristic in service.characteristics().await? {
                let uuid = characteristic.uuid().await?;
                self.characteristics.insert(uuid, characteristic);
            }
        }
        debug!(
            "{} exposes {} characteristics",
            self.address,
            self.characteristics.len()
        );
        Ok(())
    }

    fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or_else(|| anyhow!("characteristic {} not found on {}", uuid, self.address))
    }
}

#[async_trait]
impl GattTransport for BluezTransport {
    async fn connect(&mut self) -> Result<()> {
        let device = match &self.link {
            Link::Cached(device) => {
                // Keep the handle first so a half-open link is still torn down.
                self.device = Some(device.clone());
                self.connect_cached(device).await?;
                device.clone()
            }
            Link::Direct(adapter) => {
                let device = adapter
                    .connect_device(self.address.into(), AddressType::LePublic)
                    .await?;
                self.device = Some(device.clone());
                device
            }
        };

        self.wait_for_services(&device).await?;
        self.load_characteristics(&device).await?;
        info!("Connected to {}", self.address);
        Ok(())
    }

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        self.characteristic(characteristic)?.write(data).await?;
        debug!("Wrote {} bytes to {} on {}", data.len(), characteristic, self.address);
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: Uuid, callback: NotifyCallback) -> Result<()> {
        let target = self.characteristic(characteristic)?.clone();
        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let stream = match target.notify().await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            futures::pin_mut!(stream);

            while let Some(value) = stream.next().await {
                callback(&value);
            }
        });

        ready_rx
            .await
            .map_err(|_| anyhow!("notification task for {} ended early", characteristic))??;

        if let Some(previous) = self.subscriptions.insert(characteristic, handle) {
            previous.abort();
        }
        debug!("Subscribed to {} on {}", characteristic, self.address);
        Ok(())
    }

    async fn unsubscribe(&mut self, characteristic: Uuid) -> Result<()> {
        // Dropping the notification stream stops notifications in BlueZ.
        if let Some(handle) = self.subscriptions.remove(&characteristic) {
            handle.abort();
            debug!("Unsubscribed from {} on {}", characteristic, self.address);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        for (_, handle) in self.subscriptions.drain() {
            handle.abort();
        }
        self.characteristics.clear();

        let Some(device) = self.device.take() else {
            return Ok(());
        };

        if device.is_connected().await? {
            device.disconnect().await?;
            info!("Disconnected from {}", self.address);
        }
        Ok(())
    }
}

impl Drop for BluezTransport {
    fn drop(&mut self) {
        for (_, handle) in self.subscriptions.drain() {
            handle.abort();
        }

        // Dropped without disconnect(): release the link in the background.
        let Some(device) = self.device.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("{} dropped outside a runtime, link left to BlueZ", self.address);
            return;
        };
        let address = self.address;
        runtime.spawn(async move {
            match device.disconnect().await {
                Ok(()) => info!("Disconnected from {} after cancelled exchange", address),
                Err(e) => debug!("Background disconnect of {} failed: {}", address, e),
            }
        });
    }
}
