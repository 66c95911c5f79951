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

//! Transport abstraction shared by every connection strategy.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::address::DeviceAddress;

/// Callback invoked with the raw bytes of each notification.
pub type NotifyCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A GATT link to one light.
///
/// A transport is handed out unconnected. Whoever obtained it must call
/// [`GattTransport::disconnect`] once, whatever happened in between.
#[async_trait]
pub trait GattTransport: Send {
    /// Establish the link and resolve services.
    async fn connect(&mut self) -> Result<()>;

    /// Write `data` to a characteristic.
    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<()>;

    /// Start delivering notifications from a characteristic to `callback`.
    async fn subscribe(&mut self, characteristic: Uuid, callback: NotifyCallback) -> Result<()>;

    /// Stop delivering notifications from a characteristic.
    async fn unsubscribe(&mut self, characteristic: Uuid) -> Result<()>;

    /// Tear the link down. Safe to call when `connect` failed or never ran.
    async fn disconnect(&mut self) -> Result<()>;
}

/// One way of obtaining a transport for an address.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Return a transport if this strategy applies to `address`, or `None`
    /// so the next strategy is tried.
    async fn open(&self, address: DeviceAddress) -> Result<Option<Box<dyn GattTransport>>>;
}
