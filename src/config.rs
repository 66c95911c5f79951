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

//! Configuration module.
//!
//! Handles loading and saving the list of lights and connection settings.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::ble_constants::timing;
use crate::bluetooth::bluez::LinkOptions;
use crate::bluetooth::{DeviceAddress, ExchangeOptions};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File this configuration was loaded from.
    #[serde(skip)]
    pub path: PathBuf,

    /// Bluetooth settings.
    #[serde(default)]
    pub bluetooth: BluetoothConfig,

    /// Configured lights, one controller each.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name such as "hci0". The default adapter is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,

    /// How long to wait for the light to report its state, in milliseconds.
    pub notify_timeout_ms: u64,

    /// Wait for a status report after each command.
    pub await_status: bool,

    /// Connection attempts when BlueZ already knows the light.
    pub connect_attempts: u32,

    /// How long to wait for service discovery, in milliseconds.
    pub services_resolve_timeout_ms: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            notify_timeout_ms: timing::NOTIFY_TIMEOUT.as_millis() as u64,
            await_status: true,
            connect_attempts: timing::CONNECT_ATTEMPTS,
            services_resolve_timeout_ms: timing::SERVICES_RESOLVE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BluetoothConfig {
    pub fn exchange_options(&self) -> ExchangeOptions {
        ExchangeOptions {
            notify_timeout: Duration::from_millis(self.notify_timeout_ms),
            await_status: self.await_status,
        }
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            connect_attempts: self.connect_attempts,
            services_resolve_timeout: Duration::from_millis(self.services_resolve_timeout_ms),
        }
    }
}

/// One configured light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub address: DeviceAddress,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DeviceConfig {
    fn matches(&self, selector: &str) -> bool {
        if let Ok(address) = selector.parse::<DeviceAddress>() {
            return address == self.address;
        }
        self.name
            .as_deref()
            .map(|name| name.eq_ignore_ascii_case(selector.trim()))
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            bluetooth: BluetoothConfig::default(),
            devices: Vec::new(),
        }
    }
}

impl Config {
    /// `<config dir>/neewer-gl1/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neewer-gl1")
            .join("config.toml")
    }

    /// Load configuration from the default location or create it.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from `path`, writing defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            config.validate()?;
            config
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            config
        };

        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Save configuration to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Reject configurations that list a light twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.address) {
                bail!("device {} is configured more than once", device.address);
            }
        }
        Ok(())
    }

    /// Add a light from a user-entered address.
    pub fn add_device(&mut self, address: &str, name: Option<String>) -> Result<&DeviceConfig> {
        let address: DeviceAddress = address
            .parse()
            .with_context(|| format!("invalid address '{}'", address.trim()))?;

        if self.devices.iter().any(|d| d.address == address) {
            bail!("device {} is already configured", address);
        }

        self.devices.push(DeviceConfig { address, name });
        Ok(&self.devices[self.devices.len() - 1])
    }

    /// Remove the light matching `selector` (address or name).
    pub fn remove_device(&mut self, selector: &str) -> Result<DeviceConfig> {
        let index = self
            .devices
            .iter()
            .position(|d| d.matches(selector))
            .ok_or_else(|| anyhow!("no configured device matches '{}'", selector))?;
        Ok(self.devices.remove(index))
    }

    /// Find a light by address or name. With no selector, the only
    /// configured light is chosen.
    pub fn find_device(&self, selector: Option<&str>) -> Result<&DeviceConfig> {
        match selector {
            Some(selector) => self
                .devices
                .iter()
                .find(|d| d.matches(selector))
                .ok_or_else(|| anyhow!("no configured device matches '{}'", selector)),
            None => match self.devices.as_slice() {
                [device] => Ok(device),
                [] => bail!("no devices configured, add one with `neewer-gl1 add <ADDRESS>`"),
                _ => bail!("several devices configured, name one"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.path, path);
        assert!(config.devices.is_empty());
        assert_eq!(config.bluetooth.notify_timeout_ms, 5000);
        assert!(config.bluetooth.await_status);
        assert_eq!(config.bluetooth.exchange_options().notify_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from(&path).unwrap();
        config.add_device(" a4:c1:38:0f:ee:01", Some("Desk".into())).unwrap();
        config.add_device("A4:C1:38:0F:EE:02", None).unwrap();
        config.bluetooth.adapter = Some("hci1".into());
        config.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.devices, config.devices);
        assert_eq!(reloaded.bluetooth.adapter.as_deref(), Some("hci1"));
        assert_eq!(reloaded.devices[0].address.to_string(), "A4:C1:38:0F:EE:01");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bluetooth]\nnotify_timeout_ms = 1500\n\n[[devices]]\naddress = \"A4:C1:38:0F:EE:01\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bluetooth.notify_timeout_ms, 1500);
        assert_eq!(config.bluetooth.connect_attempts, 3);
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].name, None);
    }

    #[test]
    fn test_rejects_invalid_address_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[devices]]\naddress = \"not-an-address\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_rejects_duplicate_devices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[devices]]\naddress = \"A4:C1:38:0F:EE:01\"\n\n[[devices]]\naddress = \"a4:c1:38:0f:ee:01\"\n",
        )
        .unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_add_device_validation() {
        let mut config = Config::default();
        assert!(config.add_device("A4:C1:38:0F:EE", None).is_err());
        assert!(config.add_device("A4:C1:38:0F:EE:01", None).is_ok());
        assert!(config.add_device("a4:c1:38:0f:ee:01", None).is_err());
        assert_eq!(config.devices.len(), 1);
    }

    #[test]
    fn test_find_and_remove() {
        let mut config = Config::default();
        assert!(config.find_device(None).is_err());

        config.add_device("A4:C1:38:0F:EE:01", Some("Desk".into())).unwrap();
        assert_eq!(config.find_device(None).unwrap().name.as_deref(), Some("Desk"));

        config.add_device("A4:C1:38:0F:EE:02", Some("Shelf".into())).unwrap();
        assert!(config.find_device(None).is_err());
        assert_eq!(
            config.find_device(Some("shelf")).unwrap().address.to_string(),
            "A4:C1:38:0F:EE:02"
        );
        assert_eq!(
            config.find_device(Some("a4:c1:38:0f:ee:01")).unwrap().name.as_deref(),
            Some("Desk")
        );
        assert!(config.find_device(Some("Lamp")).is_err());

        let removed = config.remove_device("Desk").unwrap();
        assert_eq!(removed.address.to_string(), "A4:C1:38:0F:EE:01");
        assert_eq!(config.devices.len(), 1);
        assert!(config.remove_device("Desk").is_err());
    }
}
