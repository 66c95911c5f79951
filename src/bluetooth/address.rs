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

//! Hardware address of a light.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons an address string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be 17 characters (AA:BB:CC:DD:EE:FF), got {0}")]
    Length(usize),
    #[error("address must have six colon-separated octets")]
    Separators,
    #[error("invalid hex octet '{0}'")]
    Octet(String),
}

/// Six-octet Bluetooth device address, e.g. `A4:C1:38:12:34:56`.
///
/// Identifies a light for its whole lifetime and keys any pending
/// status wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress {
    octets: [u8; 6],
}

impl DeviceAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self { octets }
    }

    pub fn octets(&self) -> [u8; 6] {
        self.octets
    }

    /// Stable identifier safe for use in file names and keys.
    pub fn unique_id(&self) -> String {
        self.to_string().replace(':', "_")
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressError;

    /// Parse user input. Surrounding whitespace is ignored and hex digits
    /// may be either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        if normalized.len() != 17 {
            return Err(AddressError::Length(normalized.len()));
        }

        let parts: Vec<&str> = normalized.split(':').collect();
        if parts.len() != 6 {
            return Err(AddressError::Separators);
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(AddressError::Separators);
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| AddressError::Octet(part.to_string()))?;
        }

        Ok(Self { octets })
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceAddress> for String {
    fn from(address: DeviceAddress) -> Self {
        address.to_string()
    }
}

impl From<DeviceAddress> for bluer::Address {
    fn from(address: DeviceAddress) -> Self {
        bluer::Address::new(address.octets)
    }
}

impl From<bluer::Address> for DeviceAddress {
    fn from(address: bluer::Address) -> Self {
        Self::new(address.0)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.octets;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}
