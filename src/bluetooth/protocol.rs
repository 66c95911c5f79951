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

//! Frame codec for the NEEWER light protocol.
//!
//! Every frame is `[0x78, tag, length, payload..., checksum]` where the
//! checksum is the sum of all preceding bytes truncated to one byte.

use std::borrow::Cow;
use std::fmt;

use super::ble_constants::tags;

/// Bytes before the payload: sync, tag, length.
const HEADER_LEN: usize = 3;

/// Power state carried by power commands and status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Map a status payload byte to a power state.
    pub fn from_status_byte(value: u8) -> Option<Self> {
        match value {
            tags::STATE_ON => Some(Self::On),
            tags::STATE_OFF => Some(Self::Off),
            _ => None,
        }
    }

    /// Wire value used in both command and status payloads.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::On => tags::STATE_ON,
            Self::Off => tags::STATE_OFF,
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Pre-encoded power command for this state.
    pub fn command(self) -> CommandFrame {
        match self {
            Self::On => POWER_ON,
            Self::Off => POWER_OFF,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl From<bool> for PowerState {
    fn from(is_on: bool) -> Self {
        if is_on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// An encoded frame. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandFrame {
    bytes: Cow<'static, [u8]>,
}

impl CommandFrame {
    const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
        }
    }

    /// Raw bytes as written to the characteristic.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn tag(&self) -> u8 {
        self.bytes[1]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..self.bytes.len() - 1]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Sum of `bytes` modulo 256.
pub const fn checksum(bytes: &[u8]) -> u8 {
    let mut sum: u8 = 0;
    let mut i = 0;
    while i < bytes.len() {
        sum = sum.wrapping_add(bytes[i]);
        i += 1;
    }
    sum
}

const fn power_frame(value: u8) -> [u8; 5] {
    let head = [tags::SYNC, tags::POWER, 1, value];
    [head[0], head[1], head[2], head[3], checksum(&head)]
}

const POWER_ON_BYTES: [u8; 5] = power_frame(tags::STATE_ON);
const POWER_OFF_BYTES: [u8; 5] = power_frame(tags::STATE_OFF);

/// `78 81 01 01 FB`
pub const POWER_ON: CommandFrame = CommandFrame::from_static(&POWER_ON_BYTES);

/// `78 81 01 02 FC`
pub const POWER_OFF: CommandFrame = CommandFrame::from_static(&POWER_OFF_BYTES);

/// Build a frame for `tag` carrying `payload`.
///
/// # Panics
///
/// Panics if the payload does not fit the one-byte length field.
pub fn encode(tag: u8, payload: &[u8]) -> CommandFrame {
    let length = u8::try_from(payload.len()).expect("frame payload exceeds 255 bytes");

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
    bytes.push(tags::SYNC);
    bytes.push(tag);
    bytes.push(length);
    bytes.extend_from_slice(payload);
    bytes.push(checksum(&bytes));

    CommandFrame {
        bytes: Cow::Owned(bytes),
    }
}

/// Build the status report a light sends for `state`.
pub fn encode_status(state: PowerState) -> CommandFrame {
    encode(tags::STATUS, &[state.as_byte()])
}

/// Parse a status notification.
///
/// Returns `None` for anything that is not a status report with a known
/// state byte. Other traffic may share the characteristic, so this is not
/// an error.
pub fn decode_status(raw: &[u8]) -> Option<PowerState> {
    if raw.len() < HEADER_LEN + 1 || raw[1] != tags::STATUS {
        return None;
    }
    PowerState::from_status_byte(raw[HEADER_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_constants() {
        assert_eq!(POWER_ON.as_bytes(), &[0x78, 0x81, 0x01, 0x01, 0xFB]);
        assert_eq!(POWER_OFF.as_bytes(), &[0x78, 0x81, 0x01, 0x02, 0xFC]);
        assert_eq!(encode(tags::POWER, &[tags::STATE_ON]), POWER_ON);
        assert_eq!(encode(tags::POWER, &[tags::STATE_OFF]), POWER_OFF);
    }

    #[test]
    fn test_checksum_law() {
        for tag in [0x00, 0x02, 0x81, 0xFF] {
            for payload in [&[][..], &[0x01], &[0xFF, 0xFF, 0xFF], &[0x10; 40]] {
                let frame = encode(tag, payload);
                let bytes = frame.as_bytes();
                let expected = bytes[..bytes.len() - 1]
                    .iter()
                    .map(|b| *b as u32)
                    .sum::<u32>()
                    % 256;

                assert_eq!(frame.checksum() as u32, expected);
                assert_eq!(frame.len(), payload.len() + 4);
                assert_eq!(bytes[2] as usize, payload.len());
                assert_eq!(frame.tag(), tag);
                assert_eq!(frame.payload(), payload);
            }
        }
    }

    #[test]
    fn test_status_frame_layout() {
        let frame = encode_status(PowerState::On);
        assert_eq!(frame.as_bytes(), &[0x78, 0x02, 0x01, 0x01, 0x7C]);
        assert_eq!(decode_status(frame.as_bytes()), Some(PowerState::On));

        let frame = encode_status(PowerState::Off);
        assert_eq!(decode_status(frame.as_bytes()), Some(PowerState::Off));
    }

    #[test]
    fn test_decode_rejects_short_input() {
        assert_eq!(decode_status(&[]), None);
        assert_eq!(decode_status(&[0x78, 0x02, 0x01]), None);
    }

    #[test]
    fn test_decode_rejects_other_tags() {
        assert_eq!(decode_status(POWER_ON.as_bytes()), None);
        assert_eq!(decode_status(&[0x78, 0x03, 0x01, 0x01, 0x7D]), None);
    }

    #[test]
    fn test_decode_rejects_unknown_state() {
        assert_eq!(decode_status(&[0x78, 0x02, 0x01, 0x00, 0x7B]), None);
        assert_eq!(decode_status(&[0x78, 0x02, 0x01, 0x03, 0x7E]), None);
    }

    #[test]
    fn test_decode_ignores_checksum_and_trailing_bytes() {
        // Four bytes are enough; the light's checksum is not verified.
        assert_eq!(decode_status(&[0x78, 0x02, 0x01, 0x01]), Some(PowerState::On));
        assert_eq!(
            decode_status(&[0x78, 0x02, 0x01, 0x02, 0x00, 0xAA]),
            Some(PowerState::Off)
        );
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(POWER_OFF.to_string(), "78 81 01 02 FC");
    }
}
