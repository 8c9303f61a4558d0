//! Adapter Configuration Command
//!
//! The adapter is configured with a fixed 20-byte command:
//!
//! ```text
//! [0]=AA [1]=55 [2]=12 [3]=speed [4]=frame type [5..=12]=0
//! [13]=mode [14]=01 [15..=18]=0 [19]=checksum
//! ```

use crate::wire::{COMMAND_LEN, CONFIG_TYPE, HEADER, MARKER};
use can_interface::Bitrate;
use serde::{Deserialize, Serialize};

/// Adapter speed codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdapterSpeed {
    Speed1000k = 0x01,
    Speed800k = 0x02,
    Speed500k = 0x03,
    Speed400k = 0x04,
    Speed250k = 0x05,
    Speed200k = 0x06,
    Speed125k = 0x07,
    Speed100k = 0x08,
    Speed50k = 0x09,
    Speed20k = 0x0A,
    Speed10k = 0x0B,
    Speed5k = 0x0C,
}

impl AdapterSpeed {
    /// Get the adapter code for a nominal bit rate
    pub fn from_bitrate(bitrate: Bitrate) -> Self {
        match bitrate {
            Bitrate::Mbit1 => AdapterSpeed::Speed1000k,
            Bitrate::Kbit800 => AdapterSpeed::Speed800k,
            Bitrate::Kbit500 => AdapterSpeed::Speed500k,
            Bitrate::Kbit400 => AdapterSpeed::Speed400k,
            Bitrate::Kbit250 => AdapterSpeed::Speed250k,
            Bitrate::Kbit200 => AdapterSpeed::Speed200k,
            Bitrate::Kbit125 => AdapterSpeed::Speed125k,
            Bitrate::Kbit100 => AdapterSpeed::Speed100k,
            Bitrate::Kbit50 => AdapterSpeed::Speed50k,
            Bitrate::Kbit20 => AdapterSpeed::Speed20k,
            Bitrate::Kbit10 => AdapterSpeed::Speed10k,
            Bitrate::Kbit5 => AdapterSpeed::Speed5k,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Frame type the adapter filters for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AdapterFrameType {
    #[default]
    Standard = 0x01,
    Extended = 0x02,
}

impl AdapterFrameType {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Adapter operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AdapterMode {
    #[default]
    Normal = 0x00,
    Loopback = 0x01,
    Silent = 0x02,
    LoopbackSilent = 0x03,
}

impl AdapterMode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Complete adapter configuration, encoded once at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterConfig {
    pub speed: AdapterSpeed,
    pub frame_type: AdapterFrameType,
    pub mode: AdapterMode,
}

impl AdapterConfig {
    /// Encode the 20-byte configuration command
    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        let mut command = [0u8; COMMAND_LEN];
        command[0] = HEADER;
        command[1] = MARKER;
        command[2] = CONFIG_TYPE;
        command[3] = self.speed.code();
        command[4] = self.frame_type.code();
        command[13] = self.mode.code();
        command[14] = 0x01;
        command[19] = checksum(&command[2..19]);
        command
    }
}

/// Sum of the bytes, truncated to 8 bits
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SPEEDS: [AdapterSpeed; 12] = [
        AdapterSpeed::Speed1000k,
        AdapterSpeed::Speed800k,
        AdapterSpeed::Speed500k,
        AdapterSpeed::Speed400k,
        AdapterSpeed::Speed250k,
        AdapterSpeed::Speed200k,
        AdapterSpeed::Speed125k,
        AdapterSpeed::Speed100k,
        AdapterSpeed::Speed50k,
        AdapterSpeed::Speed20k,
        AdapterSpeed::Speed10k,
        AdapterSpeed::Speed5k,
    ];
    const MODES: [AdapterMode; 4] = [
        AdapterMode::Normal,
        AdapterMode::Loopback,
        AdapterMode::Silent,
        AdapterMode::LoopbackSilent,
    ];
    const FRAME_TYPES: [AdapterFrameType; 2] =
        [AdapterFrameType::Standard, AdapterFrameType::Extended];

    #[test]
    fn test_encode_1m_standard_normal() {
        let config = AdapterConfig {
            speed: AdapterSpeed::Speed1000k,
            frame_type: AdapterFrameType::Standard,
            mode: AdapterMode::Normal,
        };
        assert_eq!(
            config.encode(),
            [
                0xAA, 0x55, 0x12, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x15
            ]
        );
    }

    #[test]
    fn test_speed_codes() {
        assert_eq!(AdapterSpeed::from_bitrate(Bitrate::Kbit500).code(), 0x03);
        assert_eq!(AdapterSpeed::from_bitrate(Bitrate::Kbit5).code(), 0x0C);
        assert_eq!(AdapterSpeed::from_bitrate(Bitrate::Kbit20).code(), 0x0A);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0x00);
    }

    proptest! {
        #[test]
        fn prop_checksum_covers_bytes_2_to_18(
            speed in prop::sample::select(SPEEDS.to_vec()),
            mode in prop::sample::select(MODES.to_vec()),
            frame_type in prop::sample::select(FRAME_TYPES.to_vec()),
        ) {
            let command = AdapterConfig { speed, frame_type, mode }.encode();
            let sum: u32 = command[2..=18].iter().map(|b| *b as u32).sum();
            prop_assert_eq!(command[19] as u32, sum % 256);
            prop_assert_eq!(&command[..3], &[0xAA, 0x55, 0x12]);
            prop_assert!(command[5..13].iter().all(|b| *b == 0));
            prop_assert_eq!(command[14], 0x01);
        }
    }
}
