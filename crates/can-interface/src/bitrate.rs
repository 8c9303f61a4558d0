//! Nominal CAN Bus Bit Rates

use crate::error::CanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal CAN bus bit rates understood by the adapter backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitrate {
    /// 1 Mbit/s
    Mbit1,
    /// 800 kbit/s
    Kbit800,
    /// 500 kbit/s
    Kbit500,
    /// 400 kbit/s
    Kbit400,
    /// 250 kbit/s
    Kbit250,
    /// 200 kbit/s
    Kbit200,
    /// 125 kbit/s
    Kbit125,
    /// 100 kbit/s
    Kbit100,
    /// 50 kbit/s
    Kbit50,
    /// 20 kbit/s
    Kbit20,
    /// 10 kbit/s
    Kbit10,
    /// 5 kbit/s
    Kbit5,
}

impl Bitrate {
    /// Every nominal rate, fastest first
    pub const ALL: [Bitrate; 12] = [
        Bitrate::Mbit1,
        Bitrate::Kbit800,
        Bitrate::Kbit500,
        Bitrate::Kbit400,
        Bitrate::Kbit250,
        Bitrate::Kbit200,
        Bitrate::Kbit125,
        Bitrate::Kbit100,
        Bitrate::Kbit50,
        Bitrate::Kbit20,
        Bitrate::Kbit10,
        Bitrate::Kbit5,
    ];

    /// Get the rate in bits per second
    pub fn bits_per_second(&self) -> u32 {
        match self {
            Bitrate::Mbit1 => 1_000_000,
            Bitrate::Kbit800 => 800_000,
            Bitrate::Kbit500 => 500_000,
            Bitrate::Kbit400 => 400_000,
            Bitrate::Kbit250 => 250_000,
            Bitrate::Kbit200 => 200_000,
            Bitrate::Kbit125 => 125_000,
            Bitrate::Kbit100 => 100_000,
            Bitrate::Kbit50 => 50_000,
            Bitrate::Kbit20 => 20_000,
            Bitrate::Kbit10 => 10_000,
            Bitrate::Kbit5 => 5_000,
        }
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = CanError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Bitrate::ALL
            .into_iter()
            .find(|rate| rate.bits_per_second() == bps)
            .ok_or(CanError::InvalidBitrate(bps))
    }
}

impl From<Bitrate> for u32 {
    fn from(rate: Bitrate) -> Self {
        rate.bits_per_second()
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.bits_per_second();
        if bps >= 1_000_000 {
            write!(f, "{} Mbit/s", bps / 1_000_000)
        } else {
            write!(f, "{} kbit/s", bps / 1_000)
        }
    }
}
