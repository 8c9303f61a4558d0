//! Monitor configuration

use anyhow::Context;
use can_interface::{Bitrate, Frame, FrameType};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use usb_can_analyzer::{
    AdapterFrameType, AdapterMode, IdentifierRule, UsbCanConfig, DEFAULT_SERIAL_BAUD,
};

/// Settings file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "can-monitor";

/// Prefix of overriding environment variables (`CAN_MONITOR__BITRATE=250000`)
pub const ENV_PREFIX: &str = "CAN_MONITOR";

/// Adapter backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    UsbCan,
    Peak,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// USB-CAN analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbCanSettings {
    /// Serial port device path
    pub port: String,
    /// Serial line rate
    pub baud_rate: u32,
    pub mode: AdapterMode,
    pub frame_type: AdapterFrameType,
    /// Settle delay after configuration (milliseconds)
    pub settle_ms: u64,
    pub identifier_rule: IdentifierRule,
}

impl Default for UsbCanSettings {
    fn default() -> Self {
        let adapter = UsbCanConfig::default();
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_SERIAL_BAUD,
            mode: adapter.mode,
            frame_type: adapter.frame_type,
            settle_ms: adapter.settle_ms,
            identifier_rule: adapter.identifier_rule,
        }
    }
}

impl UsbCanSettings {
    pub fn adapter_config(&self) -> UsbCanConfig {
        UsbCanConfig {
            mode: self.mode,
            frame_type: self.frame_type,
            settle_ms: self.settle_ms,
            identifier_rule: self.identifier_rule,
        }
    }
}

/// PEAK adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakSettings {
    /// PCAN channel handle (0x51 = first USB adapter)
    pub channel: u16,
}

impl Default for PeakSettings {
    fn default() -> Self {
        Self { channel: 0x51 }
    }
}

/// Frame sent once after the channel opens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitSettings {
    pub id: u32,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub extended: bool,
}

impl TransmitSettings {
    pub fn to_frame(&self) -> anyhow::Result<Frame> {
        let frame_type = if self.extended {
            FrameType::Extended
        } else {
            FrameType::Standard
        };
        Frame::new(self.id, &self.data, frame_type).context("invalid transmit frame")
    }
}

/// Top-level monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    /// Nominal CAN bit rate in bit/s
    pub bitrate: Bitrate,
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    pub usb_can: UsbCanSettings,
    pub peak: PeakSettings,
    pub transmit: Option<TransmitSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::UsbCan,
            bitrate: Bitrate::Kbit500,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_frames: None,
            usb_can: UsbCanSettings::default(),
            peak: PeakSettings::default(),
            transmit: None,
        }
    }
}

/// Load settings from a file and `CAN_MONITOR__*` environment variables
///
/// Without an explicit path, `can-monitor.{toml,yaml,json}` in the working
/// directory is used if present.
pub fn load_settings(path: Option<&str>) -> anyhow::Result<Settings> {
    let file = match path {
        Some(path) => File::from(Path::new(path)).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to read monitor settings")?
        .try_deserialize()
        .context("invalid monitor settings")
}
