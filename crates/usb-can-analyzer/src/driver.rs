//! USB-CAN Analyzer Driver
//!
//! Composes a byte transport with the command/frame encoders and the stream
//! demultiplexer behind the `CanInterface` contract.

use crate::command::{AdapterConfig, AdapterFrameType, AdapterMode, AdapterSpeed};
use crate::demux::{IdentifierRule, StreamDemux};
use crate::encoder::encode_frame;
use crate::transport::{ByteTransport, SerialTransport};
use async_trait::async_trait;
use can_interface::{Bitrate, CanError, CanInterface, Frame};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Backend name used in logs and errors
pub const BACKEND_NAME: &str = "usb-can";

/// Bit rates this driver accepts at open
pub const SUPPORTED_BITRATES: [Bitrate; 8] = [
    Bitrate::Mbit1,
    Bitrate::Kbit500,
    Bitrate::Kbit400,
    Bitrate::Kbit200,
    Bitrate::Kbit100,
    Bitrate::Kbit50,
    Bitrate::Kbit20,
    Bitrate::Kbit10,
];

/// Default pause after configuring the adapter
const DEFAULT_SETTLE_MS: u64 = 100;

/// Adapter settings applied at open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbCanConfig {
    /// Operating mode
    pub mode: AdapterMode,
    /// Frame type filter
    pub frame_type: AdapterFrameType,
    /// Firmware settle delay after the configuration command (milliseconds)
    pub settle_ms: u64,
    /// Identifier decoding for inbound frames
    pub identifier_rule: IdentifierRule,
}

impl Default for UsbCanConfig {
    fn default() -> Self {
        Self {
            mode: AdapterMode::Normal,
            frame_type: AdapterFrameType::Standard,
            settle_ms: DEFAULT_SETTLE_MS,
            identifier_rule: IdentifierRule::LittleEndian,
        }
    }
}

impl UsbCanConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Driver for USB-CAN analyzer adapters
pub struct UsbCan<T> {
    /// Byte link to the adapter
    transport: T,
    /// Inbound parser state, kept across receive calls
    demux: StreamDemux,
    /// Settings applied at open
    config: UsbCanConfig,
    /// Whether open has completed
    open: bool,
}

impl UsbCan<SerialTransport> {
    /// Create a driver on a serial device
    ///
    /// The analyzer firmware expects `DEFAULT_SERIAL_BAUD`.
    pub fn open_serial(path: &str, baud_rate: u32, config: UsbCanConfig) -> Result<Self, CanError> {
        let transport = SerialTransport::open(path, baud_rate)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: ByteTransport> UsbCan<T> {
    /// Create a driver over an already connected transport
    pub fn new(transport: T, config: UsbCanConfig) -> Self {
        Self {
            demux: StreamDemux::with_rule(config.identifier_rule),
            transport,
            config,
            open: false,
        }
    }

    /// Map a nominal bit rate to the adapter speed code
    pub fn adapter_speed(bitrate: Bitrate) -> Result<AdapterSpeed, CanError> {
        if !SUPPORTED_BITRATES.contains(&bitrate) {
            return Err(CanError::UnsupportedBitrate {
                backend: BACKEND_NAME,
                bitrate,
            });
        }
        Ok(AdapterSpeed::from_bitrate(bitrate))
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn config(&self) -> &UsbCanConfig {
        &self.config
    }

    pub fn demux(&self) -> &StreamDemux {
        &self.demux
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn ensure_open(&self) -> Result<(), CanError> {
        if self.open {
            Ok(())
        } else {
            Err(CanError::NotOpen)
        }
    }
}

#[async_trait]
impl<T: ByteTransport> CanInterface for UsbCan<T> {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn open(&mut self, bitrate: Bitrate) -> Result<(), CanError> {
        let speed = Self::adapter_speed(bitrate)?;
        let command = AdapterConfig {
            speed,
            frame_type: self.config.frame_type,
            mode: self.config.mode,
        }
        .encode();

        info!(
            "Configuring USB-CAN adapter: {} ({:?}, {:?})",
            bitrate, self.config.mode, self.config.frame_type
        );
        debug!("Configuration command: {:02X?}", command);
        self.transport.write(&command).await?;

        let echoed = self.transport.drain().await?;
        debug!("Drained {} bytes of adapter echo", echoed);

        tokio::time::sleep(self.config.settle_delay()).await;

        self.demux.reset();
        self.open = true;
        info!("USB-CAN adapter ready");
        Ok(())
    }

    async fn send(&mut self, frame: &Frame) -> Result<(), CanError> {
        self.ensure_open()?;
        let packet = encode_frame(frame)?;
        trace!("TX id=0x{:X} {:02X?}", frame.id, frame.data());
        self.transport.write(&packet).await
    }

    async fn receive(&mut self, blocking: bool) -> Result<Option<Frame>, CanError> {
        self.ensure_open()?;
        loop {
            if !blocking && !self.transport.has_data()? {
                return Ok(None);
            }
            let byte = self.transport.read_byte().await?;
            if let Some(frame) = self.demux.push(byte) {
                trace!("RX id=0x{:X} {:02X?}", frame.id, frame.data());
                return Ok(Some(frame));
            }
        }
    }

    async fn close(&mut self) -> Result<(), CanError> {
        if self.open {
            info!("Closing USB-CAN adapter");
        }
        self.open = false;
        self.demux.reset();
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use can_interface::FrameType;

    const SCENARIO_A: [u8; 13] = [
        0xAA, 0xC8, 0x02, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x55,
    ];

    async fn opened(input: &[u8]) -> UsbCan<MemoryTransport> {
        let mut can = UsbCan::new(MemoryTransport::new(), UsbCanConfig::default());
        can.open(Bitrate::Kbit500).await.unwrap();
        can.transport_mut().take_written();
        can.transport_mut().push_input(input);
        can
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_writes_command_and_settles() {
        let echo = AdapterConfig {
            speed: AdapterSpeed::Speed1000k,
            frame_type: AdapterFrameType::Standard,
            mode: AdapterMode::Normal,
        }
        .encode();
        let mut can = UsbCan::new(MemoryTransport::with_input(&echo), UsbCanConfig::default());

        let start = tokio::time::Instant::now();
        can.open(Bitrate::Mbit1).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(can.is_open());
        assert_eq!(can.transport().written(), &echo);
        assert_eq!(can.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_bitrate_fails_before_io() {
        let mut can = UsbCan::new(MemoryTransport::new(), UsbCanConfig::default());
        for bitrate in [Bitrate::Kbit800, Bitrate::Kbit250, Bitrate::Kbit125, Bitrate::Kbit5] {
            let err = can.open(bitrate).await.unwrap_err();
            assert!(err.is_configuration());
        }
        assert!(can.transport().written().is_empty());
        assert!(!can.is_open());
    }

    #[tokio::test]
    async fn test_not_open() {
        let mut can = UsbCan::new(MemoryTransport::new(), UsbCanConfig::default());
        let frame = Frame::standard(0x100, &[1]).unwrap();
        assert!(matches!(can.send(&frame).await, Err(CanError::NotOpen)));
        assert!(matches!(can.receive(false).await, Err(CanError::NotOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_writes_packet() {
        let mut can = opened(&[]).await;
        let frame = Frame::standard(0x0102, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        can.send(&frame).await.unwrap();
        assert_eq!(can.transport().written(), &SCENARIO_A);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_error_frame_rejected() {
        let mut can = opened(&[]).await;
        let frame = Frame::new(0x1, &[], FrameType::Error).unwrap();
        assert!(can.send(&frame).await.unwrap_err().is_configuration());
        assert!(can.transport().written().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonblocking_idle_returns_none() {
        let mut can = opened(&[]).await;
        assert!(can.receive(false).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_split_across_calls() {
        let mut can = opened(&SCENARIO_A[..5]).await;
        assert!(can.receive(false).await.unwrap().is_none());
        assert_eq!(can.demux().pending(), &SCENARIO_A[..5]);

        can.transport_mut().push_input(&SCENARIO_A[5..]);
        let frame = can.receive(false).await.unwrap().unwrap();
        assert_eq!(frame.id, 0x0102);
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_receive_skips_noise() {
        let mut input = vec![0x00, 0x13, 0x55];
        input.extend_from_slice(&SCENARIO_A);
        let mut can = opened(&input).await;
        let frame = can.receive(true).await.unwrap().unwrap();
        assert_eq!(frame.data, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_receive_fails_when_link_closes() {
        let mut can = opened(&SCENARIO_A[..4]).await;
        let err = can.receive(true).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_resets_state() {
        let mut can = opened(&SCENARIO_A[..3]).await;
        assert!(can.receive(false).await.unwrap().is_none());
        can.close().await.unwrap();
        assert!(!can.is_open());
        assert!(can.demux().pending().is_empty());
        assert!(can.transport().is_closed());
    }

    #[test]
    fn test_config_defaults() {
        let config = UsbCanConfig::default();
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
        assert_eq!(config.mode, AdapterMode::Normal);
        assert_eq!(config.identifier_rule, IdentifierRule::LittleEndian);
    }
}
