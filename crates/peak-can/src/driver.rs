//! PCAN-Basic Driver

use crate::ffi::{baud, msg_type, PcanApi, PcanMsg, PcanStatus, PCAN_USBBUS1};
use async_trait::async_trait;
use can_interface::{Bitrate, CanError, CanInterface, Frame, FrameType, MAX_DLC};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend name used in logs and errors
pub const BACKEND_NAME: &str = "pcan";

/// Receive queue poll interval for blocking reads
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Map a nominal bit rate to the BTR0BTR1 register value
pub fn btr0btr1(bitrate: Bitrate) -> Result<u16, CanError> {
    let value = match bitrate {
        Bitrate::Mbit1 => baud::BAUD_1M,
        Bitrate::Kbit800 => baud::BAUD_800K,
        Bitrate::Kbit500 => baud::BAUD_500K,
        Bitrate::Kbit250 => baud::BAUD_250K,
        Bitrate::Kbit125 => baud::BAUD_125K,
        Bitrate::Kbit100 => baud::BAUD_100K,
        Bitrate::Kbit50 => baud::BAUD_50K,
        Bitrate::Kbit20 => baud::BAUD_20K,
        Bitrate::Kbit10 => baud::BAUD_10K,
        Bitrate::Kbit5 => baud::BAUD_5K,
        Bitrate::Kbit400 | Bitrate::Kbit200 => {
            return Err(CanError::UnsupportedBitrate {
                backend: BACKEND_NAME,
                bitrate,
            })
        }
    };
    Ok(value)
}

/// Convert a received message, skipping RTR and status messages
fn frame_from_msg(msg: &PcanMsg) -> Option<Frame> {
    if msg.msg_type & (msg_type::STATUS | msg_type::RTR) != 0 {
        return None;
    }

    let frame_type = if msg.msg_type & msg_type::ERRFRAME != 0 {
        FrameType::Error
    } else if msg.msg_type & msg_type::EXTENDED != 0 {
        FrameType::Extended
    } else {
        FrameType::Standard
    };

    Some(Frame {
        id: msg.id,
        data: msg.data,
        len: msg.len.min(MAX_DLC as u8),
        frame_type,
    })
}

/// Driver for PEAK adapters through PCAN-Basic
pub struct PcanDevice<A> {
    /// Library entry points
    api: A,
    /// PCAN channel handle
    channel: u16,
    /// Whether the channel is initialized
    open: bool,
}

#[cfg(feature = "ffi")]
impl PcanDevice<crate::ffi::NativePcan> {
    /// Create a driver on a channel of the linked library
    pub fn new(channel: u16) -> Self {
        Self::with_api(crate::ffi::NativePcan, channel)
    }

    /// Create a driver on the first PCAN-USB adapter
    pub fn usb1() -> Self {
        Self::new(PCAN_USBBUS1)
    }
}

impl<A: PcanApi> PcanDevice<A> {
    pub fn with_api(api: A, channel: u16) -> Self {
        info!("Creating PCAN driver for channel 0x{:02X}", channel);
        Self {
            api,
            channel,
            open: false,
        }
    }

    /// Create a driver on the first PCAN-USB adapter
    pub fn usb1_with_api(api: A) -> Self {
        Self::with_api(api, PCAN_USBBUS1)
    }

    pub fn channel(&self) -> u16 {
        self.channel
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    fn check(&self, status: u32) -> Result<(), CanError> {
        if PcanStatus::from(status).is_ok() {
            return Ok(());
        }
        Err(CanError::Native {
            status,
            message: self.api.status_text(status),
        })
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
impl<A: PcanApi> CanInterface for PcanDevice<A> {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn open(&mut self, bitrate: Bitrate) -> Result<(), CanError> {
        let btr = btr0btr1(bitrate)?;
        info!(
            "Initializing PCAN channel 0x{:02X} at {} (BTR0BTR1=0x{:04X})",
            self.channel, bitrate, btr
        );
        let status = self.api.initialize(self.channel, btr);
        self.check(status)?;
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, frame: &Frame) -> Result<(), CanError> {
        self.ensure_open()?;
        let msg_type = match frame.frame_type {
            FrameType::Standard => msg_type::STANDARD,
            FrameType::Extended => msg_type::EXTENDED,
            FrameType::Error => return Err(CanError::UnsupportedFrameType(FrameType::Error)),
        };
        let msg = PcanMsg {
            id: frame.id,
            msg_type,
            len: frame.dlc() as u8,
            data: frame.data,
        };
        let status = self.api.write(self.channel, &msg);
        self.check(status)
    }

    async fn receive(&mut self, blocking: bool) -> Result<Option<Frame>, CanError> {
        self.ensure_open()?;
        loop {
            let mut msg = PcanMsg::default();
            let status = self.api.read(self.channel, &mut msg);

            if status == PcanStatus::OK {
                match frame_from_msg(&msg) {
                    Some(frame) => return Ok(Some(frame)),
                    None => {
                        debug!("Skipping PCAN message type 0x{:02X}", msg.msg_type);
                        continue;
                    }
                }
            }

            // combined words such as BusOff|QRCVEMPTY are errors
            if status == PcanStatus::QRCVEMPTY {
                if !blocking {
                    return Ok(None);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            }

            warn!("PCAN read failed with status 0x{:08X}", status);
            return Err(CanError::Native {
                status,
                message: self.api.status_text(status),
            });
        }
    }

    async fn close(&mut self) -> Result<(), CanError> {
        info!("Releasing PCAN channel 0x{:02X}", self.channel);
        self.open = false;
        let status = self.api.uninitialize(self.channel);
        self.check(status)
    }
}
