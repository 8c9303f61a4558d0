//! FFI Bindings for the PCAN-Basic Library
//!
//! The vendor library owns the USB/PCI device and the CAN controller; this
//! module exposes its C structures and status codes, and wraps the handful
//! of entry points the driver needs behind the `PcanApi` trait so the
//! driver can run against a stand-in when the library is not linked.

/// Channel handle of the first PCAN-USB adapter
pub const PCAN_USBBUS1: u16 = 0x51;

/// Message type flags (`MSGTYPE`)
pub mod msg_type {
    pub const STANDARD: u8 = 0x00;
    pub const RTR: u8 = 0x01;
    pub const EXTENDED: u8 = 0x02;
    pub const ERRFRAME: u8 = 0x40;
    pub const STATUS: u8 = 0x80;
}

/// BTR0/BTR1 bit-timing register values
pub mod baud {
    pub const BAUD_1M: u16 = 0x0014;
    pub const BAUD_800K: u16 = 0x0016;
    pub const BAUD_500K: u16 = 0x001C;
    pub const BAUD_250K: u16 = 0x011C;
    pub const BAUD_125K: u16 = 0x031C;
    pub const BAUD_100K: u16 = 0x432F;
    pub const BAUD_50K: u16 = 0x472F;
    pub const BAUD_20K: u16 = 0x532F;
    pub const BAUD_10K: u16 = 0x672F;
    pub const BAUD_5K: u16 = 0x7F7F;
}

/// CAN message as laid out by PCAN-Basic (`TPCANMsg`)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcanMsg {
    pub id: u32,
    pub msg_type: u8,
    pub len: u8,
    pub data: [u8; 8],
}

/// Receive timestamp (`TPCANTimestamp`)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PcanTimestamp {
    pub millis: u32,
    pub millis_overflow: u16,
    pub micros: u16,
}

/// Status codes returned by every PCAN-Basic call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcanStatus {
    Ok,
    TransmitFull,
    Overrun,
    BusLight,
    BusHeavy,
    BusOff,
    ReceiveEmpty,
    QueueOverrun,
    QueueTransmitFull,
    NoDriver,
    HardwareInUse,
    IllegalHardware,
    IllegalParameterValue,
    Initialize,
    Unknown(u32),
}

impl PcanStatus {
    pub const OK: u32 = 0x0000_0000;
    pub const QRCVEMPTY: u32 = 0x0000_0020;

    pub fn is_ok(&self) -> bool {
        *self == PcanStatus::Ok
    }
}

impl From<u32> for PcanStatus {
    fn from(code: u32) -> Self {
        match code {
            0x0000_0000 => Self::Ok,
            0x0000_0001 => Self::TransmitFull,
            0x0000_0002 => Self::Overrun,
            0x0000_0004 => Self::BusLight,
            0x0000_0008 => Self::BusHeavy,
            0x0000_0010 => Self::BusOff,
            0x0000_0020 => Self::ReceiveEmpty,
            0x0000_0040 => Self::QueueOverrun,
            0x0000_0080 => Self::QueueTransmitFull,
            0x0000_0200 => Self::NoDriver,
            0x0000_0400 => Self::HardwareInUse,
            0x0000_1400 => Self::IllegalHardware,
            0x0000_8000 => Self::IllegalParameterValue,
            0x0400_0000 => Self::Initialize,
            other => Self::Unknown(other),
        }
    }
}

/// Entry points of the adapter library used by the driver
///
/// Every call returns the library's raw status word.
pub trait PcanApi: Send {
    fn initialize(&mut self, channel: u16, btr0btr1: u16) -> u32;

    fn uninitialize(&mut self, channel: u16) -> u32;

    /// Pop one message from the receive queue
    fn read(&mut self, channel: u16, msg: &mut PcanMsg) -> u32;

    fn write(&mut self, channel: u16, msg: &PcanMsg) -> u32;

    /// Human-readable text for a status word
    fn status_text(&self, status: u32) -> String {
        format!("{:?}", PcanStatus::from(status))
    }
}

#[cfg(feature = "ffi")]
mod native {
    use super::{PcanMsg, PcanTimestamp};
    use libc::c_char;

    // Linked via build.rs
    extern "system" {
        pub fn CAN_Initialize(
            channel: u16,
            btr0btr1: u16,
            hw_type: u8,
            io_port: u32,
            interrupt: u16,
        ) -> u32;
        pub fn CAN_Uninitialize(channel: u16) -> u32;
        pub fn CAN_Read(channel: u16, msg: *mut PcanMsg, timestamp: *mut PcanTimestamp) -> u32;
        pub fn CAN_Write(channel: u16, msg: *mut PcanMsg) -> u32;
        pub fn CAN_GetErrorText(error: u32, language: u16, buffer: *mut c_char) -> u32;
    }
}

/// The linked PCAN-Basic library
#[cfg(feature = "ffi")]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePcan;

#[cfg(feature = "ffi")]
impl PcanApi for NativePcan {
    fn initialize(&mut self, channel: u16, btr0btr1: u16) -> u32 {
        // hardware type, port and interrupt only matter for non plug-and-play channels
        unsafe { native::CAN_Initialize(channel, btr0btr1, 0, 0, 0) }
    }

    fn uninitialize(&mut self, channel: u16) -> u32 {
        unsafe { native::CAN_Uninitialize(channel) }
    }

    fn read(&mut self, channel: u16, msg: &mut PcanMsg) -> u32 {
        let mut timestamp = PcanTimestamp::default();
        unsafe { native::CAN_Read(channel, msg, &mut timestamp) }
    }

    fn write(&mut self, channel: u16, msg: &PcanMsg) -> u32 {
        let mut msg = *msg;
        unsafe { native::CAN_Write(channel, &mut msg) }
    }

    fn status_text(&self, status: u32) -> String {
        const ENGLISH: u16 = 0x09;
        let mut buffer = [0 as libc::c_char; 256];
        let ret = unsafe { native::CAN_GetErrorText(status, ENGLISH, buffer.as_mut_ptr()) };
        if ret != PcanStatus::OK {
            return format!("{:?}", PcanStatus::from(status));
        }
        unsafe { std::ffi::CStr::from_ptr(buffer.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}
