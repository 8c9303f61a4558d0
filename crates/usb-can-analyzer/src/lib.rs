//! USB-CAN Analyzer Protocol Implementation
//!
//! This crate talks to low-cost USB-to-CAN analyzer adapters over a raw
//! serial link. Outbound frames and configuration commands are encoded into
//! fixed-size packets; the inbound byte stream has no reliable framing and is
//! decoded by a resynchronizing state machine.

mod command;
mod demux;
mod driver;
mod encoder;
mod transport;

pub use command::{checksum, AdapterConfig, AdapterFrameType, AdapterMode, AdapterSpeed};
pub use demux::{frame_complete, DemuxState, IdentifierRule, StreamDemux, BUFFER_CAPACITY};
pub use driver::{UsbCan, UsbCanConfig, BACKEND_NAME, SUPPORTED_BITRATES};
pub use encoder::encode_frame;
pub use transport::{ByteTransport, MemoryTransport, SerialTransport, DEFAULT_SERIAL_BAUD};

/// Wire format constants
pub mod wire {
    /// Start-of-packet marker for every packet
    pub const HEADER: u8 = 0xAA;
    /// Second byte of a configuration packet, trailer of a data packet
    pub const MARKER: u8 = 0x55;
    /// Configuration command type
    pub const CONFIG_TYPE: u8 = 0x12;
    /// Length of a configuration command or echo
    pub const COMMAND_LEN: usize = 20;
    /// Length of an outbound data packet
    pub const DATA_PACKET_LEN: usize = 13;
    /// Header, descriptor, two identifier bytes, trailer
    pub const DATA_OVERHEAD: usize = 5;
    /// High nibble of a data packet descriptor
    pub const DATA_NIBBLE: u8 = 0xC;
    /// Descriptor bit flagging an extended frame
    pub const EXTENDED_BIT: u8 = 0x20;
}
