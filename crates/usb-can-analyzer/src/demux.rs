//! Inbound Stream Demultiplexer
//!
//! The adapter writes configuration echoes and data packets back to back
//! with no length prefix, and the serial link may carry noise. The
//! demultiplexer consumes one byte at a time, resynchronizes on the `0xAA`
//! header, and either yields a decoded frame or silently drops what it has
//! accumulated. Its state outlives a single receive call because a read may
//! deliver only part of a packet.

use crate::command::checksum;
use crate::wire::{COMMAND_LEN, DATA_NIBBLE, DATA_OVERHEAD, HEADER, MARKER};
use can_interface::{Frame, FrameType, MAX_DLC};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Accumulation buffer size; larger than the longest recognized packet
pub const BUFFER_CAPACITY: usize = 100;

/// Smallest packet that can carry a data frame
const MIN_DATA_PACKET: usize = 6;

/// Demultiplexer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    /// Discarding bytes until a header
    Searching,
    /// Collecting the bytes of a packet
    Accumulating,
}

/// How the two identifier bytes of an inbound data packet are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierRule {
    /// `low | high << 8`, the inverse of the encoder
    #[default]
    LittleEndian,
    /// `(high << 8) & low`, as deployed drivers decode it; always 0
    Legacy,
}

impl IdentifierRule {
    pub fn combine(&self, low: u8, high: u8) -> u32 {
        match self {
            IdentifierRule::LittleEndian => u16::from_le_bytes([low, high]) as u32,
            IdentifierRule::Legacy => ((high as u32) << 8) & low as u32,
        }
    }
}

/// Completeness predicate for the bytes accumulated so far
///
/// Unrecognized descriptors count as complete as soon as two bytes are
/// present, which bounds buffer growth on noise.
pub fn frame_complete(packet: &[u8]) -> bool {
    if packet.len() < 2 {
        return false;
    }

    let descriptor = packet[1];
    if descriptor == MARKER {
        packet.len() >= COMMAND_LEN
    } else if descriptor >> 4 == DATA_NIBBLE {
        packet.len() >= (descriptor & 0x0F) as usize + DATA_OVERHEAD
    } else {
        true
    }
}

/// Byte-at-a-time packet decoder
#[derive(Debug, Clone)]
pub struct StreamDemux {
    buffer: [u8; BUFFER_CAPACITY],
    cursor: usize,
    state: DemuxState,
    rule: IdentifierRule,
}

impl StreamDemux {
    /// Create a demultiplexer with the little-endian identifier rule
    pub fn new() -> Self {
        Self::with_rule(IdentifierRule::default())
    }

    pub fn with_rule(rule: IdentifierRule) -> Self {
        Self {
            buffer: [0u8; BUFFER_CAPACITY],
            cursor: 0,
            state: DemuxState::Searching,
            rule,
        }
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    pub fn rule(&self) -> IdentifierRule {
        self.rule
    }

    /// Bytes accumulated towards the current packet
    pub fn pending(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    /// Drop any partial packet and return to searching
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = DemuxState::Searching;
    }

    /// Consume one byte, returning a frame when one completes
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DemuxState::Searching => {
                if byte != HEADER {
                    return None;
                }
                self.buffer[0] = byte;
                self.cursor = 1;
                self.state = DemuxState::Accumulating;
            }
            DemuxState::Accumulating => {
                if self.cursor >= BUFFER_CAPACITY {
                    trace!("demux buffer full, resynchronizing");
                    self.reset();
                    return None;
                }
                self.buffer[self.cursor] = byte;
                self.cursor += 1;
            }
        }

        if !frame_complete(self.pending()) {
            return None;
        }

        let frame = self.decode();
        self.reset();
        frame
    }

    /// Push every byte of `bytes`, collecting the decoded frames
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|b| self.push(*b)).collect()
    }

    fn decode(&self) -> Option<Frame> {
        let packet = self.pending();

        if packet.len() == COMMAND_LEN && packet[0] == HEADER && packet[1] == MARKER {
            let expected = checksum(&packet[2..19]);
            let actual = packet[19];
            if expected != actual {
                trace!(
                    "Dropping configuration packet: checksum {:02X} != {:02X}",
                    actual,
                    expected
                );
                return None;
            }
            debug!(
                "Adapter configuration echo: speed=0x{:02X} type=0x{:02X} mode=0x{:02X}",
                packet[3], packet[4], packet[13]
            );
            return None;
        }

        if packet.len() >= MIN_DATA_PACKET && packet[0] == HEADER && packet[1] >> 4 == DATA_NIBBLE
        {
            // bytes 4 up to the trailer; descriptors above 8 are clamped
            let payload = &packet[4..packet.len() - 1];
            let len = payload.len().min(MAX_DLC);
            let mut data = [0u8; MAX_DLC];
            data[..len].copy_from_slice(&payload[..len]);

            return Some(Frame {
                id: self.rule.combine(packet[2], packet[3]),
                data,
                len: len as u8,
                frame_type: FrameType::Standard,
            });
        }

        trace!("Dropping unrecognized packet of {} bytes", packet.len());
        None
    }
}

impl Default for StreamDemux {
    fn default() -> Self {
        Self::new()
    }
}
