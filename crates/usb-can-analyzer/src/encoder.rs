//! Outbound Data Frame Encoder

use crate::wire::{DATA_NIBBLE, DATA_PACKET_LEN, EXTENDED_BIT, HEADER, MARKER};
use can_interface::{CanError, Frame, FrameType};

/// Encode a frame into the fixed 13-byte data packet
///
/// The full 8-byte payload buffer is always sent, even when the descriptor
/// declares fewer bytes. Only the low 16 bits of the identifier fit on the
/// wire. Error frames have no encoding.
pub fn encode_frame(frame: &Frame) -> Result<[u8; DATA_PACKET_LEN], CanError> {
    let mut descriptor = DATA_NIBBLE << 4;
    match frame.frame_type {
        FrameType::Standard => descriptor &= !EXTENDED_BIT,
        FrameType::Extended => descriptor |= EXTENDED_BIT,
        FrameType::Error => return Err(CanError::UnsupportedFrameType(FrameType::Error)),
    }
    // type bit must be settled before the length nibble goes in
    descriptor &= 0xEF;
    descriptor |= frame.dlc() as u8;

    let [id_low, id_high] = (frame.id as u16).to_le_bytes();

    let mut packet = [0u8; DATA_PACKET_LEN];
    packet[0] = HEADER;
    packet[1] = descriptor;
    packet[2] = id_low;
    packet[3] = id_high;
    packet[4..12].copy_from_slice(frame.raw_data());
    packet[12] = MARKER;
    Ok(packet)
}
