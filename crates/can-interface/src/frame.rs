//! CAN Frame Model

use crate::error::CanError;
use serde::{Deserialize, Serialize};

/// Maximum payload length of a classic CAN frame
pub const MAX_DLC: usize = 8;

/// Frame type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FrameType {
    /// 11-bit identifier
    #[default]
    Standard,
    /// 29-bit identifier
    Extended,
    /// Error frame reported by the controller (tag only)
    Error,
}

/// A classic CAN frame
///
/// The payload buffer is always 8 bytes wide. `len` records how many of
/// those bytes are meaningful; the remainder is zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Arbitration identifier
    pub id: u32,
    /// Payload buffer
    pub data: [u8; MAX_DLC],
    /// Data length code (0..=8)
    pub len: u8,
    /// Frame type tag
    pub frame_type: FrameType,
}

impl Frame {
    /// Create a frame from a payload slice
    pub fn new(id: u32, payload: &[u8], frame_type: FrameType) -> Result<Self, CanError> {
        if payload.len() > MAX_DLC {
            return Err(CanError::PayloadTooLong(payload.len()));
        }

        let mut data = [0u8; MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            id,
            data,
            len: payload.len() as u8,
            frame_type,
        })
    }

    /// Create a standard (11-bit) frame
    pub fn standard(id: u32, payload: &[u8]) -> Result<Self, CanError> {
        Self::new(id, payload, FrameType::Standard)
    }

    /// Create an extended (29-bit) frame
    pub fn extended(id: u32, payload: &[u8]) -> Result<Self, CanError> {
        Self::new(id, payload, FrameType::Extended)
    }

    /// Meaningful payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc()]
    }

    /// The whole 8-byte payload buffer
    pub fn raw_data(&self) -> &[u8; MAX_DLC] {
        &self.data
    }

    /// Payload length, clamped to the buffer width
    pub fn dlc(&self) -> usize {
        (self.len as usize).min(MAX_DLC)
    }

    pub fn is_extended(&self) -> bool {
        self.frame_type == FrameType::Extended
    }

    pub fn is_error(&self) -> bool {
        self.frame_type == FrameType::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_payload_is_zero_filled() {
        let frame = Frame::standard(0x7E8, &[0x02, 0x41]).unwrap();
        assert_eq!(frame.len, 2);
        assert_eq!(frame.data(), &[0x02, 0x41]);
        assert_eq!(frame.raw_data(), &[0x02, 0x41, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_payload_too_long() {
        let err = Frame::standard(0x100, &[0u8; 9]).unwrap_err();
        assert!(matches!(err, CanError::PayloadTooLong(9)));
    }

    #[test]
    fn test_dlc_clamped() {
        let frame = Frame {
            len: 12,
            ..Default::default()
        };
        assert_eq!(frame.data().len(), MAX_DLC);
    }

    proptest! {
        #[test]
        fn prop_payload_preserved(
            id in 0u32..=0x1FFF_FFFF,
            payload in prop::collection::vec(any::<u8>(), 0..=8),
        ) {
            let frame = Frame::extended(id, &payload).unwrap();
            prop_assert_eq!(frame.data(), payload.as_slice());
            prop_assert!(frame.raw_data()[payload.len()..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_type_helpers() {
        assert!(Frame::extended(0x18FEF100, &[]).unwrap().is_extended());
        assert!(!Frame::standard(0x123, &[]).unwrap().is_error());
    }
}
