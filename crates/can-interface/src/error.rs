//! CAN Error Types

use crate::bitrate::Bitrate;
use crate::frame::FrameType;
use thiserror::Error;

/// Errors that can occur while talking to a CAN adapter
#[derive(Debug, Error)]
pub enum CanError {
    /// Bit rate has no mapping on this backend
    #[error("Bit rate {bitrate} not supported by {backend}")]
    UnsupportedBitrate {
        backend: &'static str,
        bitrate: Bitrate,
    },

    /// Numeric bit rate that is not a nominal CAN rate
    #[error("Invalid CAN bit rate: {0} bit/s")]
    InvalidBitrate(u32),

    /// Frame type has no encoding on this backend
    #[error("Frame type {0:?} cannot be transmitted")]
    UnsupportedFrameType(FrameType),

    /// More than 8 payload bytes
    #[error("Payload of {0} bytes exceeds the 8-byte CAN limit")]
    PayloadTooLong(usize),

    /// Channel used before `open` or after `close`
    #[error("CAN channel is not open")]
    NotOpen,

    /// Byte transport failure (write, read, or link closed)
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Status code reported by a native adapter library
    #[error("Native driver error 0x{status:08X}: {message}")]
    Native { status: u32, message: String },
}

impl CanError {
    /// True for errors raised before any I/O was attempted
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CanError::UnsupportedBitrate { .. }
                | CanError::InvalidBitrate(_)
                | CanError::UnsupportedFrameType(_)
                | CanError::PayloadTooLong(_)
        )
    }

    /// True for failures of the underlying link or library
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CanError::Io(_) | CanError::Serial(_) | CanError::Native { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = CanError::UnsupportedBitrate {
            backend: "usb-can",
            bitrate: Bitrate::Kbit800,
        };
        assert!(err.is_configuration());
        assert!(!err.is_transport());

        let err = CanError::Native {
            status: 0x4000,
            message: "bus off".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Native driver error 0x00004000: bus off");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "link closed");
        let err: CanError = io.into();
        assert!(matches!(err, CanError::Io(_)));
        assert!(err.is_transport());
    }
}
