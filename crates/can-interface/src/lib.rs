//! CAN Interface Abstraction
//!
//! This crate defines the frame model and the four-operation contract
//! (open, send, receive, close) shared by every CAN adapter backend.

mod bitrate;
mod error;
mod frame;
mod interface;

pub use bitrate::Bitrate;
pub use error::CanError;
pub use frame::{Frame, FrameType, MAX_DLC};
pub use interface::CanInterface;

