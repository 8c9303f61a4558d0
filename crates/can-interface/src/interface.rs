//! Adapter Contract

use crate::bitrate::Bitrate;
use crate::error::CanError;
use crate::frame::Frame;
use async_trait::async_trait;

/// Contract shared by every CAN adapter backend
///
/// Backends are interchangeable behind `Box<dyn CanInterface>`. A channel
/// has a single logical owner; `&mut self` serializes send and receive.
#[async_trait]
pub trait CanInterface: Send {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Configure the channel for the given bit rate
    ///
    /// Unsupported rates fail before any I/O is attempted.
    async fn open(&mut self, bitrate: Bitrate) -> Result<(), CanError>;

    /// Transmit one frame
    async fn send(&mut self, frame: &Frame) -> Result<(), CanError>;

    /// Receive the next frame
    ///
    /// With `blocking == false` this returns `Ok(None)` when no frame is
    /// currently available. With `blocking == true` it waits until a frame
    /// is decoded or the transport fails.
    async fn receive(&mut self, blocking: bool) -> Result<Option<Frame>, CanError>;

    /// Release the channel
    async fn close(&mut self) -> Result<(), CanError>;
}
