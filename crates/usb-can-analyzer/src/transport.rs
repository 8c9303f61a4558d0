//! Byte Transport
//!
//! The driver only needs three primitives from the link underneath it:
//! write a byte slice, ask whether input is pending, and read one byte.

use async_trait::async_trait;
use can_interface::CanError;
use std::collections::VecDeque;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

/// Serial line rate the analyzer firmware expects
pub const DEFAULT_SERIAL_BAUD: u32 = 2_000_000;

/// Byte-level link to the adapter
#[async_trait]
pub trait ByteTransport: Send {
    /// Write all bytes
    async fn write(&mut self, bytes: &[u8]) -> Result<(), CanError>;

    /// Whether at least one byte can be read without waiting
    fn has_data(&mut self) -> Result<bool, CanError>;

    /// Read one byte, waiting for it; fails if the link closes
    async fn read_byte(&mut self) -> Result<u8, CanError>;

    /// Discard whatever input is already pending
    async fn drain(&mut self) -> Result<usize, CanError> {
        let mut drained = 0;
        while self.has_data()? {
            self.read_byte().await?;
            drained += 1;
        }
        Ok(drained)
    }

    /// Release the link
    async fn close(&mut self) -> Result<(), CanError> {
        Ok(())
    }
}

/// Serial port transport backed by `tokio-serial`
///
/// The port handle is dropped on close; later calls fail with `NotConnected`.
pub struct SerialTransport {
    port: Option<SerialStream>,
    path: String,
}

impl SerialTransport {
    /// Open a serial device
    ///
    /// # Arguments
    /// * `path` - Serial port device path (e.g. "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Serial line rate
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, CanError> {
        info!("Opening serial port {} at {} baud", path, baud_rate);

        let port = tokio_serial::new(path, baud_rate)
            .open_native_async()
            .map_err(|e| CanError::Serial(format!("{}: {}", path, e)))?;

        Ok(Self::from_stream(port, path))
    }

    /// Wrap an already opened serial stream
    pub fn from_stream(port: SerialStream, path: &str) -> Self {
        Self {
            port: Some(port),
            path: path.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.port.is_none()
    }

    fn port(&mut self) -> Result<&mut SerialStream, CanError> {
        self.port.as_mut().ok_or_else(not_connected)
    }
}

#[async_trait]
impl ByteTransport for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), CanError> {
        let port = self.port()?;
        port.write_all(bytes).await?;
        port.flush().await?;
        Ok(())
    }

    fn has_data(&mut self) -> Result<bool, CanError> {
        let pending = self
            .port()?
            .bytes_to_read()
            .map_err(|e| CanError::Serial(e.to_string()))?;
        Ok(pending > 0)
    }

    async fn read_byte(&mut self) -> Result<u8, CanError> {
        Ok(self.port()?.read_u8().await?)
    }

    async fn close(&mut self) -> Result<(), CanError> {
        let Some(mut port) = self.port.take() else {
            return Ok(());
        };
        debug!("Releasing serial port {}", self.path);
        port.flush().await?;
        port.clear(ClearBuffer::All)
            .map_err(|e| CanError::Serial(e.to_string()))
    }
}

fn not_connected() -> CanError {
    CanError::from(io::Error::new(
        io::ErrorKind::NotConnected,
        "transport closed",
    ))
}

/// In-memory transport for tests and capture replay
///
/// Reading past the queued input fails like a closed link.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with bytes already waiting to be read
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_input(bytes);
        transport
    }

    /// Queue bytes as if the adapter had sent them
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), CanError> {
        if self.closed {
            return Err(not_connected());
        }
        Ok(())
    }
}

#[async_trait]
impl ByteTransport for MemoryTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), CanError> {
        self.ensure_open()?;
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn has_data(&mut self) -> Result<bool, CanError> {
        self.ensure_open()?;
        Ok(!self.inbound.is_empty())
    }

    async fn read_byte(&mut self) -> Result<u8, CanError> {
        self.ensure_open()?;
        self.inbound
            .pop_front()
            .ok_or_else(|| CanError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "link closed")))
    }

    async fn close(&mut self) -> Result<(), CanError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_drain() {
        let mut transport = MemoryTransport::with_input(&[1, 2, 3]);
        assert!(transport.has_data().unwrap());
        assert_eq!(transport.drain().await.unwrap(), 3);
        assert!(!transport.has_data().unwrap());
    }

    #[tokio::test]
    async fn test_memory_read_past_end_fails() {
        let mut transport = MemoryTransport::with_input(&[0xAA]);
        assert_eq!(transport.read_byte().await.unwrap(), 0xAA);
        let err = transport.read_byte().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_memory_closed() {
        let mut transport = MemoryTransport::new();
        transport.write(&[0x55]).await.unwrap();
        transport.close().await.unwrap();
        assert!(transport.is_closed());
        assert!(transport.write(&[0x55]).await.is_err());
        assert_eq!(transport.written(), &[0x55]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_serial_close_releases_port() {
        let (port, mut peer) = SerialStream::pair().unwrap();
        let mut transport = SerialTransport::from_stream(port, "pty");

        transport.write(&[0xAA]).await.unwrap();
        assert_eq!(peer.read_u8().await.unwrap(), 0xAA);

        transport.close().await.unwrap();
        assert!(transport.is_closed());

        let err = transport.write(&[0xAA]).await.unwrap_err();
        assert!(err.is_transport());
        assert!(transport.has_data().is_err());
        assert!(transport.read_byte().await.is_err());

        // closing twice is harmless
        transport.close().await.unwrap();
    }
}
