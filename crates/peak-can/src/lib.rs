//! PEAK PCAN-Basic Backend
//!
//! Drives PEAK-System adapters through the vendor PCAN-Basic library. The
//! library is linked only with the `ffi` feature; without it the driver can
//! still be exercised against `LoopbackPcan` or any other `PcanApi`.

mod driver;
mod ffi;
mod loopback;

pub use driver::{btr0btr1, PcanDevice, BACKEND_NAME};
pub use ffi::{baud, msg_type, PcanApi, PcanMsg, PcanStatus, PcanTimestamp, PCAN_USBBUS1};
pub use loopback::LoopbackPcan;

#[cfg(feature = "ffi")]
pub use ffi::NativePcan;
