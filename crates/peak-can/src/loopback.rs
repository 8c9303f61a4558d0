//! In-process stand-in for the PCAN-Basic library
//!
//! Written messages are queued back for reading, as if the channel were in
//! loopback. Status words can be injected to exercise error paths.

use crate::ffi::{PcanApi, PcanMsg, PcanStatus};
use std::collections::VecDeque;

/// Loopback implementation of `PcanApi`
#[derive(Debug, Default)]
pub struct LoopbackPcan {
    /// Pending read results
    queue: VecDeque<(u32, PcanMsg)>,
    /// Every message written
    written: Vec<PcanMsg>,
    /// Channel and BTR0BTR1 of the last successful initialize
    initialized: Option<(u16, u16)>,
    /// Status returned by the next write instead of OK
    write_status: Option<u32>,
}

impl LoopbackPcan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for the next read
    pub fn push_message(&mut self, msg: PcanMsg) {
        self.queue.push_back((PcanStatus::OK, msg));
    }

    /// Queue a status word for the next read
    pub fn push_status(&mut self, status: u32) {
        self.queue.push_back((status, PcanMsg::default()));
    }

    /// Fail the next write with `status`
    pub fn fail_next_write(&mut self, status: u32) {
        self.write_status = Some(status);
    }

    pub fn written(&self) -> &[PcanMsg] {
        &self.written
    }

    pub fn initialized(&self) -> Option<(u16, u16)> {
        self.initialized
    }
}

impl PcanApi for LoopbackPcan {
    fn initialize(&mut self, channel: u16, btr0btr1: u16) -> u32 {
        self.initialized = Some((channel, btr0btr1));
        PcanStatus::OK
    }

    fn uninitialize(&mut self, _channel: u16) -> u32 {
        self.initialized = None;
        self.queue.clear();
        PcanStatus::OK
    }

    fn read(&mut self, _channel: u16, msg: &mut PcanMsg) -> u32 {
        match self.queue.pop_front() {
            Some((status, queued)) => {
                *msg = queued;
                status
            }
            None => PcanStatus::QRCVEMPTY,
        }
    }

    fn write(&mut self, _channel: u16, msg: &PcanMsg) -> u32 {
        if let Some(status) = self.write_status.take() {
            return status;
        }
        self.written.push(*msg);
        self.queue.push_back((PcanStatus::OK, *msg));
        PcanStatus::OK
    }
}
