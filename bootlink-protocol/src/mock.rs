//! Test doubles for the serial link
//!
//! [`MockHost`] plays the host end of the wire: it records everything the
//! device transmits and, each time a data-frame header goes out, pushes the
//! next scripted reply into the receive ring as if the UART interrupt had
//! delivered it. [`StepClock`] advances one millisecond per query so
//! timeouts expire deterministically.

use core::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use bootlink_hal::{Clock, RxCallback, SerialRxInterrupt, SerialTx};

use crate::frame::{sync_frame, DataHeader, PacketKind, PacketType, START_BYTE};
use crate::ring::ByteRing;

/// Transport failure injected by [`MockHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Scripted host on the other end of the link
pub struct MockHost<'r, const R: usize> {
    ring: &'r ByteRing<R>,
    sent: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    accept_limit: Option<usize>,
    fail: bool,
    rx_callback: Option<RxCallback>,
}

impl<'r, const R: usize> MockHost<'r, R> {
    pub fn new(ring: &'r ByteRing<R>) -> Self {
        Self {
            ring,
            sent: Vec::new(),
            replies: VecDeque::new(),
            accept_limit: None,
            fail: false,
            rx_callback: None,
        }
    }

    /// Queue bytes the host sends after the device's next data frame
    pub fn reply_with(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    /// Queue a sync reply for the device's next data frame
    pub fn reply_sync(&mut self, packet_type: PacketType) {
        self.reply_with(&sync_frame(packet_type));
    }

    /// Accept at most `limit` bytes per send
    pub fn limit_writes(&mut self, limit: usize) {
        self.accept_limit = Some(limit);
    }

    /// Make every send fail
    pub fn fail_writes(&mut self) {
        self.fail = true;
    }

    /// Each `send` call, in order
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Everything transmitted, concatenated
    pub fn wire(&self) -> Vec<u8> {
        self.sent.concat()
    }

    /// How many standalone sync frames of `packet_type` were sent
    pub fn sync_count(&self, packet_type: PacketType) -> usize {
        let frame = sync_frame(packet_type);
        self.sent.iter().filter(|chunk| chunk[..] == frame[..]).count()
    }

    /// Callback registered through [`SerialRxInterrupt`]
    pub fn rx_callback(&self) -> Option<RxCallback> {
        self.rx_callback
    }

    fn is_data_header(chunk: &[u8]) -> bool {
        chunk.len() >= 2
            && chunk[0] == START_BYTE
            && matches!(
                PacketType::from_byte(chunk[1]),
                Some(PacketType::Command) | Some(PacketType::Data)
            )
    }
}

impl<'r, const R: usize> SerialTx for MockHost<'r, R> {
    type Error = MockError;

    fn send(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(MockError);
        }

        let accepted = self.accept_limit.map_or(data.len(), |limit| data.len().min(limit));
        self.sent.push(data[..accepted].to_vec());

        if Self::is_data_header(data) {
            if let Some(reply) = self.replies.pop_front() {
                feed(self.ring, &reply);
            }
        }
        Ok(accepted)
    }
}

impl<'r, const R: usize> SerialRxInterrupt for MockHost<'r, R> {
    type Error = MockError;

    fn enable_rx_callback(&mut self, callback: RxCallback) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.rx_callback = Some(callback);
        Ok(())
    }
}

/// Clock that moves forward one millisecond every time it is read
#[derive(Debug, Default)]
pub struct StepClock {
    now: Cell<u32>,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `start_ms`
    pub fn starting_at(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(1));
        now
    }
}

/// Deliver bytes into the ring as the receive interrupt would
pub fn feed<const R: usize>(ring: &ByteRing<R>, bytes: &[u8]) {
    for &byte in bytes {
        ring.enqueue(byte);
    }
}

/// Encode a data frame as the host would send it
pub fn host_frame(kind: PacketKind, payload: &[u8]) -> Vec<u8> {
    let header = DataHeader::for_payload(kind, payload).unwrap();
    let mut frame = header.encode().to_vec();
    frame.extend_from_slice(payload);
    frame
}

/// Encode a data frame whose CRC field has been damaged
pub fn corrupted_frame(kind: PacketKind, payload: &[u8]) -> Vec<u8> {
    let mut frame = host_frame(kind, payload);
    frame[4] ^= 0x5A;
    frame
}
