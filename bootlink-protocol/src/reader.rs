//! Blocking byte reader
//!
//! Pulls exact byte counts out of the receive ring, spinning while it is
//! empty. There is no scheduler to yield to; the receive interrupt fills the
//! ring while we spin.

use bootlink_hal::Clock;

use crate::error::LinkError;
use crate::ring::RxConsumer;

/// Foreground reader over the receive ring
pub struct ByteReader<'r, C, const R: usize> {
    rx: RxConsumer<'r, R>,
    clock: C,
}

impl<'r, C: Clock, const R: usize> ByteReader<'r, C, R> {
    /// Create a reader over the ring's consumer handle
    pub fn new(rx: RxConsumer<'r, R>, clock: C) -> Self {
        Self { rx, clock }
    }

    /// Fill `buf` completely, in arrival order
    ///
    /// `timeout_ms` bounds the whole call; `None` waits forever. The deadline
    /// is only checked while the ring is empty, so bytes that have already
    /// arrived are never thrown away for being late.
    pub fn read_exact(
        &mut self,
        buf: &mut [u8],
        timeout_ms: Option<u32>,
    ) -> Result<(), LinkError> {
        let start = self.clock.now_ms();
        let mut filled = 0;

        while filled < buf.len() {
            if let Some(byte) = self.rx.dequeue() {
                buf[filled] = byte;
                filled += 1;
                continue;
            }

            if let Some(limit) = timeout_ms {
                if self.clock.elapsed_since(start) >= limit {
                    trace!("read timed out after {} of {} bytes", filled, buf.len());
                    return Err(LinkError::Timeout);
                }
            }
            core::hint::spin_loop();
        }

        Ok(())
    }

    /// Read a single byte
    pub fn read_byte(&mut self, timeout_ms: Option<u32>) -> Result<u8, LinkError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte, timeout_ms)?;
        Ok(byte[0])
    }

    /// Busy-wait for `ms` milliseconds
    pub fn delay_ms(&self, ms: u32) {
        let start = self.clock.now_ms();
        while self.clock.elapsed_since(start) < ms {
            core::hint::spin_loop();
        }
    }
}
