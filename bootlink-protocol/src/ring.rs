//! Interrupt-fed receive ring buffer
//!
//! A single-producer/single-consumer byte queue. The UART receive interrupt
//! is the only producer and calls [`ByteRing::enqueue`]; the foreground
//! packet reader owns the one [`RxConsumer`] handle.
//!
//! The producer never stalls: when it laps the consumer the unread bytes are
//! lost. Cursors are published with release/acquire ordering so a byte slot
//! is always written before the cursor that exposes it.

use portable_atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Ring capacity used by firmware integrations unless they pick their own
pub const DEFAULT_RING_SIZE: usize = 64;

/// Fixed-capacity receive ring
///
/// `N` must be a power of two, and at least 2 since one slot always stays
/// free; cursors wrap with a bitmask. This is checked at compile time when
/// the ring is constructed:
///
/// ```compile_fail
/// use bootlink_protocol::ByteRing;
///
/// static RING: ByteRing<1> = ByteRing::new();
/// ```
pub struct ByteRing<const N: usize> {
    slots: [AtomicU8; N],
    write: AtomicUsize,
    read: AtomicUsize,
    consumer_taken: AtomicBool,
}

impl<const N: usize> ByteRing<N> {
    const CAPACITY_CHECK: () = assert!(
        N.is_power_of_two() && N >= 2,
        "ring capacity must be a power of two of at least 2"
    );

    const MASK: usize = N - 1;

    /// Create an empty ring, usable as a `static`
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        #[allow(clippy::declare_interior_mutable_const)]
        const EMPTY: AtomicU8 = AtomicU8::new(0);

        Self {
            slots: [EMPTY; N],
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            consumer_taken: AtomicBool::new(false),
        }
    }

    /// Append one received byte
    ///
    /// Interrupt-safe and wait-free. Only the single producer may call this.
    pub fn enqueue(&self, byte: u8) {
        let write = self.write.load(Ordering::Relaxed);
        self.slots[write].store(byte, Ordering::Relaxed);
        self.write.store((write + 1) & Self::MASK, Ordering::Release);
    }

    /// Hand out the consumer side
    ///
    /// Returns `None` after the first call so there is never a second reader.
    pub fn take_consumer(&self) -> Option<RxConsumer<'_, N>> {
        if self.consumer_taken.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(RxConsumer { ring: self })
        }
    }

    /// Total number of byte slots
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer half of a [`ByteRing`]
pub struct RxConsumer<'r, const N: usize> {
    ring: &'r ByteRing<N>,
}

impl<'r, const N: usize> RxConsumer<'r, N> {
    /// Take the oldest unread byte, if any
    pub fn dequeue(&mut self) -> Option<u8> {
        let read = self.ring.read.load(Ordering::Relaxed);
        if read == self.ring.write.load(Ordering::Acquire) {
            return None;
        }

        let byte = self.ring.slots[read].load(Ordering::Relaxed);
        self.ring
            .read
            .store((read + 1) & ByteRing::<N>::MASK, Ordering::Release);
        Some(byte)
    }

    /// Number of unread bytes
    pub fn available(&self) -> usize {
        let write = self.ring.write.load(Ordering::Acquire);
        let read = self.ring.read.load(Ordering::Relaxed);
        write.wrapping_sub(read) & ByteRing::<N>::MASK
    }

    /// Whether no bytes are waiting
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let ring = ByteRing::<8>::new();
        let mut rx = ring.take_consumer().unwrap();

        ring.enqueue(1);
        ring.enqueue(2);
        ring.enqueue(3);

        assert_eq!(rx.available(), 3);
        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(3));
        assert_eq!(rx.dequeue(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_cursors_wrap() {
        let ring = ByteRing::<4>::new();
        let mut rx = ring.take_consumer().unwrap();

        for round in 0..10u8 {
            ring.enqueue(round);
            ring.enqueue(round.wrapping_add(100));
            assert_eq!(rx.dequeue(), Some(round));
            assert_eq!(rx.dequeue(), Some(round.wrapping_add(100)));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_consumer_taken_once() {
        let ring = ByteRing::<8>::new();
        let first = ring.take_consumer();
        assert!(first.is_some());
        assert!(ring.take_consumer().is_none());
    }

    #[test]
    fn test_overflow_loses_unread_bytes() {
        let ring = ByteRing::<4>::new();
        let mut rx = ring.take_consumer().unwrap();

        // A full lap brings the write cursor back onto the read cursor
        for byte in 0..4u8 {
            ring.enqueue(byte);
        }
        assert_eq!(rx.dequeue(), None);

        // The producer keeps going and the consumer sees only new data
        ring.enqueue(0xEE);
        assert_eq!(rx.dequeue(), Some(0xEE));
    }

    #[test]
    fn test_smallest_ring_holds_one_byte() {
        let ring = ByteRing::<2>::new();
        let mut rx = ring.take_consumer().unwrap();

        ring.enqueue(0x5A);
        assert_eq!(rx.available(), 1);
        assert_eq!(rx.dequeue(), Some(0x5A));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_static_ring() {
        static RING: ByteRing<16> = ByteRing::new();
        let mut rx = RING.take_consumer().unwrap();

        RING.enqueue(0x5A);
        assert_eq!(RING.capacity(), 16);
        assert_eq!(rx.dequeue(), Some(0x5A));
    }
}
