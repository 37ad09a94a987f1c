//! Time source abstraction
//!
//! Busy-wait timeouts are measured against an injected clock instead of a
//! hardware tick register, so tests can drive elapsed time deterministically.

/// Millisecond time source
///
/// The counter is free running and allowed to wrap; callers compare
/// instants with `wrapping_sub`.
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> u32;

    /// Milliseconds elapsed since `start`, tolerating one counter rollover
    fn elapsed_since(&self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
