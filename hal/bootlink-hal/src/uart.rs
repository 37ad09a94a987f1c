//! UART serial communication abstractions
//!
//! The bootloader transmits with blocking writes and receives through an
//! interrupt that hands each byte to a callback. These traits capture exactly
//! those two primitives.

/// Interrupt-context byte callback
///
/// Called once per received byte. Runs in interrupt context, so it must not
/// block; in practice it enqueues into a static ring buffer.
pub type RxCallback = fn(u8);

/// UART transmitter
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Send data over the UART
    ///
    /// Blocks until the driver has accepted the data and returns how many
    /// bytes were taken. A count below `data.len()` is a short write.
    fn send(&mut self, data: &[u8]) -> Result<usize, Self::Error>;
}

/// UART receive interrupt
pub trait SerialRxInterrupt {
    /// Error type for interrupt configuration
    type Error;

    /// Enable the receive interrupt and route every byte to `callback`
    fn enable_rx_callback(&mut self, callback: RxCallback) -> Result<(), Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and interrupt-driven RX on one peripheral.
pub trait Serial: SerialTx + SerialRxInterrupt {}

// Blanket implementation
impl<T: SerialTx + SerialRxInterrupt> Serial for T {}

impl<T: SerialTx + ?Sized> SerialTx for &mut T {
    type Error = T::Error;

    fn send(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        (**self).send(data)
    }
}
