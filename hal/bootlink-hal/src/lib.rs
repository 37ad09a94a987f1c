//! Bootlink Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the serial bootloader protocol is
//! written against. Chip-specific code implements them; the protocol crate
//! and its tests only ever see the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Command interpreter (erase/program)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bootlink-protocol (framing, ACK/NAK)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bootlink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  UART driver  │       │  tick timer   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialTx`], [`uart::SerialRxInterrupt`] - Serial communication
//! - [`time::Clock`] - Millisecond time source for bounded busy-waits

#![no_std]
#![deny(unsafe_code)]

pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use time::Clock;
pub use uart::{RxCallback, Serial, SerialRxInterrupt, SerialTx};
