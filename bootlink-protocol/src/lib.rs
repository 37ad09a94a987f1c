//! Bootloader Serial Packet Protocol
//!
//! This crate implements the device side of the UART protocol a host flash
//! tool uses to talk to the bootloader: framing, CRC checking, deferred
//! acknowledgments, NAK-driven retransmission and the ping handshake that
//! lets the host find the bootloader without knowing its state.
//!
//! # Protocol Overview
//!
//! Every frame starts with a sync byte and a packet type. Command and data
//! frames add a length, a CRC-16/XMODEM and the payload:
//! ```text
//! ┌───────┬──────┬────────┬────────┬─────────────┐
//! │ START │ TYPE │ LENGTH │ CRC16  │ PAYLOAD     │
//! │ 0x5A  │ 1B   │ 2B LE  │ 2B LE  │ LENGTH B    │
//! └───────┴──────┴────────┴────────┴─────────────┘
//! ```
//!
//! ACK, NAK, ACK-ABORT, PING and PING-RESPONSE are header-only sync frames.
//!
//! # Usage
//!
//! The receive interrupt pushes bytes into a static [`ByteRing`]; the
//! foreground owns a [`SerialLink`] built on the ring's consumer handle:
//!
//! ```ignore
//! static RX: ByteRing<DEFAULT_RING_SIZE> = ByteRing::new();
//!
//! fn on_byte(byte: u8) {
//!     RX.enqueue(byte);
//! }
//!
//! let mut link: SerialLink<_, _, DEFAULT_RING_SIZE> =
//!     SerialLink::start(uart, RX.take_consumer().unwrap(), clock, LinkConfig::default(), on_byte)?;
//! let command = link.read(PacketKind::Command)?;
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every other module
mod fmt;

pub mod checksum;
pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod packet;
pub mod reader;
pub mod ring;
pub mod session;

#[cfg(test)]
mod mock;

pub use config::LinkConfig;
pub use error::{status, Expectation, LinkError};
pub use frame::{
    FrameError, PacketKind, PacketType, PingResponse, ProtocolVersion, DEFAULT_PACKET_SIZE,
    PING_RESPONSE, START_BYTE,
};
pub use link::SerialLink;
pub use packet::PacketInterface;
pub use ring::{ByteRing, RxConsumer, DEFAULT_RING_SIZE};
pub use session::{PendingAck, Session};
