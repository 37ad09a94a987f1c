//! Wire format for the bootloader serial link.
//!
//! Sync frame (ACK, NAK, ACK-ABORT, PING, PING-RESPONSE):
//! - START (1 byte): 0x5A synchronization byte
//! - TYPE (1 byte): packet type
//!
//! Data frame (COMMAND, DATA):
//! - START (1 byte): 0x5A synchronization byte
//! - TYPE (1 byte): packet type
//! - LENGTH (2 bytes, LE): payload length
//! - CRC16 (2 bytes, LE): CRC-16/XMODEM of START..LENGTH and PAYLOAD
//! - PAYLOAD (LENGTH bytes)
//!
//! A PING-RESPONSE sync frame is followed by the 8-byte [`PingResponse`].

use heapless::Vec;

use crate::checksum::framing_crc16;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame synchronization byte
pub const START_BYTE: u8 = 0x5A;

/// Size of a sync frame (START + TYPE)
pub const SYNC_FRAME_LEN: usize = 2;

/// Size of a data frame header (START + TYPE + LENGTH + CRC16)
pub const DATA_HEADER_LEN: usize = 6;

/// Header bytes covered by the CRC (START + TYPE + LENGTH)
pub const CRC_COVERED_LEN: usize = 4;

/// Size of the ping response record that follows its sync header
pub const PING_RESPONSE_LEN: usize = 8;

/// Payload capacity in each direction unless a link picks its own
pub const DEFAULT_PACKET_SIZE: usize = 32;

// Wire format values
const TYPE_ACK: u8 = 0xA1;
const TYPE_NAK: u8 = 0xA2;
const TYPE_ACK_ABORT: u8 = 0xA3;
const TYPE_COMMAND: u8 = 0xA4;
const TYPE_DATA: u8 = 0xA5;
const TYPE_PING: u8 = 0xA6;
const TYPE_PING_RESPONSE: u8 = 0xA7;

/// Errors from building or checking frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds the frame buffer capacity
    PayloadTooLarge,
    /// CRC carried in the frame does not match its contents
    ChecksumMismatch { received: u16, computed: u16 },
}

/// Packet type byte following the start byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketType {
    Ack,
    Nak,
    AckAbort,
    Command,
    Data,
    Ping,
    PingResponse,
}

impl PacketType {
    /// Parse a packet type from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TYPE_ACK => Some(PacketType::Ack),
            TYPE_NAK => Some(PacketType::Nak),
            TYPE_ACK_ABORT => Some(PacketType::AckAbort),
            TYPE_COMMAND => Some(PacketType::Command),
            TYPE_DATA => Some(PacketType::Data),
            TYPE_PING => Some(PacketType::Ping),
            TYPE_PING_RESPONSE => Some(PacketType::PingResponse),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            PacketType::Ack => TYPE_ACK,
            PacketType::Nak => TYPE_NAK,
            PacketType::AckAbort => TYPE_ACK_ABORT,
            PacketType::Command => TYPE_COMMAND,
            PacketType::Data => TYPE_DATA,
            PacketType::Ping => TYPE_PING,
            PacketType::PingResponse => TYPE_PING_RESPONSE,
        }
    }
}

/// Which kind of data frame a read or write deals in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketKind {
    /// Command packet (opcode and parameters)
    Command,
    /// Data phase packet (raw bytes being transferred)
    Data,
}

impl PacketKind {
    /// Packet type used on the wire for this kind
    pub fn packet_type(self) -> PacketType {
        match self {
            PacketKind::Command => PacketType::Command,
            PacketKind::Data => PacketType::Data,
        }
    }
}

/// Encode a sync frame
pub fn sync_frame(packet_type: PacketType) -> [u8; SYNC_FRAME_LEN] {
    [START_BYTE, packet_type.to_byte()]
}

/// Header of a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataHeader {
    /// Command or data
    pub packet_type: PacketType,
    /// Payload length in bytes
    pub length: u16,
    /// CRC as carried on the wire
    pub crc16: u16,
}

impl DataHeader {
    /// Build the header for `payload`, computing its CRC
    pub fn for_payload(kind: PacketKind, payload: &[u8]) -> Result<Self, FrameError> {
        let length = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge)?;
        let mut header = Self {
            packet_type: kind.packet_type(),
            length,
            crc16: 0,
        };
        header.crc16 = header.compute_crc(payload);
        Ok(header)
    }

    /// The header bytes that fall under CRC coverage
    pub fn covered_bytes(&self) -> [u8; CRC_COVERED_LEN] {
        let [len_lo, len_hi] = self.length.to_le_bytes();
        [START_BYTE, self.packet_type.to_byte(), len_lo, len_hi]
    }

    /// CRC of this header (as currently filled in) plus `payload`
    pub fn compute_crc(&self, payload: &[u8]) -> u16 {
        framing_crc16(&self.covered_bytes(), payload)
    }

    /// Check the carried CRC against `payload`
    pub fn verify(&self, payload: &[u8]) -> Result<(), FrameError> {
        let computed = self.compute_crc(payload);
        if computed != self.crc16 {
            return Err(FrameError::ChecksumMismatch {
                received: self.crc16,
                computed,
            });
        }
        Ok(())
    }

    /// Encode the full 6-byte header
    pub fn encode(&self) -> [u8; DATA_HEADER_LEN] {
        let [len_lo, len_hi] = self.length.to_le_bytes();
        let [crc_lo, crc_hi] = self.crc16.to_le_bytes();
        [
            START_BYTE,
            self.packet_type.to_byte(),
            len_lo,
            len_hi,
            crc_lo,
            crc_hi,
        ]
    }
}

/// The most recently transmitted data frame
///
/// Kept so a NAK can be answered by sending exactly the same bytes again.
#[derive(Debug, Clone)]
pub struct OutgoingFrame<const N: usize> {
    header: DataHeader,
    payload: Vec<u8, N>,
}

impl<const N: usize> Default for OutgoingFrame<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> OutgoingFrame<N> {
    /// Create an empty command frame
    pub const fn new() -> Self {
        Self {
            header: DataHeader {
                packet_type: PacketType::Command,
                length: 0,
                crc16: 0,
            },
            payload: Vec::new(),
        }
    }

    /// Replace the retained frame with one carrying `payload`
    ///
    /// On error the previous frame is left untouched.
    pub fn load(&mut self, kind: PacketKind, payload: &[u8]) -> Result<(), FrameError> {
        if payload.len() > N {
            return Err(FrameError::PayloadTooLarge);
        }
        let header = DataHeader::for_payload(kind, payload)?;

        self.payload.clear();
        self.payload
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        self.header = header;
        Ok(())
    }

    /// Header of the retained frame
    pub fn header(&self) -> &DataHeader {
        &self.header
    }

    /// Payload of the retained frame
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Serial protocol version advertised in the ping response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolVersion {
    pub bugfix: u8,
    pub minor: u8,
    pub major: u8,
    /// Protocol family letter, `b'P'` for the serial packet protocol
    pub name: u8,
}

/// Capability record sent after a PING-RESPONSE header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PingResponse {
    pub version: ProtocolVersion,
    /// Protocol options, currently always zero
    pub options: u16,
    /// Fixed marker hosts use to recognize the reply; not recomputed
    pub sentinel: u16,
}

/// Ping response for serial protocol P1.2.0
pub const PING_RESPONSE: PingResponse = PingResponse {
    version: ProtocolVersion {
        bugfix: 0,
        minor: 2,
        major: 1,
        name: b'P',
    },
    options: 0,
    sentinel: 0xEAAA,
};

impl PingResponse {
    /// Encode the record as sent on the wire
    pub fn encode(&self) -> [u8; PING_RESPONSE_LEN] {
        let [opt_lo, opt_hi] = self.options.to_le_bytes();
        let [sen_lo, sen_hi] = self.sentinel.to_le_bytes();
        [
            self.version.bugfix,
            self.version.minor,
            self.version.major,
            self.version.name,
            opt_lo,
            opt_hi,
            sen_lo,
            sen_hi,
        ]
    }
}
