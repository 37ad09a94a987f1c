//! Frame checksum
//!
//! Data frames carry a CRC-16/XMODEM: polynomial 0x1021, initial value 0,
//! no input or output reflection, no final XOR. The CRC covers the start
//! byte, packet type and length field, followed by the payload. The CRC
//! field itself is never part of its own coverage.

use crc::{Crc, CRC_16_XMODEM};

/// CRC engine configured for framing
pub const FRAMING_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC over a frame's covered header bytes and its payload
pub fn framing_crc16(header: &[u8], payload: &[u8]) -> u16 {
    let mut digest = FRAMING_CRC.digest();
    digest.update(header);
    digest.update(payload);
    digest.finalize()
}
