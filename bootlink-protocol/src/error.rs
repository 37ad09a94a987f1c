//! Link-level errors and their bootloader status codes

use crate::frame::PacketType;

/// Bootloader status codes reported to the host in generic responses
pub mod status {
    pub const SUCCESS: u32 = 0;
    pub const FAIL: u32 = 1;
    pub const INVALID_ARGUMENT: u32 = 4;
    pub const TIMEOUT: u32 = 5;
    /// The host abandoned the data phase with an ACK-ABORT
    pub const ABORT_DATA_PHASE: u32 = 10002;
}

/// Errors surfaced by [`SerialLink`](crate::SerialLink) operations
///
/// Checksum failures and NAKs never show up here: they are recovered inside
/// the link by re-reading or retransmitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Oversized payload, or a request the link cannot represent
    InvalidArgument,
    /// A bounded read inside a frame did not complete in time
    Timeout,
    /// The peer sent a packet type the current operation cannot accept
    UnexpectedPacket {
        /// What the operation was waiting for
        expected: Expectation,
        /// Raw packet type byte that arrived
        found: u8,
    },
    /// The peer cancelled the data phase (ACK-ABORT)
    Aborted,
    /// The caller broke the API contract, e.g. `abort()` with no ACK owed
    ContractViolation,
    /// The transport failed or accepted fewer bytes than offered
    Transport,
}

/// What a read was waiting for when an [`LinkError::UnexpectedPacket`] arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Expectation {
    /// A data-bearing frame of this type
    Frame(PacketType),
    /// ACK, NAK or ACK-ABORT after a write
    Sync,
}

impl LinkError {
    /// Status code to report to the host for this error
    pub const fn status_code(self) -> u32 {
        match self {
            LinkError::InvalidArgument => status::INVALID_ARGUMENT,
            LinkError::Timeout => status::TIMEOUT,
            LinkError::Aborted => status::ABORT_DATA_PHASE,
            LinkError::UnexpectedPacket { .. }
            | LinkError::ContractViolation
            | LinkError::Transport => status::FAIL,
        }
    }
}
