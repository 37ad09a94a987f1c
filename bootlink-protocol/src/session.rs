//! Acknowledgment bookkeeping for one link session
//!
//! Acknowledgments are deferred: a received frame is only ACKed by the next
//! read, write or finalize. This module tracks what is owed and whether the
//! last thing put on the wire was a sync frame.

use crate::error::LinkError;
use crate::frame::PacketType;

/// Acknowledgment owed for the last received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingAck {
    /// Nothing owed
    #[default]
    None,
    /// Frame accepted, ACK not yet sent
    Ack,
    /// Caller aborted the data phase, ACK-ABORT not yet sent
    AckAbort,
}

impl PendingAck {
    /// Sync packet type that discharges this acknowledgment
    pub fn packet_type(self) -> Option<PacketType> {
        match self {
            PendingAck::None => None,
            PendingAck::Ack => Some(PacketType::Ack),
            PendingAck::AckAbort => Some(PacketType::AckAbort),
        }
    }
}

/// Session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pending: PendingAck,
    back_to_back_write: bool,
}

impl Session {
    /// Fresh session: nothing owed, link idle
    pub const fn new() -> Self {
        Self {
            pending: PendingAck::None,
            back_to_back_write: false,
        }
    }

    /// What is currently owed
    pub fn pending(&self) -> PendingAck {
        self.pending
    }

    /// Record that a frame was accepted and needs an ACK
    pub fn owe_ack(&mut self) {
        self.pending = PendingAck::Ack;
    }

    /// Take the owed acknowledgment, leaving nothing owed
    pub fn take_pending(&mut self) -> PendingAck {
        core::mem::take(&mut self.pending)
    }

    /// Turn an owed ACK into an owed ACK-ABORT
    ///
    /// Anything other than an owed ACK means the caller has no frame to
    /// abort, which is a bug on their side.
    pub fn convert_to_abort(&mut self) -> Result<(), LinkError> {
        match self.pending {
            PendingAck::Ack => {
                self.pending = PendingAck::AckAbort;
                Ok(())
            }
            PendingAck::None | PendingAck::AckAbort => Err(LinkError::ContractViolation),
        }
    }

    /// Whether the last transmission was a sync frame
    pub fn back_to_back_write(&self) -> bool {
        self.back_to_back_write
    }

    /// Record a sync frame going out
    pub fn mark_sync_written(&mut self) {
        self.back_to_back_write = true;
    }

    /// Clear the back-to-back flag, returning its previous value
    pub fn clear_back_to_back(&mut self) -> bool {
        core::mem::replace(&mut self.back_to_back_write, false)
    }

    /// Idle means nothing owed and no sync write still in flight
    ///
    /// Only an idle link answers a PING.
    pub fn is_idle(&self) -> bool {
        self.pending == PendingAck::None && !self.back_to_back_write
    }
}
