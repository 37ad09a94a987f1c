//! Packet interface for the command layer
//!
//! The command interpreter (erase, program, verify) is written against this
//! trait rather than a concrete link, so other packet transports can be
//! slotted in underneath it.

use bootlink_hal::{Clock, SerialTx};

use crate::error::LinkError;
use crate::frame::PacketKind;
use crate::link::SerialLink;

/// A packet-level channel to the host
pub trait PacketInterface {
    /// Receive the next packet of the given kind
    fn read_packet(&mut self, kind: PacketKind) -> Result<&[u8], LinkError>;

    /// Send a packet and wait until the host has accepted it
    fn write_packet(&mut self, payload: &[u8], kind: PacketKind) -> Result<(), LinkError>;

    /// Abandon the data phase of the last received packet
    fn abort_data_phase(&mut self) -> Result<(), LinkError>;

    /// Flush any acknowledgment still owed to the host
    fn finalize(&mut self) -> Result<(), LinkError>;

    /// Largest payload either direction can carry
    fn max_packet_size(&self) -> usize;
}

impl<'r, T, C, const R: usize, const N: usize> PacketInterface for SerialLink<'r, T, C, R, N>
where
    T: SerialTx,
    C: Clock,
{
    fn read_packet(&mut self, kind: PacketKind) -> Result<&[u8], LinkError> {
        self.read(kind)
    }

    fn write_packet(&mut self, payload: &[u8], kind: PacketKind) -> Result<(), LinkError> {
        self.write(payload, kind)
    }

    fn abort_data_phase(&mut self) -> Result<(), LinkError> {
        self.abort()
    }

    fn finalize(&mut self) -> Result<(), LinkError> {
        SerialLink::finalize(self)
    }

    fn max_packet_size(&self) -> usize {
        self.max_payload_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::frame::{sync_frame, PacketType, DEFAULT_PACKET_SIZE};
    use crate::mock::{feed, host_frame, MockHost, StepClock};
    use crate::ring::ByteRing;
    use heapless::Vec;

    /// Minimal command loop: answer each command with its own bytes reversed
    fn reverse_one<P: PacketInterface>(packets: &mut P) -> Result<usize, LinkError> {
        let mut response = Vec::<u8, DEFAULT_PACKET_SIZE>::new();
        {
            let command = packets.read_packet(PacketKind::Command)?;
            response
                .extend_from_slice(command)
                .map_err(|_| LinkError::InvalidArgument)?;
        }
        response.reverse();
        packets.write_packet(&response, PacketKind::Command)?;
        Ok(response.len())
    }

    /// Accept a command, then refuse its data phase
    fn refuse_data<P: PacketInterface>(packets: &mut P) -> Result<(), LinkError> {
        packets.read_packet(PacketKind::Command)?;
        packets.abort_data_phase()?;
        packets.finalize()
    }

    #[test]
    fn test_command_round_trip_through_trait() {
        let ring = ByteRing::<256>::new();
        let mut link: SerialLink<'_, MockHost<'_, 256>, StepClock, 256> = SerialLink::new(
            MockHost::new(&ring),
            ring.take_consumer().unwrap(),
            StepClock::new(),
            LinkConfig::default(),
        );
        feed(&ring, &host_frame(PacketKind::Command, &[1, 2, 3]));
        link.transport_mut().reply_sync(PacketType::Ack);

        assert_eq!(link.max_packet_size(), DEFAULT_PACKET_SIZE);
        assert_eq!(reverse_one(&mut link), Ok(3));

        let mut expected = sync_frame(PacketType::Ack).to_vec();
        expected.extend(host_frame(PacketKind::Command, &[3, 2, 1]));
        assert_eq!(link.transport().wire(), expected);
    }

    #[test]
    fn test_abort_through_trait() {
        let ring = ByteRing::<256>::new();
        let mut link: SerialLink<'_, MockHost<'_, 256>, StepClock, 256> = SerialLink::new(
            MockHost::new(&ring),
            ring.take_consumer().unwrap(),
            StepClock::new(),
            LinkConfig::default(),
        );
        feed(&ring, &host_frame(PacketKind::Command, &[0x04]));

        assert_eq!(refuse_data(&mut link), Ok(()));
        assert_eq!(
            link.transport().sent(),
            &[sync_frame(PacketType::AckAbort).to_vec()]
        );
    }
}
