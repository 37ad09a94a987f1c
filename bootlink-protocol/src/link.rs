//! Serial packet link
//!
//! [`SerialLink`] is the device side of the bootloader serial protocol. It
//! owns everything one session needs: the consumer end of the receive ring,
//! the transport, the clock, the receive buffer, the retained outgoing frame
//! and the acknowledgment flags.
//!
//! # Receive path
//!
//! ```text
//! seek 0x5A ─▶ type ─▶ length ─▶ crc16 ─▶ payload ─▶ verify
//!    ▲           │                                    │
//!    │          PING ─▶ answer if idle                │
//!    └───────────┴──────────────── NAK ◀── mismatch ──┘
//! ```
//!
//! A frame that verifies is not ACKed straight away. The ACK is owed and goes
//! out at the start of the next `read`, `write` or `finalize`.
//!
//! # Transmit path
//!
//! `write` sends the data frame and then waits for the host's sync reply:
//! ACK finishes the write, NAK resends the same frame, ACK-ABORT ends the
//! data phase.

use bootlink_hal::{Clock, RxCallback, Serial, SerialTx};

use crate::config::LinkConfig;
use crate::error::{Expectation, LinkError};
use crate::frame::{
    sync_frame, DataHeader, OutgoingFrame, PacketKind, PacketType, DEFAULT_PACKET_SIZE,
    START_BYTE,
};
use crate::reader::ByteReader;
use crate::ring::RxConsumer;
use crate::session::Session;

/// Outcome of one pass through the frame reader
enum Inbound {
    /// A complete data frame; payload is in the receive buffer
    Frame(DataHeader),
    /// A PING was handled; nothing for the caller
    Ping,
}

/// Device end of the serial packet protocol
///
/// - `R`: receive ring capacity
/// - `N`: payload capacity for both directions
pub struct SerialLink<'r, T, C, const R: usize, const N: usize = DEFAULT_PACKET_SIZE> {
    transport: T,
    reader: ByteReader<'r, C, R>,
    config: LinkConfig,
    session: Session,
    rx_buf: [u8; N],
    last_frame: OutgoingFrame<N>,
}

impl<'r, T, C, const R: usize, const N: usize> SerialLink<'r, T, C, R, N>
where
    T: SerialTx,
    C: Clock,
{
    /// Create a link over an already receiving transport
    pub fn new(transport: T, rx: RxConsumer<'r, R>, clock: C, config: LinkConfig) -> Self {
        Self {
            transport,
            reader: ByteReader::new(rx, clock),
            config,
            session: Session::new(),
            rx_buf: [0; N],
            last_frame: OutgoingFrame::new(),
        }
    }

    /// Route the transport's receive interrupt to `on_byte`, then create the link
    ///
    /// `on_byte` normally enqueues into the static ring `rx` was taken from.
    pub fn start(
        mut transport: T,
        rx: RxConsumer<'r, R>,
        clock: C,
        config: LinkConfig,
        on_byte: RxCallback,
    ) -> Result<Self, LinkError>
    where
        T: Serial,
    {
        if transport.enable_rx_callback(on_byte).is_err() {
            warn!("failed to enable serial receive interrupt");
            return Err(LinkError::Transport);
        }
        debug!("serial link started");
        Ok(Self::new(transport, rx, clock, config))
    }

    /// Receive the next command or data packet
    ///
    /// Blocks until a frame of the requested kind with a valid CRC arrives.
    /// Frames with a bad CRC are NAKed and read again; pings are answered
    /// and skipped. The returned payload stays valid until the next call.
    pub fn read(&mut self, kind: PacketKind) -> Result<&[u8], LinkError> {
        self.session.clear_back_to_back();
        self.send_deferred_ack()?;

        let length = loop {
            // Parameters the host leaves out read as zero
            self.rx_buf.fill(0);

            let header = match self.read_data_frame(kind)? {
                Inbound::Ping => continue,
                Inbound::Frame(header) => header,
            };

            let length = usize::from(header.length);
            match header.verify(&self.rx_buf[..length]) {
                Ok(()) => break length,
                Err(e) => {
                    warn!("dropping frame: {:?}", e);
                    self.send_sync(PacketType::Nak)?;
                }
            }
        };

        self.session.owe_ack();
        Ok(&self.rx_buf[..length])
    }

    /// Send a command or data packet and wait for the host to accept it
    pub fn write(&mut self, payload: &[u8], kind: PacketKind) -> Result<(), LinkError> {
        if payload.len() > N {
            error!("payload of {} bytes exceeds {} byte buffer", payload.len(), N);
            return Err(LinkError::InvalidArgument);
        }

        self.send_deferred_ack()?;

        if self.session.clear_back_to_back() && self.config.back_to_back_delay_ms > 0 {
            self.reader.delay_ms(self.config.back_to_back_delay_ms);
        }

        self.last_frame
            .load(kind, payload)
            .map_err(|_| LinkError::InvalidArgument)?;
        self.transmit_last_frame()?;

        self.wait_for_sync()
    }

    /// Abort the data phase of the last received packet
    ///
    /// The owed ACK becomes an ACK-ABORT, sent by the next read, write or
    /// finalize. Only valid while an ACK is owed.
    pub fn abort(&mut self) -> Result<(), LinkError> {
        self.session.convert_to_abort().inspect_err(|_| {
            error!("abort() without an ACK owed");
        })
    }

    /// Send any owed acknowledgment now
    ///
    /// For the end of a transaction, when no further read or write will
    /// carry it out.
    pub fn finalize(&mut self) -> Result<(), LinkError> {
        self.send_deferred_ack()
    }

    /// Largest payload `read` can return and `write` can send
    pub fn max_payload_size(&self) -> usize {
        N
    }

    /// Transmit a sync frame
    pub fn send_sync(&mut self, packet_type: PacketType) -> Result<(), LinkError> {
        self.session.mark_sync_written();
        Self::send_all(&mut self.transport, &sync_frame(packet_type))
    }

    /// Session flags
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn send_deferred_ack(&mut self) -> Result<(), LinkError> {
        match self.session.take_pending().packet_type() {
            Some(packet_type) => self.send_sync(packet_type),
            None => Ok(()),
        }
    }

    fn wait_for_sync(&mut self) -> Result<(), LinkError> {
        loop {
            let raw = self.read_header()?;
            match PacketType::from_byte(raw) {
                Some(PacketType::Ack) => return Ok(()),
                Some(PacketType::AckAbort) => {
                    debug!("host aborted the data phase");
                    return Err(LinkError::Aborted);
                }
                Some(PacketType::Nak) => {
                    debug!("NAK received, resending frame");
                    self.transmit_last_frame()?;
                }
                _ => {
                    warn!("unexpected sync byte {:#x}, expected ACK, NAK or ACK-ABORT", raw);
                    return Err(LinkError::UnexpectedPacket {
                        expected: Expectation::Sync,
                        found: raw,
                    });
                }
            }
        }
    }

    fn transmit_last_frame(&mut self) -> Result<(), LinkError> {
        Self::send_all(&mut self.transport, &self.last_frame.header().encode())?;
        let payload = self.last_frame.payload();
        if payload.is_empty() {
            return Ok(());
        }
        Self::send_all(&mut self.transport, payload)
    }

    fn send_all(transport: &mut T, bytes: &[u8]) -> Result<(), LinkError> {
        match transport.send(bytes) {
            Ok(sent) if sent == bytes.len() => Ok(()),
            Ok(sent) => {
                warn!("short write: {} of {} bytes", sent, bytes.len());
                Err(LinkError::Transport)
            }
            Err(_) => {
                warn!("transport failed sending {} bytes", bytes.len());
                Err(LinkError::Transport)
            }
        }
    }

    fn read_data_frame(&mut self, kind: PacketKind) -> Result<Inbound, LinkError> {
        let raw = self.read_header()?;
        let expected = kind.packet_type();

        match PacketType::from_byte(raw) {
            Some(PacketType::Ping) => {
                self.answer_ping()?;
                return Ok(Inbound::Ping);
            }
            Some(found) if found == expected => {}
            _ => {
                warn!("unexpected packet type {:#x}, expected {:?}", raw, expected);
                return Err(LinkError::UnexpectedPacket {
                    expected: Expectation::Frame(expected),
                    found: raw,
                });
            }
        }

        let wire_length = self.read_u16()?;
        // Anything past our buffer is left on the wire
        let length = wire_length.min(u16::try_from(N).unwrap_or(u16::MAX));
        if length < wire_length {
            debug!("clamping frame length {} to {}", wire_length, length);
        }

        let crc16 = self.read_u16()?;

        let payload_len = usize::from(length);
        if payload_len > 0 {
            let timeout = self.config.timeout_for(payload_len);
            self.reader
                .read_exact(&mut self.rx_buf[..payload_len], timeout)?;
        }

        Ok(Inbound::Frame(DataHeader {
            packet_type: expected,
            length,
            crc16,
        }))
    }

    /// Wait for a start byte, then return the packet type byte after it
    fn read_header(&mut self) -> Result<u8, LinkError> {
        self.read_start_byte()?;
        self.reader.read_byte(self.config.timeout_for(1))
    }

    fn read_start_byte(&mut self) -> Result<(), LinkError> {
        // No timeout: until the host starts a frame there is nothing to time out
        loop {
            let byte = self.reader.read_byte(None)?;
            if byte == START_BYTE {
                return Ok(());
            }
            trace!("dropping stray byte {:#x}", byte);
        }
    }

    fn read_u16(&mut self) -> Result<u16, LinkError> {
        let mut bytes = [0u8; 2];
        let timeout = self.config.timeout_for(bytes.len());
        self.reader.read_exact(&mut bytes, timeout)?;
        Ok(u16::from_le_bytes(bytes))
    }

    fn answer_ping(&mut self) -> Result<(), LinkError> {
        if !self.session.is_idle() {
            debug!("ping ignored, link busy ({:?})", self.session.pending());
            return Ok(());
        }

        debug!("answering ping");
        Self::send_all(&mut self.transport, &sync_frame(PacketType::PingResponse))?;
        Self::send_all(&mut self.transport, &self.config.ping_response.encode())
    }
}
