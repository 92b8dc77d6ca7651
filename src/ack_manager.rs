//! ACK Manager module - Acknowledgment emission and matching
//!
//! Acknowledgments carry nothing but a sequence number. The receiver emits
//! one for every datagram it handles; the sender waits for the one that
//! matches its in-flight packet and treats anything else as a miss.

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, trace};

use crate::contracts::{Packet, SequenceNumber, ACK_FRAME_LEN};
use crate::errors::Result;
use crate::transport::Transport;

/// ACK Manager - Stateless acknowledgment helpers
pub struct AckManager;

impl AckManager {
    /// Send an acknowledgment for `sequence` to `destination`
    pub fn send_ack<T: Transport + ?Sized>(
        transport: &mut T,
        sequence: SequenceNumber,
        destination: SocketAddr,
    ) -> Result<()> {
        trace!("ack {} -> {}", sequence, destination);
        transport.send_datagram(&Packet::ack(sequence).encode(), destination)
    }

    /// Wait up to `timeout` for a single datagram and check whether it
    /// acknowledges `sequence`
    ///
    /// # Arguments
    /// * `transport` - Channel the data packet was sent on
    /// * `sequence` - Sequence number of the in-flight packet
    /// * `timeout` - Per-attempt deadline
    /// * `buffer` - Scratch space for the incoming datagram
    ///
    /// # Returns
    /// `true` if a matching acknowledgment arrived, `false` on timeout, an
    /// undecodable datagram, a data frame, or an acknowledgment for another
    /// sequence number
    pub fn wait_for_ack<T: Transport + ?Sized>(
        transport: &mut T,
        sequence: SequenceNumber,
        timeout: Duration,
        buffer: &mut [u8],
    ) -> Result<bool> {
        let (len, source) = match transport.recv_datagram(buffer, Some(timeout))? {
            Some(received) => received,
            None => {
                debug!("no ack for {} within {:?}", sequence, timeout);
                return Ok(false);
            }
        };

        // acks never carry a payload, so a zero limit rejects stray data frames
        match Packet::decode(&buffer[..len], 0) {
            Ok(Packet::Ack { sequence_number }) if sequence_number == sequence => {
                trace!("ack {} <- {}", sequence_number, source);
                Ok(true)
            }
            Ok(other) => {
                debug!(
                    "waiting for ack {}, got {} {} from {}",
                    sequence,
                    kind_name(&other),
                    other.sequence_number(),
                    source
                );
                Ok(false)
            }
            Err(e) => {
                debug!("dropping undecodable reply from {}: {}", source, e);
                Ok(false)
            }
        }
    }

    /// Scratch buffer size for [`Self::wait_for_ack`]
    ///
    /// One byte larger than an ack frame so oversized replies are seen as
    /// such rather than silently truncated into a valid ack.
    pub fn reply_buffer() -> Vec<u8> {
        vec![0u8; ACK_FRAME_LEN + 1]
    }
}

fn kind_name(packet: &Packet) -> &'static str {
    match packet {
        Packet::Data(_) => "data",
        Packet::Ack { .. } => "ack",
    }
}
