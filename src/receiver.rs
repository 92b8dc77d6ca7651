//! Receiver module - Receiver side of the protocol
//!
//! Every datagram that reaches the receiver is answered with an
//! acknowledgment: the packet's own sequence number when it is the next one
//! expected, otherwise the last sequence number delivered so the sender can
//! converge.

use std::net::SocketAddr;

use log::{debug, trace};

use crate::ack_manager::AckManager;
use crate::config::RudpConfig;
use crate::contracts::Packet;
use crate::errors::Result;
use crate::flow::RecvFlow;
use crate::transport::Transport;

pub struct Receiver;

impl Receiver {
    /// Block for one datagram and deliver it if it is the next in order
    ///
    /// At most `buffer.len()` payload bytes are copied; a longer payload is
    /// truncated but still counts as delivered.
    ///
    /// # Returns
    /// Bytes written into `buffer` and the sender's address. Zero bytes means
    /// the datagram was a duplicate, out of order, or corrupt; it has been
    /// dropped and the last delivered sequence re-acknowledged.
    ///
    /// # Errors
    /// Transport failures only. Protocol anomalies are never errors here.
    pub fn receive<T: Transport + ?Sized>(
        transport: &mut T,
        buffer: &mut [u8],
        flow: &mut RecvFlow,
        config: &RudpConfig,
    ) -> Result<(usize, SocketAddr)> {
        let mut frame = vec![0u8; config.max_frame_len()];

        let (len, source) = loop {
            if let Some(received) = transport.recv_datagram(&mut frame, None)? {
                break received;
            }
        };

        let data = match Packet::decode(&frame[..len], config.max_payload()) {
            Ok(Packet::Data(data)) => data,
            Ok(Packet::Ack { sequence_number }) => {
                debug!("unexpected ack {} from {}", sequence_number, source);
                return Self::reject(transport, flow, source);
            }
            Err(e) => {
                debug!("dropping frame from {}: {}", source, e);
                return Self::reject(transport, flow, source);
            }
        };

        if !flow.is_expected(data.sequence_number()) {
            debug!(
                "expected {}, got {} from {}",
                flow.next_expected_sequence(),
                data.sequence_number(),
                source
            );
            return Self::reject(transport, flow, source);
        }

        AckManager::send_ack(transport, data.sequence_number(), source)?;
        flow.advance();

        let delivered = data.payload().len().min(buffer.len());
        buffer[..delivered].copy_from_slice(&data.payload()[..delivered]);
        trace!(
            "delivered {} of {} bytes for {} from {}",
            delivered,
            data.payload().len(),
            data.sequence_number(),
            source
        );

        Ok((delivered, source))
    }

    /// Re-acknowledge the last delivered sequence without advancing
    fn reject<T: Transport + ?Sized>(
        transport: &mut T,
        flow: &RecvFlow,
        source: SocketAddr,
    ) -> Result<(usize, SocketAddr)> {
        AckManager::send_ack(transport, flow.last_delivered(), source)?;
        Ok((0, source))
    }
}
