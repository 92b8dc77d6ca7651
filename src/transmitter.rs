//! Transmitter module - Sender side of the protocol
//!
//! Stop-and-wait: one data packet is in flight, retransmitted until its
//! acknowledgment arrives or the retry budget runs out.

use std::net::SocketAddr;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::ack_manager::AckManager;
use crate::config::RudpConfig;
use crate::contracts::{Packet, SequenceNumber};
use crate::errors::{Result, RudpError};
use crate::flow::SendFlow;
use crate::transport::Transport;

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitMetrics {
    /// Sequence number the message travelled under
    pub sequence: SequenceNumber,

    /// Transmissions performed, 1 when the first attempt was acknowledged
    pub attempts: u32,

    /// Total bytes handed to the transport across all attempts
    pub bytes_sent: u64,

    /// Wall time from first transmission to acknowledgment in microseconds
    pub total_us: u64,
}

/// Transmitter - Reliable send over an unreliable transport
pub struct Transmitter;

impl Transmitter {
    /// Deliver `payload` to `destination`, blocking until it is acknowledged
    ///
    /// # Arguments
    /// * `transport` - Channel to send on; acknowledgments are read from it too
    /// * `payload` - Message bytes, at most `config.max_payload()`
    /// * `destination` - Peer address
    /// * `flow` - Sender state of this flow; one sequence number is consumed
    /// * `config` - Retry budget and per-attempt timeout
    ///
    /// # Errors
    /// - `PayloadTooLarge` before anything is sent or any sequence consumed
    /// - `TransportSendFailed` / `TransportReceiveFailed` immediately
    /// - `AckTimeoutExhausted` after `config.max_retries()` unanswered attempts
    pub fn send<T: Transport + ?Sized>(
        transport: &mut T,
        payload: &[u8],
        destination: SocketAddr,
        flow: &mut SendFlow,
        config: &RudpConfig,
    ) -> Result<TransmitMetrics> {
        if payload.len() > config.max_payload() {
            return Err(RudpError::PayloadTooLarge {
                len: payload.len(),
                max: config.max_payload(),
            });
        }

        let sequence = flow.assign();
        let frame = Packet::data(sequence, payload, config.max_payload())?.encode();
        let mut reply = AckManager::reply_buffer();

        let start = Instant::now();
        let mut bytes_sent = 0u64;

        for attempt in 1..=config.max_retries() {
            trace!(
                "sending {} ({} bytes) to {}, attempt {}/{}",
                sequence,
                payload.len(),
                destination,
                attempt,
                config.max_retries()
            );
            transport.send_datagram(&frame, destination)?;
            bytes_sent += frame.len() as u64;

            if AckManager::wait_for_ack(transport, sequence, config.ack_timeout(), &mut reply)? {
                return Ok(TransmitMetrics {
                    sequence,
                    attempts: attempt,
                    bytes_sent,
                    total_us: start.elapsed().as_micros() as u64,
                });
            }

            debug!("attempt {} for {} unacknowledged", attempt, sequence);
        }

        warn!(
            "giving up on {} to {} after {} attempts",
            sequence,
            destination,
            config.max_retries()
        );
        Err(RudpError::AckTimeoutExhausted {
            sequence,
            attempts: config.max_retries(),
        })
    }
}
