//! RUDP Core - Reliable delivery over unreliable datagrams
//!
//! **Creator**: Shayan Golmezerji
//! **License**: Creative Commons Attribution 4.0 International (CC BY 4.0)
//!
//! This library adds corruption detection, in-order delivery and
//! retransmission on top of a lossy, reordering, duplicating datagram
//! channel such as UDP. One message travels per packet and exactly one
//! packet is in flight at a time (stop-and-wait ARQ).
//!
//! # Design Principles
//! - Explicit per-direction flow state, no process-wide counters
//! - Data and acknowledgment frames as distinct variants on the wire
//! - Network byte order for every multi-byte field
//! - Protocol anomalies (loss, duplicates, corruption) are absorbed,
//!   only transport failures and retry exhaustion reach the caller
//!
//! # Layout
//! - [`checksum`]      - 16-bit one's-complement Internet checksum
//! - [`contracts`]     - wire frames and the [`Packet`] codec
//! - [`flow`]          - per-direction sequence state
//! - [`config`]        - protocol parameters
//! - [`transport`]     - datagram channel abstraction and the UDP adapter
//! - [`ack_manager`]   - acknowledgment emission and matching
//! - [`transmitter`]   - sender retry loop
//! - [`receiver`]      - receiver validation and ordering
//! - [`endpoint`]      - socket-like bundle of transport, config and flows
//! - [`simulator`]     - in-memory fault-injecting network for tests

pub mod ack_manager;
pub mod checksum;
pub mod config;
pub mod contracts;
pub mod endpoint;
pub mod errors;
pub mod flow;
pub mod receiver;
pub mod simulator;
pub mod transmitter;
pub mod transport;

pub use config::{RudpConfig, RudpConfigBuilder};
pub use contracts::{DataPacket, DecodeError, Packet, SequenceNumber};
pub use endpoint::Endpoint;
pub use errors::{Result, RudpError};
pub use flow::{RecvFlow, SendFlow};
pub use receiver::Receiver;
pub use transmitter::{TransmitMetrics, Transmitter};
pub use transport::{Transport, UdpTransport};

/// Maximum payload size (in bytes) carried by a single data packet
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Transmission attempts per message before giving up
pub const MAX_RETRANSMIT_ATTEMPTS: u32 = 3;

/// Whole-second part of the per-attempt acknowledgment timeout
pub const ACK_TIMEOUT_SECONDS: u64 = 1;

/// Microsecond part of the per-attempt acknowledgment timeout
pub const ACK_TIMEOUT_MICROS: u32 = 0;

/// Socket send buffer requested when opening a UDP transport
pub const SEND_BUFFER_SIZE: usize = 64 * 1024;
