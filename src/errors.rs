//! Error types for RUDP operations
//!
//! Only channel-level failures, retry exhaustion and caller mistakes are
//! represented here. Corruption, duplicates and reordering are expected on
//! an unreliable network and never leave the sender/receiver logic.

use std::io;

use thiserror::Error;

use crate::contracts::SequenceNumber;

/// Result type alias for RUDP operations
pub type Result<T> = std::result::Result<T, RudpError>;

/// RUDP error enumeration
#[derive(Debug, Error)]
pub enum RudpError {
    /// The datagram channel could not be created, configured or bound
    #[error("failed to create transport: {0}")]
    TransportCreateFailed(#[source] io::Error),

    /// A datagram could not be handed to the channel
    #[error("failed to send datagram: {0}")]
    TransportSendFailed(#[source] io::Error),

    /// The channel reported a failure other than a timeout while receiving
    #[error("failed to receive datagram: {0}")]
    TransportReceiveFailed(#[source] io::Error),

    /// The channel reported a pending error while being released
    #[error("failed to close transport: {0}")]
    TransportCloseFailed(#[source] io::Error),

    /// No matching acknowledgment arrived within the retry budget.
    /// The sequence number stays consumed.
    #[error("no acknowledgment for sequence {sequence} after {attempts} attempts")]
    AckTimeoutExhausted {
        sequence: SequenceNumber,
        attempts: u32,
    },

    /// Caller payload exceeds the configured maximum; nothing was sent
    #[error("payload of {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl RudpError {
    /// True for failures of the underlying datagram channel
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportCreateFailed(_)
                | Self::TransportSendFailed(_)
                | Self::TransportReceiveFailed(_)
                | Self::TransportCloseFailed(_)
        )
    }
}
