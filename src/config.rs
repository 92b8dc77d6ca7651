//! Protocol parameters
//!
//! Every tunable travels in a [`RudpConfig`] passed to each call; the
//! crate-level constants are only defaults.

use std::time::Duration;

use crate::contracts::DATA_HEADER_LEN;
use crate::errors::{Result, RudpError};

/// Validated protocol configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RudpConfig {
    max_payload: usize,
    max_retries: u32,
    ack_timeout: Duration,
    send_buffer_size: usize,
}

impl RudpConfig {
    pub fn builder() -> RudpConfigBuilder {
        RudpConfigBuilder::new()
    }

    /// Largest payload a single packet may carry
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Transmission attempts per message
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// How long each attempt waits for its acknowledgment
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }

    /// Send buffer requested from the OS by [`crate::UdpTransport::open`]
    pub fn send_buffer_size(&self) -> usize {
        self.send_buffer_size
    }

    /// Size of a data frame carrying a full payload
    pub fn max_frame_len(&self) -> usize {
        DATA_HEADER_LEN + self.max_payload
    }
}

impl Default for RudpConfig {
    fn default() -> Self {
        Self {
            max_payload: crate::MAX_PAYLOAD_SIZE,
            max_retries: crate::MAX_RETRANSMIT_ATTEMPTS,
            ack_timeout: default_ack_timeout(),
            send_buffer_size: crate::SEND_BUFFER_SIZE,
        }
    }
}

fn default_ack_timeout() -> Duration {
    Duration::from_secs(crate::ACK_TIMEOUT_SECONDS)
        + Duration::from_micros(u64::from(crate::ACK_TIMEOUT_MICROS))
}

/// RudpConfigBuilder - Fluent interface for protocol configuration
pub struct RudpConfigBuilder {
    max_payload: usize,
    max_retries: u32,
    ack_timeout: Duration,
    send_buffer_size: usize,
}

impl RudpConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        let defaults = RudpConfig::default();
        Self {
            max_payload: defaults.max_payload,
            max_retries: defaults.max_retries,
            ack_timeout: defaults.ack_timeout,
            send_buffer_size: defaults.send_buffer_size,
        }
    }

    /// Set maximum payload size in bytes
    pub fn with_max_payload(mut self, bytes: usize) -> Self {
        self.max_payload = bytes;
        self
    }

    /// Set transmission attempts per message
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the per-attempt acknowledgment timeout
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the per-attempt acknowledgment timeout from seconds and microseconds
    pub fn with_ack_timeout_parts(mut self, seconds: u64, micros: u32) -> Self {
        self.ack_timeout = Duration::from_secs(seconds) + Duration::from_micros(u64::from(micros));
        self
    }

    /// Set the socket send buffer size in bytes
    pub fn with_send_buffer_size(mut self, bytes: usize) -> Self {
        self.send_buffer_size = bytes;
        self
    }

    /// Validate and freeze the configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the payload limit is zero or does not fit
    /// the 16-bit length field, if the retry budget is zero, or if the ack
    /// timeout is zero (a zero socket timeout means "block forever").
    pub fn build(self) -> Result<RudpConfig> {
        if self.max_payload == 0 {
            return Err(RudpError::InvalidConfig("max_payload must be non-zero"));
        }
        if self.max_payload > u16::MAX as usize {
            return Err(RudpError::InvalidConfig(
                "max_payload must fit the 16-bit length field",
            ));
        }
        if self.max_retries == 0 {
            return Err(RudpError::InvalidConfig("max_retries must be non-zero"));
        }
        if self.ack_timeout.is_zero() {
            return Err(RudpError::InvalidConfig("ack_timeout must be non-zero"));
        }

        Ok(RudpConfig {
            max_payload: self.max_payload,
            max_retries: self.max_retries,
            ack_timeout: self.ack_timeout,
            send_buffer_size: self.send_buffer_size,
        })
    }
}

impl Default for RudpConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
