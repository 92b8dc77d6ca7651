//! Wire contracts for the RUDP protocol
//!
//! Every datagram is either a data frame or an acknowledgment frame. The
//! first byte tags the kind so the two can never be confused, and all
//! multi-byte integers are big-endian.
//!
//! # Data frame
//! ```text
//! +------+-----------------+----------------+-----------+-------------------+
//! | kind | sequence number | payload length | checksum  | payload ...       |
//! | 0x01 | u32             | u16            | u16       | payload length B  |
//! +------+-----------------+----------------+-----------+-------------------+
//! ```
//! Bytes after the declared payload are ignored, so a peer that pads frames
//! to full capacity is still understood.
//!
//! # Acknowledgment frame
//! ```text
//! +------+-----------------+
//! | kind | sequence number |
//! | 0x02 | u32             |
//! +------+-----------------+
//! ```

use thiserror::Error;

use crate::checksum;
use crate::errors::{Result, RudpError};

/// Flow-relative packet identifier
pub type SequenceNumber = u32;

/// Kind tag of a data frame
pub const KIND_DATA: u8 = 0x01;

/// Kind tag of an acknowledgment frame
pub const KIND_ACK: u8 = 0x02;

/// Data frame header size: kind(1) + seq(4) + len(2) + checksum(2)
pub const DATA_HEADER_LEN: usize = 9;

/// Acknowledgment frame size: kind(1) + seq(4)
pub const ACK_FRAME_LEN: usize = 5;

const OFF_SEQ: usize = 1;
const OFF_PAYLOAD_LEN: usize = 5;
const OFF_CHECKSUM: usize = 7;

/// Reasons a received frame cannot be trusted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame ends before the header or declared payload does
    #[error("frame truncated: need {needed} bytes, got {received}")]
    Truncated { needed: usize, received: usize },

    /// First byte is not a known frame kind
    #[error("unknown frame kind {0:#04x}")]
    UnknownKind(u8),

    /// Declared payload length exceeds the receiver's limit
    #[error("declared payload of {declared} bytes exceeds maximum of {max}")]
    PayloadTooLarge { declared: usize, max: usize },

    /// Acknowledgment frame with trailing or missing bytes
    #[error("acknowledgment frame must be 5 bytes, got {0}")]
    InvalidAckLength(usize),

    /// Payload bytes do not match the carried checksum
    #[error("checksum mismatch: frame carries {carried:#06x}, payload sums to {computed:#06x}")]
    ChecksumMismatch { carried: u16, computed: u16 },
}

/// A data packet carrying one message
///
/// Fields are private so the payload can never outgrow what the 16-bit
/// length field can express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    sequence_number: SequenceNumber,
    checksum: u16,
    payload: Vec<u8>,
}

impl DataPacket {
    /// Build a data packet and checksum its payload
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` if `payload` is longer than `max_payload`
    /// (or than `u16::MAX`, whichever is smaller).
    pub fn new(
        sequence_number: SequenceNumber,
        payload: &[u8],
        max_payload: usize,
    ) -> Result<Self> {
        let max = max_payload.min(u16::MAX as usize);
        if payload.len() > max {
            return Err(RudpError::PayloadTooLarge {
                len: payload.len(),
                max,
            });
        }

        Ok(Self {
            sequence_number,
            checksum: checksum::compute(payload),
            payload: payload.to_vec(),
        })
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Unit exchanged on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Message bytes with their sequence number and checksum
    Data(DataPacket),
    /// Confirms receipt of `sequence_number`
    Ack { sequence_number: SequenceNumber },
}

impl Packet {
    /// Shorthand for a checksummed data packet
    pub fn data(
        sequence_number: SequenceNumber,
        payload: &[u8],
        max_payload: usize,
    ) -> Result<Self> {
        DataPacket::new(sequence_number, payload, max_payload).map(Self::Data)
    }

    pub fn ack(sequence_number: SequenceNumber) -> Self {
        Self::Ack { sequence_number }
    }

    pub fn sequence_number(&self) -> SequenceNumber {
        match self {
            Self::Data(data) => data.sequence_number,
            Self::Ack { sequence_number } => *sequence_number,
        }
    }

    /// Serialize into a freshly allocated frame
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Data(data) => {
                let mut buf = Vec::with_capacity(DATA_HEADER_LEN + data.payload.len());
                buf.push(KIND_DATA);
                buf.extend_from_slice(&data.sequence_number.to_be_bytes());
                // DataPacket::new caps the payload at u16::MAX
                buf.extend_from_slice(&(data.payload.len() as u16).to_be_bytes());
                buf.extend_from_slice(&data.checksum.to_be_bytes());
                buf.extend_from_slice(&data.payload);
                buf
            }
            Self::Ack { sequence_number } => {
                let mut buf = Vec::with_capacity(ACK_FRAME_LEN);
                buf.push(KIND_ACK);
                buf.extend_from_slice(&sequence_number.to_be_bytes());
                buf
            }
        }
    }

    /// Parse and validate a received frame
    ///
    /// Lengths are checked before any declared value is trusted, and data
    /// payloads must match their checksum.
    pub fn decode(bytes: &[u8], max_payload: usize) -> std::result::Result<Self, DecodeError> {
        let kind = *bytes.first().ok_or(DecodeError::Truncated {
            needed: 1,
            received: 0,
        })?;

        match kind {
            KIND_ACK => {
                if bytes.len() != ACK_FRAME_LEN {
                    return Err(DecodeError::InvalidAckLength(bytes.len()));
                }
                Ok(Self::Ack {
                    sequence_number: read_u32(bytes, OFF_SEQ),
                })
            }
            KIND_DATA => Self::decode_data(bytes, max_payload).map(Self::Data),
            other => Err(DecodeError::UnknownKind(other)),
        }
    }

    fn decode_data(bytes: &[u8], max_payload: usize) -> std::result::Result<DataPacket, DecodeError> {
        if bytes.len() < DATA_HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: DATA_HEADER_LEN,
                received: bytes.len(),
            });
        }

        let sequence_number = read_u32(bytes, OFF_SEQ);
        let payload_len = usize::from(read_u16(bytes, OFF_PAYLOAD_LEN));
        let carried = read_u16(bytes, OFF_CHECKSUM);

        if payload_len > max_payload {
            return Err(DecodeError::PayloadTooLarge {
                declared: payload_len,
                max: max_payload,
            });
        }

        let end = DATA_HEADER_LEN + payload_len;
        let payload = bytes.get(DATA_HEADER_LEN..end).ok_or(DecodeError::Truncated {
            needed: end,
            received: bytes.len(),
        })?;

        let computed = checksum::compute(payload);
        if computed != carried {
            return Err(DecodeError::ChecksumMismatch { carried, computed });
        }

        Ok(DataPacket {
            sequence_number,
            checksum: carried,
            payload: payload.to_vec(),
        })
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
