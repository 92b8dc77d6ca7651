//! Per-direction flow state
//!
//! Each direction of a flow owns exactly one of these values and passes it
//! by `&mut` into every send or receive, so a single writer is enforced by
//! the borrow checker. Callers sharing a flow across threads must wrap the
//! whole send/receive call in their own lock.

use crate::contracts::SequenceNumber;

/// Sender side of a flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendFlow {
    last_sequence_sent: SequenceNumber,
}

impl SendFlow {
    /// Start a flow whose first message carries sequence 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flow at an arbitrary sequence number
    pub fn starting_at(sequence: SequenceNumber) -> Self {
        Self {
            last_sequence_sent: sequence,
        }
    }

    /// Sequence number the next message will be assigned
    pub fn last_sequence_sent(&self) -> SequenceNumber {
        self.last_sequence_sent
    }

    /// Claim the next sequence number. Claimed numbers are never reused,
    /// even if the send they were claimed for fails.
    pub fn assign(&mut self) -> SequenceNumber {
        let sequence = self.last_sequence_sent;
        self.last_sequence_sent = sequence.wrapping_add(1);
        sequence
    }
}

/// Receiver side of a flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecvFlow {
    next_expected_sequence: SequenceNumber,
}

impl RecvFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(sequence: SequenceNumber) -> Self {
        Self {
            next_expected_sequence: sequence,
        }
    }

    /// The only sequence number accepted as new data
    pub fn next_expected_sequence(&self) -> SequenceNumber {
        self.next_expected_sequence
    }

    /// Sequence re-acknowledged when a packet is rejected.
    ///
    /// Wraps to `u32::MAX` before anything has been delivered.
    pub fn last_delivered(&self) -> SequenceNumber {
        self.next_expected_sequence.wrapping_sub(1)
    }

    pub fn is_expected(&self, sequence: SequenceNumber) -> bool {
        sequence == self.next_expected_sequence
    }

    pub(crate) fn advance(&mut self) {
        self.next_expected_sequence = self.next_expected_sequence.wrapping_add(1);
    }
}
