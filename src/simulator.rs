//! In-memory network simulator for deterministic testing
//!
//! Real networks drop, duplicate and corrupt datagrams. To exercise the
//! reliability paths without depending on actual network conditions, a
//! [`SimulatedNetwork`] connects two [`SimulatedTransport`] endpoints
//! through shared queues and applies a configurable fault model on send:
//!
//! | Fault       | Description                                           |
//! |-------------|-------------------------------------------------------|
//! | Loss        | Drop a datagram with probability `loss_rate`.         |
//! | Duplication | Deliver a datagram twice with `duplicate_rate`.       |
//! | Corruption  | Flip one payload bit of a data frame, `corrupt_rate`. |
//!
//! Faults are drawn from a seeded RNG. Waits use real time, so endpoints
//! may be driven from separate threads. Dropping one endpoint wakes a peer
//! blocked without a timeout with a `TransportReceiveFailed` error.

use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::contracts::{DATA_HEADER_LEN, KIND_DATA};
use crate::errors::{Result, RudpError};
use crate::transport::Transport;

/// Configuration for the fault-injection model
///
/// All rates are probabilities in `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub loss_rate: f64,
    pub duplicate_rate: f64,
    pub corrupt_rate: f64,
    /// Seed for the fault RNG
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // no faults: a transparent pass-through
        Self {
            loss_rate: 0.0,
            duplicate_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0x5eed,
        }
    }
}

impl SimulatorConfig {
    pub fn with_loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_duplicate_rate(mut self, rate: f64) -> Self {
        self.duplicate_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_corrupt_rate(mut self, rate: f64) -> Self {
        self.corrupt_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

struct Wire {
    inboxes: [VecDeque<(Vec<u8>, SocketAddr)>; 2],
    alive: [bool; 2],
    rng: StdRng,
    config: SimulatorConfig,
}

struct Shared {
    wire: Mutex<Wire>,
    arrived: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Factory for connected endpoint pairs
pub struct SimulatedNetwork;

impl SimulatedNetwork {
    /// Create two endpoints, `10.0.0.1:4000` and `10.0.0.2:4000`, wired to
    /// each other
    pub fn pair(config: SimulatorConfig) -> (SimulatedTransport, SimulatedTransport) {
        let shared = Arc::new(Shared {
            wire: Mutex::new(Wire {
                inboxes: [VecDeque::new(), VecDeque::new()],
                alive: [true, true],
                rng: StdRng::seed_from_u64(config.seed),
                config,
            }),
            arrived: Condvar::new(),
        });

        let addrs = [endpoint_addr(1), endpoint_addr(2)];
        let make = |side: usize| SimulatedTransport {
            shared: Arc::clone(&shared),
            side,
            local_addr: addrs[side],
            peer_addr: addrs[1 - side],
            datagrams_sent: 0,
            fail_sends: false,
        };

        (make(0), make(1))
    }
}

fn endpoint_addr(host: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, host)), 4000)
}

/// One end of a [`SimulatedNetwork`]
pub struct SimulatedTransport {
    shared: Arc<Shared>,
    side: usize,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    datagrams_sent: usize,
    fail_sends: bool,
}

impl SimulatedTransport {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Datagrams handed to this endpoint, counted before any fault applies
    pub fn datagrams_sent(&self) -> usize {
        self.datagrams_sent
    }

    /// Datagrams waiting to be received by this endpoint
    pub fn pending(&self) -> usize {
        self.shared.lock().inboxes[self.side].len()
    }

    /// Make every subsequent send fail as if the channel had broken
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }
}

impl Transport for SimulatedTransport {
    fn send_datagram(&mut self, bytes: &[u8], destination: SocketAddr) -> Result<()> {
        if self.fail_sends {
            return Err(RudpError::TransportSendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated send failure",
            )));
        }
        self.datagrams_sent += 1;

        // datagrams to unknown addresses vanish, as they would on UDP
        if destination != self.peer_addr {
            trace!("sim: {} -> {} unroutable", self.local_addr, destination);
            return Ok(());
        }

        let peer = 1 - self.side;
        let mut guard = self.shared.lock();
        let wire = &mut *guard;

        if chance(&mut wire.rng, wire.config.loss_rate) {
            trace!("sim: lost {} byte datagram to {}", bytes.len(), destination);
            return Ok(());
        }

        let mut datagram = bytes.to_vec();
        if is_data_with_payload(&datagram) && chance(&mut wire.rng, wire.config.corrupt_rate) {
            let byte = wire.rng.gen_range(DATA_HEADER_LEN..datagram.len());
            let bit = wire.rng.gen_range(0..8);
            datagram[byte] ^= 1 << bit;
            trace!("sim: flipped bit {} of byte {}", bit, byte);
        }

        if chance(&mut wire.rng, wire.config.duplicate_rate) {
            trace!("sim: duplicated datagram to {}", destination);
            wire.inboxes[peer].push_back((datagram.clone(), self.local_addr));
        }
        wire.inboxes[peer].push_back((datagram, self.local_addr));

        drop(guard);
        self.shared.arrived.notify_all();
        Ok(())
    }

    fn recv_datagram(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<Option<(usize, SocketAddr)>> {
        let side = self.side;
        let peer = 1 - side;
        let wire = self.shared.lock();

        let mut wire = match timeout {
            Some(timeout) => {
                self.shared
                    .arrived
                    .wait_timeout_while(wire, timeout, |w| w.inboxes[side].is_empty())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .shared
                .arrived
                .wait_while(wire, |w| w.inboxes[side].is_empty() && w.alive[peer])
                .unwrap_or_else(PoisonError::into_inner),
        };

        match wire.inboxes[side].pop_front() {
            Some((datagram, source)) => {
                // excess bytes are discarded, as recv_from does
                let len = datagram.len().min(buffer.len());
                buffer[..len].copy_from_slice(&datagram[..len]);
                Ok(Some((len, source)))
            }
            None if timeout.is_some() => Ok(None),
            None => Err(RudpError::TransportReceiveFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "simulated peer dropped",
            ))),
        }
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        self.shared.lock().alive[self.side] = false;
        self.shared.arrived.notify_all();
    }
}

fn chance(rng: &mut StdRng, rate: f64) -> bool {
    rate > 0.0 && rng.gen_bool(rate.min(1.0))
}

fn is_data_with_payload(frame: &[u8]) -> bool {
    frame.first() == Some(&KIND_DATA) && frame.len() > DATA_HEADER_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(5);

    #[test]
    fn test_pass_through() {
        let (mut a, mut b) = SimulatedNetwork::pair(SimulatorConfig::default());
        a.send_datagram(b"hello", b.local_addr()).unwrap();
        assert_eq!(b.pending(), 1);

        let mut buffer = [0u8; 8];
        let (len, source) = b.recv_datagram(&mut buffer, Some(WAIT)).unwrap().unwrap();
        assert_eq!(&buffer[..len], b"hello");
        assert_eq!(source, a.local_addr());
        assert_eq!(a.datagrams_sent(), 1);
    }

    #[test]
    fn test_timeout_when_empty() {
        let (mut a, _b) = SimulatedNetwork::pair(SimulatorConfig::default());
        let mut buffer = [0u8; 8];
        assert!(a.recv_datagram(&mut buffer, Some(WAIT)).unwrap().is_none());
    }

    #[test]
    fn test_total_loss() {
        let (mut a, b) = SimulatedNetwork::pair(SimulatorConfig::default().with_loss_rate(1.0));
        a.send_datagram(b"gone", b.local_addr()).unwrap();
        assert_eq!(b.pending(), 0);
        assert_eq!(a.datagrams_sent(), 1);
    }

    #[test]
    fn test_always_duplicates() {
        let (mut a, b) =
            SimulatedNetwork::pair(SimulatorConfig::default().with_duplicate_rate(1.0));
        a.send_datagram(b"twice", b.local_addr()).unwrap();
        assert_eq!(b.pending(), 2);
    }

    #[test]
    fn test_corruption_stays_in_payload() {
        let (mut a, mut b) =
            SimulatedNetwork::pair(SimulatorConfig::default().with_corrupt_rate(1.0));
        let frame = crate::Packet::data(7, b"payload", 64).unwrap().encode();
        a.send_datagram(&frame, b.local_addr()).unwrap();

        let mut buffer = [0u8; 64];
        let (len, _) = b.recv_datagram(&mut buffer, Some(WAIT)).unwrap().unwrap();
        assert_eq!(&buffer[..DATA_HEADER_LEN], &frame[..DATA_HEADER_LEN]);
        assert_ne!(&buffer[..len], frame.as_slice());
    }

    #[test]
    fn test_unroutable_destination() {
        let (mut a, b) = SimulatedNetwork::pair(SimulatorConfig::default());
        a.send_datagram(b"lost", endpoint_addr(9)).unwrap();
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn test_blocking_recv_fails_when_peer_dropped() {
        let (mut a, b) = SimulatedNetwork::pair(SimulatorConfig::default());
        drop(b);
        let mut buffer = [0u8; 8];
        let err = a.recv_datagram(&mut buffer, None).unwrap_err();
        assert!(matches!(err, RudpError::TransportReceiveFailed(_)));
    }

    #[test]
    fn test_send_failure_injection() {
        let (mut a, b) = SimulatedNetwork::pair(SimulatorConfig::default());
        a.fail_sends(true);
        assert!(a.send_datagram(b"x", b.local_addr()).is_err());
        assert_eq!(a.datagrams_sent(), 0);
    }
}
