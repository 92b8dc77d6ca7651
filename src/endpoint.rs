//! Socket-like endpoint
//!
//! Bundles one transport with its configuration and the two flow states of
//! a bidirectional exchange with a single peer. All calls take `&mut self`;
//! wrap the endpoint in a `Mutex` to share it between threads.

use std::net::SocketAddr;

use crate::config::RudpConfig;
use crate::errors::Result;
use crate::flow::{RecvFlow, SendFlow};
use crate::receiver::Receiver;
use crate::transmitter::{TransmitMetrics, Transmitter};
use crate::transport::{Transport, UdpTransport};

pub struct Endpoint<T> {
    transport: T,
    config: RudpConfig,
    send_flow: SendFlow,
    recv_flow: RecvFlow,
}

impl<T: Transport> Endpoint<T> {
    /// Wrap `transport` with fresh flows starting at sequence 0
    pub fn new(transport: T, config: RudpConfig) -> Self {
        Self {
            transport,
            config,
            send_flow: SendFlow::new(),
            recv_flow: RecvFlow::new(),
        }
    }

    /// Reliably send one message; see [`Transmitter::send`]
    pub fn send(&mut self, payload: &[u8], destination: SocketAddr) -> Result<TransmitMetrics> {
        Transmitter::send(
            &mut self.transport,
            payload,
            destination,
            &mut self.send_flow,
            &self.config,
        )
    }

    /// Receive one datagram; see [`Receiver::receive`]
    pub fn recv(&mut self, buffer: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Receiver::receive(
            &mut self.transport,
            buffer,
            &mut self.recv_flow,
            &self.config,
        )
    }

    /// Receive until a message is delivered, skipping duplicates and
    /// corrupt datagrams
    pub fn recv_message(&mut self, buffer: &mut [u8]) -> Result<(usize, SocketAddr)> {
        loop {
            let next = self.recv_flow.next_expected_sequence();
            let received = self.recv(buffer)?;
            if self.recv_flow.next_expected_sequence() != next {
                return Ok(received);
            }
        }
    }

    pub fn config(&self) -> &RudpConfig {
        &self.config
    }

    pub fn send_flow(&self) -> &SendFlow {
        &self.send_flow
    }

    pub fn recv_flow(&self) -> &RecvFlow {
        &self.recv_flow
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl Endpoint<UdpTransport> {
    /// Open a UDP endpoint bound to `bind_addr`
    pub fn open(bind_addr: SocketAddr, config: RudpConfig) -> Result<Self> {
        let transport = UdpTransport::open(bind_addr, &config)?;
        Ok(Self::new(transport, config))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Release the underlying socket
    pub fn close(self) -> Result<()> {
        self.transport.close()
    }
}
