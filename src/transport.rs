//! Transport module - Datagram channel abstraction
//!
//! The protocol core only needs to push a datagram at an address and pull
//! one datagram with an optional deadline. [`Transport`] captures exactly
//! that; [`UdpTransport`] implements it over a blocking UDP socket.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use log::{debug, trace};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::RudpConfig;
use crate::errors::{Result, RudpError};

/// Unreliable datagram channel used by the sender and receiver
pub trait Transport {
    /// Hand one datagram to the channel
    ///
    /// # Errors
    /// `TransportSendFailed` if the channel refuses the datagram.
    fn send_datagram(&mut self, bytes: &[u8], destination: SocketAddr) -> Result<()>;

    /// Wait for one datagram
    ///
    /// `timeout` of `None` blocks until a datagram arrives. Returns
    /// `Ok(None)` when the timeout elapses first, otherwise the number of
    /// bytes written into `buffer` and the source address.
    ///
    /// # Errors
    /// `TransportReceiveFailed` on any failure other than the timeout.
    fn recv_datagram(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<Option<(usize, SocketAddr)>>;
}

/// Blocking UDP socket implementing [`Transport`]
///
/// The read timeout last applied to the socket is cached so repeated waits
/// with the same deadline do not reissue the socket option.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    read_timeout: Option<Duration>,
}

impl UdpTransport {
    /// Create a UDP socket bound to `bind_addr`
    ///
    /// The send buffer is sized from `config.send_buffer_size()`. Passing
    /// port 0 lets the OS pick an ephemeral port; see [`Self::local_addr`].
    ///
    /// # Errors
    /// `TransportCreateFailed` if the socket cannot be created, configured
    /// or bound.
    pub fn open(bind_addr: SocketAddr, config: &RudpConfig) -> Result<Self> {
        let socket = Socket::new(
            Domain::for_address(bind_addr),
            Type::DGRAM,
            Some(Protocol::UDP),
        )
        .map_err(RudpError::TransportCreateFailed)?;

        socket
            .set_send_buffer_size(config.send_buffer_size())
            .map_err(RudpError::TransportCreateFailed)?;
        socket
            .bind(&bind_addr.into())
            .map_err(RudpError::TransportCreateFailed)?;

        let socket: UdpSocket = socket.into();
        debug!(
            "opened UDP transport on {:?}",
            socket.local_addr().map_err(RudpError::TransportCreateFailed)?
        );

        Ok(Self {
            socket,
            read_timeout: None,
        })
    }

    /// Wrap an already bound socket
    pub fn from_socket(socket: UdpSocket) -> Result<Self> {
        let read_timeout = socket
            .read_timeout()
            .map_err(RudpError::TransportCreateFailed)?;
        Ok(Self {
            socket,
            read_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(RudpError::TransportCreateFailed)
    }

    /// Release the socket
    ///
    /// # Errors
    /// `TransportCloseFailed` if the socket holds a pending error; the
    /// socket is released either way.
    pub fn close(self) -> Result<()> {
        let pending = self
            .socket
            .take_error()
            .map_err(RudpError::TransportCloseFailed)?;
        drop(self.socket);

        match pending {
            Some(err) => Err(RudpError::TransportCloseFailed(err)),
            None => Ok(()),
        }
    }

    fn apply_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.read_timeout != timeout {
            self.socket
                .set_read_timeout(timeout)
                .map_err(RudpError::TransportReceiveFailed)?;
            self.read_timeout = timeout;
        }
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn send_datagram(&mut self, bytes: &[u8], destination: SocketAddr) -> Result<()> {
        let sent = self
            .socket
            .send_to(bytes, destination)
            .map_err(RudpError::TransportSendFailed)?;
        trace!("sent {} byte datagram to {}", sent, destination);
        Ok(())
    }

    fn recv_datagram(
        &mut self,
        buffer: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<Option<(usize, SocketAddr)>> {
        self.apply_read_timeout(timeout)?;

        match self.socket.recv_from(buffer) {
            Ok((len, source)) => {
                trace!("received {} byte datagram from {}", len, source);
                Ok(Some((len, source)))
            }
            Err(e) if is_timeout(&e) => Ok(None),
            // ICMP port-unreachable surfaced by some platforms; the peer is
            // simply not answering this attempt
            Err(e) if is_unreachable(&e) => {
                debug!("peer unreachable while receiving: {}", e);
                Ok(None)
            }
            Err(e) => Err(RudpError::TransportReceiveFailed(e)),
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn is_unreachable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
    )
}
