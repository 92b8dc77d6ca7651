//! Loopback demo: a sender thread pushes a handful of messages through a
//! receiver over real UDP sockets and logs every step.
//!
//! Run with `RUST_LOG=trace` to see individual frames.

use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::thread;

use log::{error, info};
use rudp_core::{Endpoint, Result, RudpConfig, RudpError};

const MESSAGES: [&str; 4] = ["Hello", "from", "the", "sender"];

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let loopback: SocketAddr = ([127, 0, 0, 1], 0).into();
    let config = RudpConfig::default();

    let mut receiver = Endpoint::open(loopback, config.clone())?;
    let receiver_addr = receiver.local_addr()?;
    info!("receiver listening on {}", receiver_addr);

    let listener = thread::spawn(move || -> Result<()> {
        let mut buffer = vec![0u8; receiver.config().max_payload()];
        for _ in 0..MESSAGES.len() {
            let (len, source) = receiver.recv_message(&mut buffer)?;
            info!(
                "received {:?} from {}",
                String::from_utf8_lossy(&buffer[..len]),
                source
            );
        }
        receiver.close()
    });

    let mut sender = Endpoint::open(loopback, config)?;
    for message in MESSAGES {
        let metrics = sender.send(message.as_bytes(), receiver_addr)?;
        info!(
            "sent {:?} as sequence {} in {} attempt(s), {} us",
            message, metrics.sequence, metrics.attempts, metrics.total_us
        );
    }
    sender.close()?;

    listener.join().unwrap_or_else(|_| {
        Err(RudpError::TransportReceiveFailed(io::Error::new(
            io::ErrorKind::Other,
            "receiver thread panicked",
        )))
    })
}
