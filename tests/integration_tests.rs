use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use rudp_core::ack_manager::AckManager;
use rudp_core::checksum;
use rudp_core::contracts::DATA_HEADER_LEN;
use rudp_core::simulator::{SimulatedNetwork, SimulatedTransport, SimulatorConfig};
use rudp_core::{
    Endpoint, Packet, RecvFlow, Receiver, RudpConfig, RudpError, SendFlow, SequenceNumber,
    Transmitter, Transport,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(retries: u32, ack_timeout_ms: u64) -> RudpConfig {
    RudpConfig::builder()
        .with_max_retries(retries)
        .with_ack_timeout(Duration::from_millis(ack_timeout_ms))
        .build()
        .expect("valid test config")
}

fn next_datagram(transport: &mut SimulatedTransport) -> Packet {
    let mut buffer = vec![0u8; RudpConfig::default().max_frame_len()];
    let (len, _) = transport
        .recv_datagram(&mut buffer, Some(Duration::from_millis(10)))
        .unwrap()
        .expect("a datagram should be waiting");
    Packet::decode(&buffer[..len], rudp_core::MAX_PAYLOAD_SIZE).unwrap()
}

fn data_frame(sequence: SequenceNumber, payload: &[u8]) -> Vec<u8> {
    Packet::data(sequence, payload, rudp_core::MAX_PAYLOAD_SIZE)
        .unwrap()
        .encode()
}

#[test]
fn test_scenario_send_hello_acknowledged() {
    init_logging();
    let (mut sender, mut peer) = SimulatedNetwork::pair(SimulatorConfig::default());
    AckManager::send_ack(&mut peer, 0, sender.local_addr()).unwrap();

    let mut flow = SendFlow::new();
    let metrics = Transmitter::send(
        &mut sender,
        b"Hello",
        peer.local_addr(),
        &mut flow,
        &config(3, 10),
    )
    .unwrap();

    assert_eq!(metrics.sequence, 0);
    assert_eq!(flow.last_sequence_sent(), 1);
    assert_eq!(
        next_datagram(&mut peer),
        Packet::data(0, b"Hello", rudp_core::MAX_PAYLOAD_SIZE).unwrap()
    );

    println!("✓ Scenario 1: Hello sent as sequence 0 and acknowledged");
}

#[test]
fn test_scenario_receive_hello() {
    init_logging();
    let (mut peer, mut receiver) = SimulatedNetwork::pair(SimulatorConfig::default());
    peer.send_datagram(&data_frame(0, b"Hello"), receiver.local_addr())
        .unwrap();

    let mut flow = RecvFlow::new();
    let mut buffer = [0u8; 64];
    let (len, source) =
        Receiver::receive(&mut receiver, &mut buffer, &mut flow, &RudpConfig::default()).unwrap();

    assert_eq!(len, 5);
    assert_eq!(&buffer[..len], b"Hello");
    assert_eq!(source, peer.local_addr());
    assert_eq!(flow.next_expected_sequence(), 1);
    assert_eq!(next_datagram(&mut peer), Packet::ack(0));

    println!("✓ Scenario 2: in-order Hello delivered and acknowledged");
}

#[test]
fn test_scenario_duplicate_after_delivery() {
    init_logging();
    let (mut peer, mut receiver) = SimulatedNetwork::pair(SimulatorConfig::default());
    let mut flow = RecvFlow::new();
    let mut buffer = [0u8; 64];
    let config = RudpConfig::default();

    for _ in 0..2 {
        peer.send_datagram(&data_frame(0, b"Hello"), receiver.local_addr())
            .unwrap();
    }

    let (first, _) = Receiver::receive(&mut receiver, &mut buffer, &mut flow, &config).unwrap();
    let (second, _) = Receiver::receive(&mut receiver, &mut buffer, &mut flow, &config).unwrap();

    assert_eq!(first, 5);
    assert_eq!(second, 0);
    assert_eq!(flow.next_expected_sequence(), 1);
    assert_eq!(next_datagram(&mut peer), Packet::ack(0));
    assert_eq!(next_datagram(&mut peer), Packet::ack(0));

    println!("✓ Scenario 3: stale retry re-acknowledged without redelivery");
}

#[test]
fn test_scenario_retries_exhausted() {
    init_logging();
    let (mut sender, peer) = SimulatedNetwork::pair(SimulatorConfig::default());
    let mut flow = SendFlow::new();

    let err = Transmitter::send(
        &mut sender,
        b"Hello",
        peer.local_addr(),
        &mut flow,
        &config(3, 5),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        RudpError::AckTimeoutExhausted { sequence: 0, attempts: 3 }
    ));
    assert_eq!(sender.datagrams_sent(), 3);
    assert_eq!(peer.pending(), 3);

    println!("✓ Scenario 4: exactly 3 transmissions before AckTimeoutExhausted");
}

#[test]
fn test_scenario_corrupt_packet() {
    init_logging();
    let (mut peer, mut receiver) = SimulatedNetwork::pair(SimulatorConfig::default());
    let mut flow = RecvFlow::starting_at(3);

    let mut frame = data_frame(3, b"Hello");
    frame[DATA_HEADER_LEN + 4] ^= 0x80;
    peer.send_datagram(&frame, receiver.local_addr()).unwrap();

    let mut buffer = [0u8; 64];
    let (len, _) =
        Receiver::receive(&mut receiver, &mut buffer, &mut flow, &RudpConfig::default()).unwrap();

    assert_eq!(len, 0);
    assert_eq!(flow.next_expected_sequence(), 3);
    assert_eq!(next_datagram(&mut peer), Packet::ack(2));

    println!("✓ Scenario 5: corrupt payload dropped and last sequence re-acknowledged");
}

#[test]
fn test_checksum_single_bit_sensitivity() {
    let vectors: [&[u8]; 4] = [b"Hello", b"a", b"\x00\x00\x00\x00", b"reliable datagrams"];

    let mut flips = 0;
    for bytes in vectors {
        let code = checksum::compute(bytes);
        assert!(checksum::verify(bytes, code));

        for bit in 0..bytes.len() * 8 {
            let mut flipped = bytes.to_vec();
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert!(!checksum::verify(&flipped, code));
            flips += 1;
        }
    }

    println!("✓ Checksum: {} single-bit flips detected", flips);
}

#[test]
fn test_duplicate_suppression() {
    init_logging();
    let (mut peer, mut receiver) = SimulatedNetwork::pair(SimulatorConfig::default());
    let mut flow = RecvFlow::new();
    let mut buffer = [0u8; 64];
    let config = RudpConfig::default();

    for _ in 0..5 {
        peer.send_datagram(&data_frame(0, b"once"), receiver.local_addr())
            .unwrap();
    }

    let delivered: usize = (0..5)
        .map(|_| Receiver::receive(&mut receiver, &mut buffer, &mut flow, &config).unwrap().0)
        .filter(|&len| len > 0)
        .count();

    assert_eq!(delivered, 1);
    assert_eq!(flow.next_expected_sequence(), 1);

    println!("✓ Duplicate suppression: 5 copies, 1 delivery");
}

#[test]
fn test_monotonic_sequencing() {
    init_logging();
    let (a, b) = SimulatedNetwork::pair(SimulatorConfig::default());
    let b_addr = b.local_addr();
    let config = config(5, 50);

    let mut receiver = Endpoint::new(b, config.clone());
    let listener = thread::spawn(move || {
        let mut buffer = [0u8; 16];
        for _ in 0..5 {
            receiver.recv_message(&mut buffer).unwrap();
        }
    });

    let mut sender = Endpoint::new(a, config);
    for expected in 0..5u32 {
        let metrics = sender.send(&expected.to_be_bytes(), b_addr).unwrap();
        assert_eq!(metrics.sequence, expected);
        assert_eq!(sender.send_flow().last_sequence_sent(), expected + 1);
    }
    listener.join().unwrap();

    println!("✓ Monotonic sequencing: 5 sends, sequences 0..5");
}

#[test]
fn test_lossy_network_delivers_in_order() {
    init_logging();
    const MESSAGES: u32 = 40;

    let faults = SimulatorConfig::default()
        .with_loss_rate(0.2)
        .with_duplicate_rate(0.05)
        .with_corrupt_rate(0.1)
        .with_seed(7);
    let (a, b) = SimulatedNetwork::pair(faults);
    let b_addr = b.local_addr();
    let config = config(60, 20);

    let mut receiver = Endpoint::new(b, config.clone());
    let listener = thread::spawn(move || {
        let mut delivered = Vec::new();
        let mut buffer = [0u8; 16];
        // serve until the sender hangs up so late retries still get acked
        while let Ok((len, _)) = receiver.recv(&mut buffer) {
            if len > 0 {
                delivered.push(buffer[..len].to_vec());
            }
        }
        delivered
    });

    let mut sender = Endpoint::new(a, config);
    let mut retransmissions = 0;
    for i in 0..MESSAGES {
        let metrics = sender
            .send(format!("msg-{}", i).as_bytes(), b_addr)
            .unwrap();
        retransmissions += metrics.attempts - 1;
    }
    drop(sender);

    let delivered = listener.join().unwrap();
    let expected: Vec<Vec<u8>> = (0..MESSAGES)
        .map(|i| format!("msg-{}", i).into_bytes())
        .collect();
    assert_eq!(delivered, expected);

    println!(
        "✓ Lossy network: {} messages in order, {} retransmissions",
        MESSAGES, retransmissions
    );
}

#[test]
fn test_udp_loopback_exchange() {
    init_logging();
    let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let config = config(5, 500);

    let mut receiver = Endpoint::open(loopback, config.clone()).unwrap();
    let receiver_addr = receiver.local_addr().unwrap();

    let listener = thread::spawn(move || {
        let mut received = Vec::new();
        let mut buffer = [0u8; 64];
        for _ in 0..3 {
            let (len, _) = receiver.recv_message(&mut buffer).unwrap();
            received.push(buffer[..len].to_vec());
        }
        receiver.close().unwrap();
        received
    });

    let mut sender = Endpoint::open(loopback, config).unwrap();
    for message in [&b"one"[..], b"two", b"three"] {
        sender.send(message, receiver_addr).unwrap();
    }
    assert_eq!(sender.send_flow().last_sequence_sent(), 3);
    sender.close().unwrap();

    let received = listener.join().unwrap();
    assert_eq!(received, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);

    println!("✓ UDP loopback: 3 messages delivered");
}
