//! Duplex Channel Tests
//!
//! A transport channel pairs one input and one output stream:
//! - closing releases both halves, even when the first fails
//! - closing never raises and is idempotent
//! - over TCP, closing the channel is observed by the peer as EOF

mod common;

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::thread;

use common::FailingCloseStream;
use replica_io::observability;
use replica_io::streams::{DuplexChannel, InputStream, MemoryInputStream, MemoryOutputStream, OutputStream};

#[test]
fn test_failed_input_close_still_closes_output() {
    let input = FailingCloseStream::new(b"request".to_vec(), "reset by peer");
    let input_closes = input.closes();
    let output = MemoryOutputStream::new();
    let output_closed = output.closed_flag();
    let failures_before = observability::metrics().snapshot().close_failures;

    let mut channel = DuplexChannel::new(input, output);
    channel.close();
    channel.close();

    assert!(channel.is_closed());
    assert_eq!(input_closes.load(Ordering::SeqCst), 1);
    assert!(output_closed.load(Ordering::SeqCst));
    assert!(observability::metrics().snapshot().close_failures > failures_before);
}

#[test]
fn test_split_access_for_echo() {
    let input: Box<dyn InputStream> = Box::new(MemoryInputStream::new(b"ping".to_vec()));
    let output: Box<dyn OutputStream> = Box::new(MemoryOutputStream::new());
    let mut channel: DuplexChannel = DuplexChannel::new(input, output);

    let (input, output) = channel.split_mut();
    let mut buf = Vec::new();
    input.read_to_end(&mut buf).unwrap();
    output.write_all(&buf).unwrap();

    drop(channel);
}

#[test]
fn test_tcp_request_response_then_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (socket, _) = listener.accept().unwrap();
        let mut channel = DuplexChannel::from_tcp(socket).unwrap();
        let mut request = [0u8; 4];
        channel.input_mut().read_exact(&mut request).unwrap();
        channel.output_mut().write_all(b"ACK:").unwrap();
        channel.output_mut().write_all(&request).unwrap();
        channel.close();
    });

    let mut client = TcpStream::connect(addr).unwrap();
    client.write_all(b"blk1").unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).unwrap();
    server.join().unwrap();

    assert_eq!(response, b"ACK:blk1");
}
