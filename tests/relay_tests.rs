//! Relay loop tests
//!
//! Drives the relay through in-memory pipes against a real peer datagram
//! socket: echo in both directions, clean end-of-input termination, and
//! the truncation boundary of the bounded line reader.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tokio::io::AsyncReadExt;
use tokio::net::UnixDatagram;

use dgprobe::{BoundSocket, Relay, MSG_BUFFER};

/// A peer socket playing the role of the probed service.
fn bind_peer(base: &std::path::Path) -> (UnixDatagram, PathBuf) {
    let path = base.join("peer.sock");
    let peer = UnixDatagram::bind(&path).unwrap();
    (peer, path)
}

#[tokio::test]
async fn line_arrives_at_target_with_trailing_newline() {
    let base = tempfile::tempdir().unwrap();
    let (peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let relay = Relay::new(bound, target, &b"hello\n"[..], tokio::io::sink());
    let (bound, outcome) = relay.run().await;
    outcome.unwrap();

    let mut buf = [0u8; MSG_BUFFER];
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello\n");

    bound.destroy().unwrap();
}

#[tokio::test]
async fn last_line_without_newline_is_sent_verbatim() {
    let base = tempfile::tempdir().unwrap();
    let (peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let relay = Relay::new(bound, target, &b"ping\npong"[..], tokio::io::sink());
    let (bound, outcome) = relay.run().await;
    outcome.unwrap();

    let mut buf = [0u8; MSG_BUFFER];
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"ping\n");
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"pong");

    bound.destroy().unwrap();
}

#[tokio::test]
async fn datagram_appears_on_output_with_one_newline() {
    let base = tempfile::tempdir().unwrap();
    let (peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();
    let local = bound.socket_path().to_path_buf();

    // Keep the input writer open so the loop stays in READY until we are
    // done reading the echoed datagram.
    let (input_tx, input_rx) = tokio::io::duplex(64);
    let (output_tx, mut output_rx) = tokio::io::duplex(MSG_BUFFER * 2);

    let relay = Relay::new(bound, target, input_rx, output_tx);
    let task = tokio::spawn(relay.run());

    peer.send_to(b"status: ok", &local).await.unwrap();

    let mut echoed = vec![0u8; b"status: ok\n".len()];
    output_rx.read_exact(&mut echoed).await.unwrap();
    assert_eq!(echoed, b"status: ok\n");

    // Closing the input terminates the loop cleanly.
    drop(input_tx);
    let (bound, outcome) = task.await.unwrap();
    outcome.unwrap();
    bound.destroy().unwrap();
}

#[tokio::test]
async fn end_of_input_terminates_cleanly() {
    let base = tempfile::tempdir().unwrap();
    let (_peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let relay = Relay::new(bound, target, tokio::io::empty(), tokio::io::sink());
    let (bound, outcome) = relay.run().await;

    outcome.unwrap();
    bound.destroy().unwrap();
}

#[tokio::test]
async fn send_to_a_missing_target_terminates_with_failure() {
    let base = tempfile::tempdir().unwrap();
    let target = base.path().join("nobody-home.sock");
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let relay = Relay::new(bound, target, &b"hello\n"[..], tokio::io::sink());
    let (bound, outcome) = relay.run().await;

    assert!(outcome.is_err());
    bound.destroy().unwrap();
}

#[tokio::test]
async fn line_of_exactly_buffer_capacity_is_cut_at_the_boundary() {
    let base = tempfile::tempdir().unwrap();
    let (peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let line = vec![b'x'; MSG_BUFFER];
    let relay = Relay::new(bound, target, &line[..], tokio::io::sink());
    let (bound, outcome) = relay.run().await;
    outcome.unwrap();

    let mut buf = [0u8; MSG_BUFFER];
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(n, MSG_BUFFER - 1);
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(n, 1);

    bound.destroy().unwrap();
}

#[tokio::test]
async fn line_past_buffer_capacity_is_cut_at_the_boundary() {
    let base = tempfile::tempdir().unwrap();
    let (peer, target) = bind_peer(base.path());
    let bound = BoundSocket::create_in(base.path()).unwrap();

    let line = vec![b'x'; MSG_BUFFER + 100];
    let relay = Relay::new(bound, target, &line[..], tokio::io::sink());
    let (bound, outcome) = relay.run().await;
    outcome.unwrap();

    let mut buf = [0u8; MSG_BUFFER];
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(n, MSG_BUFFER - 1);
    let n = peer.recv(&mut buf).await.unwrap();
    assert_eq!(n, 101);

    bound.destroy().unwrap();
}
