//! Tests for the embeddable `Relay` core over in-memory streams.
//!
//! These drive `Relay::serve` directly with `tokio::io::duplex` pairs,
//! standing in for an external accept loop.

use std::time::Duration;

use roomcast::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

type MemRelay = Relay<StreamConnection<DuplexStream>>;

/// Hands one end of a fresh duplex pair to the relay and returns the
/// other end plus the session task.
fn connect(
    relay: &MemRelay,
) -> (
    DuplexStream,
    tokio::task::JoinHandle<Result<(), RoomcastError>>,
) {
    let (server, client) = tokio::io::duplex(4096);
    let conn = StreamConnection::new(server, 4096);
    let relay = relay.clone();
    let task = tokio::spawn(async move { relay.serve(conn).await });
    (client, task)
}

fn line(msg: &Message) -> Vec<u8> {
    let mut bytes = serde_json::to_vec(msg).unwrap();
    bytes.push(b'\n');
    bytes
}

#[tokio::test]
async fn test_serve_rejects_non_hello_first_message() {
    let relay = MemRelay::default();
    let (mut client, task) = connect(&relay);

    client.write_all(&line(&Message::pkg(b"x".to_vec()))).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("session should end")
        .unwrap();
    assert!(matches!(result, Err(RoomcastError::Protocol(_))));
    assert!(relay.registry().is_empty());
}

#[tokio::test]
async fn test_serve_errors_when_closed_before_hello() {
    let relay = MemRelay::default();
    let (client, task) = connect(&relay);

    drop(client);

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("session should end")
        .unwrap();
    assert!(result.is_err());
    assert!(relay.registry().is_empty());
}

#[tokio::test]
async fn test_serve_joins_and_leaves() {
    let relay = MemRelay::default();
    let (mut client, task) = connect(&relay);
    let name = RoomName::from("mem");

    client.write_all(&line(&Message::hello("mem"))).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while relay.registry().get(&name).map(|r| r.len()) != Some(1) {
        assert!(tokio::time::Instant::now() < deadline, "member did not join");
        tokio::task::yield_now().await;
    }

    drop(client);
    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("session should end")
        .unwrap();
    assert!(result.is_ok(), "a joined session ends successfully");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while relay.registry().get(&name).map(|r| r.len()) != Some(0) {
        assert!(tokio::time::Instant::now() < deadline, "member was not removed");
        tokio::task::yield_now().await;
    }
    assert!(relay.registry().contains(&name), "rooms are kept by default");
}

#[tokio::test]
async fn test_serve_relays_between_members() {
    let relay = MemRelay::default();
    let (mut a, _task_a) = connect(&relay);
    let (b, _task_b) = connect(&relay);
    let (b_read, mut b_write) = tokio::io::split(b);
    let mut b_lines = BufReader::new(b_read).lines();

    a.write_all(&line(&Message::hello("mem"))).await.unwrap();
    b_write.write_all(&line(&Message::hello("mem"))).await.unwrap();

    let name = RoomName::from("mem");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while relay.registry().get(&name).map(|r| r.len()) != Some(2) {
        assert!(tokio::time::Instant::now() < deadline, "members did not join");
        tokio::task::yield_now().await;
    }

    a.write_all(&line(&Message::pkg(b"hi".to_vec()))).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), b_lines.next_line())
        .await
        .expect("should receive")
        .unwrap()
        .expect("a line");
    let msg: Message = serde_json::from_str(&received).unwrap();
    assert_eq!(msg, Message::pkg(b"hi".to_vec()));
}
