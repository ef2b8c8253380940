//! Tests for `PeerConnection` over in-memory byte streams.
//!
//! `tokio::io::duplex` gives us a connected pair of streams without
//! touching the network: one end goes into the connection under test,
//! the other end plays the remote client.

use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{Kind, Message};
use roomcast_session::{CloseReason, PeerConnection, SessionConfig};
use roomcast_transport::StreamConnection;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};

type Peer = PeerConnection<StreamConnection<DuplexStream>>;

fn peer_pair(buffer: usize, config: SessionConfig) -> (Arc<Peer>, DuplexStream) {
    let (local, remote) = tokio::io::duplex(buffer);
    let conn = StreamConnection::new(local, 1024);
    (Arc::new(PeerConnection::new(conn, config)), remote)
}

fn peer() -> (Arc<Peer>, DuplexStream) {
    peer_pair(4096, SessionConfig::default())
}

// =========================================================================
// send / receive
// =========================================================================

#[tokio::test]
async fn test_receive_decodes_message() {
    let (peer, mut remote) = peer();

    remote
        .write_all(b"{\"Type\":\"hello\",\"Content\":\"cm9vbUE=\"}\n")
        .await
        .unwrap();

    let msg = peer.receive().await.expect("should receive a message");
    assert_eq!(msg, Message::hello("roomA"));
    assert!(!peer.is_closed());
}

#[tokio::test]
async fn test_send_writes_one_json_line() {
    let (peer, remote) = peer();

    peer.send(&Message::pkg(b"hi".to_vec())).await;

    let mut lines = BufReader::new(remote).lines();
    let line = lines.next_line().await.unwrap().expect("a line");
    assert_eq!(line, r#"{"Type":"pkg","Content":"aGk="}"#);
}

#[tokio::test]
async fn test_unknown_kind_is_delivered_not_rejected() {
    let (peer, mut remote) = peer();

    remote
        .write_all(b"{\"Type\":\"ping\",\"Content\":null}\n")
        .await
        .unwrap();

    let msg = peer.receive().await.expect("should receive");
    assert_eq!(msg.kind, Kind::Other("ping".into()));
}

// =========================================================================
// Failures collapse into "closed"
// =========================================================================

#[tokio::test]
async fn test_garbage_frame_closes_connection() {
    let (peer, mut remote) = peer();

    remote.write_all(b"this is not json\n").await.unwrap();

    assert!(peer.receive().await.is_none());
    assert!(peer.is_closed());
    assert_eq!(peer.close_reason(), Some(CloseReason::Protocol));
}

#[tokio::test]
async fn test_peer_hangup_closes_connection() {
    let (peer, remote) = peer();
    drop(remote);

    assert!(peer.receive().await.is_none());
    assert_eq!(peer.close_reason(), Some(CloseReason::PeerClosed));
}

#[tokio::test(start_paused = true)]
async fn test_read_deadline_closes_connection() {
    let (peer, _remote) = peer_pair(
        4096,
        SessionConfig {
            read_timeout: Duration::from_secs(60),
            ..SessionConfig::default()
        },
    );

    // Nothing is ever written; the paused clock jumps to the deadline.
    assert!(peer.receive().await.is_none());
    assert_eq!(peer.close_reason(), Some(CloseReason::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_write_deadline_closes_connection() {
    // A tiny buffer that the remote never drains makes the write stall.
    let (peer, _remote) = peer_pair(
        8,
        SessionConfig {
            write_timeout: Duration::from_secs(60),
            ..SessionConfig::default()
        },
    );

    peer.send(&Message::pkg(vec![b'x'; 256])).await;

    assert!(peer.is_closed());
    assert_eq!(peer.close_reason(), Some(CloseReason::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_send_returns_within_write_deadline() {
    let write_timeout = Duration::from_secs(60);
    let (peer, _remote) = peer_pair(
        8,
        SessionConfig {
            write_timeout,
            ..SessionConfig::default()
        },
    );

    let started = tokio::time::Instant::now();
    peer.send(&Message::pkg(vec![b'x'; 256])).await;
    let elapsed = started.elapsed();

    // The transport close after the expired write must not restart the clock.
    assert!(elapsed >= write_timeout, "returned early after {elapsed:?}");
    assert!(
        elapsed <= write_timeout + Duration::from_secs(1),
        "send held the caller for {elapsed:?}"
    );
    assert_eq!(peer.close_reason(), Some(CloseReason::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_close_after_write_timeout_returns_at_once() {
    let write_timeout = Duration::from_secs(30);
    let (peer, mut remote) = peer_pair(
        8,
        SessionConfig {
            write_timeout,
            ..SessionConfig::default()
        },
    );

    // Fill the pipe with a partial frame, then let the write expire.
    peer.send(&Message::pkg(vec![b'x'; 256])).await;
    assert!(peer.is_closed());

    // A later close is a no-op and returns at once.
    let started = tokio::time::Instant::now();
    peer.close().await;
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(peer.close_reason(), Some(CloseReason::Timeout));

    // Only what fit in the pipe ever reached the remote.
    let mut buf = [0u8; 8];
    remote.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, br#"{"Type":"#);
}

#[tokio::test]
async fn test_receive_after_close_returns_none() {
    let (peer, mut remote) = peer();
    peer.close().await;

    // Even with data waiting, a closed connection yields nothing.
    let _ = remote
        .write_all(b"{\"Type\":\"pkg\",\"Content\":\"aGk=\"}\n")
        .await;
    assert!(peer.receive().await.is_none());
}

// =========================================================================
// close / closed
// =========================================================================

#[tokio::test]
async fn test_close_is_idempotent() {
    let (peer, mut remote) = peer();

    peer.close().await;
    peer.close().await;

    assert_eq!(peer.close_reason(), Some(CloseReason::Local));

    // The remote sees exactly one EOF and nothing else.
    let mut buf = Vec::new();
    remote.read_to_end(&mut buf).await.unwrap();
    assert!(buf.is_empty());
}

#[tokio::test]
async fn test_first_close_reason_wins() {
    let (peer, remote) = peer();
    drop(remote);

    assert!(peer.receive().await.is_none());
    peer.close().await;

    assert_eq!(peer.close_reason(), Some(CloseReason::PeerClosed));
}

#[tokio::test]
async fn test_closed_wakes_all_waiters() {
    let (peer, _remote) = peer();

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let peer = Arc::clone(&peer);
            tokio::spawn(async move { peer.closed().await })
        })
        .collect();
    tokio::task::yield_now().await;

    peer.close().await;
    peer.close().await;

    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter task should not panic");
    }

    // A waiter arriving after the close returns immediately.
    tokio::time::timeout(Duration::from_secs(1), peer.closed())
        .await
        .expect("late waiter should not block");
}

#[tokio::test]
async fn test_close_wakes_pending_receive() {
    let (peer, _remote) = peer();

    let receiver = {
        let peer = Arc::clone(&peer);
        tokio::spawn(async move { peer.receive().await })
    };
    tokio::task::yield_now().await;

    peer.close().await;

    let result = tokio::time::timeout(Duration::from_secs(1), receiver)
        .await
        .expect("receive should wake on close")
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_send_after_close_is_silent_noop() {
    let (peer, mut remote) = peer();

    peer.close().await;
    peer.send(&Message::pkg(b"late".to_vec())).await;

    let mut buf = Vec::new();
    remote.read_to_end(&mut buf).await.unwrap();
    assert!(buf.is_empty(), "nothing may be written after close");
}
