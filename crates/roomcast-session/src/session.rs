//! Session configuration and close bookkeeping.

use std::fmt;
use std::time::Duration;

/// Default read and write deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Deadlines applied to every peer connection.
///
/// Each deadline is a sliding window: it restarts with every `send` or
/// `receive` call, so an idle but healthy peer only needs to produce one
/// message per `read_timeout` to stay connected.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How long a single `receive` may wait for the next message.
    ///
    /// Default: 60 seconds.
    pub read_timeout: Duration,

    /// How long a single `send` (and the final close) may take.
    ///
    /// Default: 60 seconds.
    pub write_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// CloseReason
// ---------------------------------------------------------------------------

/// Why a connection ended up closed.
///
/// Only the first reason is recorded. The room layer never looks at it;
/// it exists for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` was called by the server.
    Local,
    /// The peer closed its side cleanly.
    PeerClosed,
    /// A read or write deadline expired.
    Timeout,
    /// A read or write failed at the transport level.
    Transport,
    /// The peer sent a frame that isn't a valid message.
    Protocol,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Local => "closed locally",
            Self::PeerClosed => "closed by peer",
            Self::Timeout => "deadline expired",
            Self::Transport => "transport error",
            Self::Protocol => "protocol error",
        };
        f.write_str(s)
    }
}
