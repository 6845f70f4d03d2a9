//! Error types for the relay core.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single read or write on a message channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The peer closed the connection, or it was closed locally.
    #[error("channel closed")]
    Closed,

    /// The transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),

    /// A write did not complete within the configured timeout.
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),
}

/// Failure to hand a message to the relay queue.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// Bounded queue is full and the overflow policy is `Reject`.
    #[error("relay queue is full")]
    QueueFull,

    /// The relay loop is gone; nothing will ever drain the queue.
    #[error("relay loop has stopped")]
    RelayStopped,
}

/// Why a connection handler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Reading from the connection failed (peer closed, network error, ...).
    ReadFailed(ChannelError),
    /// The relay loop closed the connection after a failed write.
    ClosedByRelay,
    /// The relay queue has no consumer any more.
    RelayStopped,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed(e) => write!(f, "read failed: {}", e),
            Self::ClosedByRelay => write!(f, "closed by relay"),
            Self::RelayStopped => write!(f, "relay stopped"),
        }
    }
}
