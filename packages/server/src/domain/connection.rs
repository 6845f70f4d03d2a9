//! Connection handle, identity and payload types.

use std::{fmt, time::Duration};

use tokio::sync::watch;
use uuid::Uuid;

use hiroba_shared::time::now_millis;

use super::{ChannelError, ChannelWriter};

/// Unique identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identity (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An opaque message body.
///
/// The relay never inspects the content; the variant only records which frame
/// kind it arrived in so it can be written back the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

/// One entry of the relay queue: who sent it and what they sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: ConnectionId,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(sender: ConnectionId, payload: Payload) -> Self {
        Self { sender, payload }
    }
}

/// A live client connection as seen by the registry and the relay loop.
///
/// The handle owns the write half of the connection. Closing is one-shot:
/// whichever of the connection handler (read failure) or the relay loop (write
/// failure) gets there first releases the writer, later calls are no-ops.
pub struct ConnectionHandle {
    id: ConnectionId,
    writer: Box<dyn ChannelWriter>,
    /// Unix timestamp when connected (milliseconds)
    connected_at: i64,
    closed: watch::Sender<bool>,
}

impl ConnectionHandle {
    pub fn new(writer: Box<dyn ChannelWriter>) -> Self {
        Self::with_id(ConnectionId::generate(), writer)
    }

    pub fn with_id(id: ConnectionId, writer: Box<dyn ChannelWriter>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            writer,
            connected_at: now_millis(),
            closed,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connected_at(&self) -> i64 {
        self.connected_at
    }

    /// Write one message to this connection.
    ///
    /// Fails with `ChannelError::Closed` once the handle has been closed.
    pub async fn send(&self, payload: &Payload) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.writer.write(payload).await
    }

    /// Close the connection. Returns `true` only for the call that actually
    /// released the writer.
    pub async fn close(&self) -> bool {
        let first = self.closed.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        });
        if first {
            self.writer.close().await;
            tracing::debug!("Connection '{}' closed", self.id);
        }
        first
    }

    /// `close`, giving up on the transport after `limit`.
    ///
    /// The handle is marked closed before the writer is touched, so it stays
    /// unusable even when the transport close runs out of time. Only the call
    /// that released the writer can time out, which is why a timeout still
    /// reports `true`.
    pub async fn close_within(&self, limit: Duration) -> bool {
        match tokio::time::timeout(limit, self.close()).await {
            Ok(released) => released,
            Err(_) => {
                tracing::warn!("Timed out closing connection '{}' after {:?}", self.id, limit);
                true
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the handle has been closed, by anyone.
    pub async fn closed(&self) {
        let mut receiver = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns once closed.
        let _ = receiver.wait_for(|closed| *closed).await;
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("closed", &self.is_closed())
            .finish()
    }
}
