//! Message channel abstraction.
//!
//! The transport layer hands the core one established channel per client,
//! already split into a read half (owned by the connection handler) and a write
//! half (shared with the relay loop through the registry).

use async_trait::async_trait;

use super::{ChannelError, Payload};

/// Read half of a client connection.
#[async_trait]
pub trait ChannelReader: Send {
    /// Wait for the next inbound message.
    ///
    /// Any error is terminal: the handler stops reading and deregisters.
    async fn read(&mut self) -> Result<Payload, ChannelError>;
}

/// Write half of a client connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelWriter: Send + Sync {
    /// Deliver one message to the client.
    async fn write(&self, payload: &Payload) -> Result<(), ChannelError>;

    /// Release the underlying connection.
    ///
    /// Called at most once per connection by `ConnectionHandle::close`.
    async fn close(&self);
}
