//! Domain layer: connection identity, payloads and the seams the relay core
//! depends on (`ChannelReader`, `ChannelWriter`, `ConnectionRegistry`).

mod channel;
mod connection;
mod error;
mod registry;

pub use channel::{ChannelReader, ChannelWriter};
#[cfg(test)]
pub use channel::MockChannelWriter;
pub use connection::{ConnectionHandle, ConnectionId, Envelope, Payload};
pub use error::{ChannelError, DisconnectReason, EnqueueError};
pub use registry::ConnectionRegistry;
