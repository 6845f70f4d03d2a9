//! メッセージチャネルの実装
//!
//! - `websocket`: axum WebSocket split into reader / writer halves
//! - `memory`: in-process channel with a scriptable peer, for tests and embedding

pub mod memory;
pub mod websocket;

pub use memory::{MemoryPeer, MemoryReader, MemoryWriter, memory_channel};
pub use websocket::{WebSocketReader, WebSocketWriter, split_websocket};
