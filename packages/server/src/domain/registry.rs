//! ConnectionRegistry trait 定義
//!
//! The registry is the authoritative set of live connections, shared by every
//! connection handler and the relay loop. Implementations must make every
//! operation safe to call concurrently and must never hold their lock while a
//! message is being written.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ConnectionHandle, ConnectionId};

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Insert a handle as live. It is visible to every later snapshot.
    async fn add(&self, handle: Arc<ConnectionHandle>);

    /// Remove a handle if present and return it; `None` if it was already gone.
    ///
    /// Releasing the connection is the caller's job.
    async fn remove(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>>;

    /// Copy of the live handles at this instant.
    async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>>;

    async fn contains(&self, id: &ConnectionId) -> bool;

    async fn count(&self) -> usize;
}
