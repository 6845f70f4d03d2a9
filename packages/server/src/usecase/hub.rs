//! Relay hub: supervisor for the relay loop and every connection handler.
//!
//! The hub spawns the single relay loop when it starts and runs each attached
//! connection's read loop as a task in a `JoinSet`, so all of them can be
//! counted and aborted together.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::{
    sync::Mutex,
    task::{JoinHandle, JoinSet},
};

use hiroba_shared::time::now_millis;

use crate::{
    config::RelayConfig,
    domain::{ChannelReader, ChannelWriter, ConnectionId, ConnectionRegistry, DisconnectReason},
    infrastructure::queue::relay_queue,
};

use super::{
    connection_handler::ConnectionHandler,
    relay_loop::RelayLoop,
    stats::{RelayStats, RelayStatsSnapshot},
};

pub struct RelayHub {
    registry: Arc<dyn ConnectionRegistry>,
    handler: Arc<ConnectionHandler>,
    stats: Arc<RelayStats>,
    handlers: Mutex<JoinSet<DisconnectReason>>,
    relay_task: JoinHandle<()>,
    config: RelayConfig,
    /// Unix timestamp when the hub started (milliseconds)
    started_at: i64,
}

impl RelayHub {
    /// Create the relay queue and spawn the relay loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: RelayConfig, registry: Arc<dyn ConnectionRegistry>) -> Self {
        let stats = Arc::new(RelayStats::new());
        let (sender, receiver) = relay_queue(config.queue);

        let relay = RelayLoop::new(registry.clone(), receiver, &config, stats.clone());
        let relay_task = tokio::spawn(relay.run());

        let handler = Arc::new(ConnectionHandler::new(
            registry.clone(),
            sender,
            stats.clone(),
            config.write_timeout,
        ));

        Self {
            registry,
            handler,
            stats,
            handlers: Mutex::new(JoinSet::new()),
            relay_task,
            config,
            started_at: now_millis(),
        }
    }

    /// Register a connection and spawn its handler task.
    ///
    /// The connection is in the registry by the time this returns.
    pub async fn attach<R, W>(&self, reader: R, writer: W) -> ConnectionId
    where
        R: ChannelReader + 'static,
        W: ChannelWriter + 'static,
    {
        let handle = self.handler.register(Box::new(writer)).await;
        let id = handle.id();

        let handler = self.handler.clone();
        let mut handlers = self.handlers.lock().await;
        reap_finished(&mut handlers);
        handlers.spawn(async move { handler.run(handle, Box::new(reader)).await });
        id
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.count().await
    }

    /// Number of connection handler tasks still running.
    pub async fn active_handlers(&self) -> usize {
        let mut handlers = self.handlers.lock().await;
        reap_finished(&mut handlers);
        handlers.len()
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.registry
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// Abort the relay loop and every handler, then close every connection.
    ///
    /// Connections are closed concurrently, each bounded by the write timeout,
    /// so a peer that stopped reading cannot hold up the others. Messages still
    /// queued are discarded.
    pub async fn shutdown(&self) {
        self.relay_task.abort();
        self.handlers.lock().await.shutdown().await;

        let close_timeout = self.config.write_timeout;
        let remaining = self.registry.snapshot().await;
        join_all(remaining.iter().map(|handle| async move {
            self.registry.remove(&handle.id()).await;
            handle.close_within(close_timeout).await
        }))
        .await;
        tracing::info!(
            "Relay hub shut down, closed {} connection(s)",
            remaining.len()
        );
    }
}

impl Drop for RelayHub {
    fn drop(&mut self) {
        // JoinSet aborts its tasks on drop; the relay task needs it explicitly.
        self.relay_task.abort();
    }
}

fn reap_finished(handlers: &mut JoinSet<DisconnectReason>) {
    while let Some(finished) = handlers.try_join_next() {
        if let Err(e) = finished
            && e.is_panic()
        {
            tracing::error!("Connection handler panicked: {}", e);
        }
    }
}
