//! UseCase: 接続ごとのライフサイクル処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectionHandler::register() / run() / serve()
//! - 登録、読み取りループ、エンキュー、切断時の登録解除
//!
//! ### なぜこのテストが必要か
//! - 読み取り失敗で自分自身を確実にレジストリから外すことを保証する
//! - リレーループ側で閉じられた接続の読み取りも止まることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信したメッセージがキューに積まれる
//! - 異常系：読み取り失敗、ピア切断、キュー満杯、リレー停止
//! - エッジケース：リレーループによるクローズ

use std::{sync::Arc, time::Duration};

use hiroba_shared::time::now_millis;

use crate::{
    domain::{
        ChannelReader, ChannelWriter, ConnectionHandle, ConnectionRegistry, DisconnectReason,
        EnqueueError, Envelope,
    },
    infrastructure::queue::RelaySender,
};

use super::stats::RelayStats;

/// Owns the lifecycle of accepted connections: register, read, enqueue, deregister.
pub struct ConnectionHandler {
    registry: Arc<dyn ConnectionRegistry>,
    queue: RelaySender,
    stats: Arc<RelayStats>,
    /// Upper bound on closing the transport once the read loop has ended
    close_timeout: Duration,
}

impl ConnectionHandler {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        queue: RelaySender,
        stats: Arc<RelayStats>,
        close_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            queue,
            stats,
            close_timeout,
        }
    }

    /// Register a freshly accepted connection.
    ///
    /// The handle is visible to the relay loop as soon as this returns, before
    /// anything has been read from it.
    pub async fn register(&self, writer: Box<dyn ChannelWriter>) -> Arc<ConnectionHandle> {
        let handle = Arc::new(ConnectionHandle::new(writer));
        self.registry.add(handle.clone()).await;
        tracing::info!("Connection '{}' connected and registered", handle.id());
        handle
    }

    /// Read loop for one registered connection.
    ///
    /// Every message read is enqueued for the relay loop. The loop ends on the
    /// first read failure, when the relay loop closes the handle, or when the
    /// relay queue has no consumer. In every case the handle is removed from
    /// the registry and closed, giving up on the transport after the close
    /// timeout, before returning.
    pub async fn run(
        &self,
        handle: Arc<ConnectionHandle>,
        mut reader: Box<dyn ChannelReader>,
    ) -> DisconnectReason {
        let id = handle.id();

        let reason = loop {
            let read = tokio::select! {
                result = reader.read() => Some(result),
                _ = handle.closed() => None,
            };
            let Some(result) = read else {
                break DisconnectReason::ClosedByRelay;
            };

            let payload = match result {
                Ok(payload) => payload,
                Err(e) => break DisconnectReason::ReadFailed(e),
            };
            tracing::debug!("Received {} bytes from '{}'", payload.len(), id);

            match self.queue.enqueue(Envelope::new(id, payload)).await {
                Ok(()) => {}
                Err(EnqueueError::QueueFull) => {
                    self.stats.record_rejected();
                    tracing::warn!("Relay queue full, dropping message from '{}'", id);
                }
                Err(EnqueueError::RelayStopped) => break DisconnectReason::RelayStopped,
            }
        };

        self.registry.remove(&id).await;
        handle.close_within(self.close_timeout).await;
        let lifetime_ms = now_millis() - handle.connected_at();
        match &reason {
            DisconnectReason::ReadFailed(_) | DisconnectReason::ClosedByRelay => {
                tracing::info!(
                    "Connection '{}' disconnected after {} ms: {}",
                    id,
                    lifetime_ms,
                    reason
                );
            }
            DisconnectReason::RelayStopped => {
                tracing::error!(
                    "Connection '{}' disconnected after {} ms: {}",
                    id,
                    lifetime_ms,
                    reason
                );
            }
        }
        reason
    }

    /// `register` followed by `run`.
    pub async fn serve(
        &self,
        reader: Box<dyn ChannelReader>,
        writer: Box<dyn ChannelWriter>,
    ) -> DisconnectReason {
        let handle = self.register(writer).await;
        self.run(handle, reader).await
    }
}
