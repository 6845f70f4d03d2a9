//! UseCase: リレーループ（ファンアウト処理）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayLoop::fan_out() / RelayLoop::run()
//! - 送信者除外ポリシー、書き込み失敗時の除去、タイムアウト
//!
//! ### なぜこのテストが必要か
//! - 1 つの壊れた接続が他の接続への配信を妨げないことを保証する
//! - 失敗した受信者がレジストリから確実に除去されることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員への配信
//! - 異常系：書き込み失敗・書き込み停止（ストール）
//! - エッジケース：受信者ゼロ、送信者のみ接続

use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use tokio::time::timeout;

use crate::{
    config::{EchoPolicy, RelayConfig},
    domain::{ChannelError, ConnectionHandle, ConnectionId, ConnectionRegistry, Envelope},
    infrastructure::queue::RelayReceiver,
};

use super::stats::RelayStats;

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Recipients the payload was written to
    pub delivered: usize,
    /// Recipients removed because their write failed or timed out
    pub dropped: Vec<ConnectionId>,
}

/// Pick the recipients of a message among the live connections.
pub fn broadcast_targets(
    live: Vec<Arc<ConnectionHandle>>,
    sender: ConnectionId,
    echo: EchoPolicy,
) -> Vec<Arc<ConnectionHandle>> {
    match echo {
        EchoPolicy::IncludeSender => live,
        EchoPolicy::ExcludeSender => live
            .into_iter()
            .filter(|handle| handle.id() != sender)
            .collect(),
    }
}

/// The single consumer of the relay queue.
pub struct RelayLoop {
    registry: Arc<dyn ConnectionRegistry>,
    receiver: RelayReceiver,
    echo: EchoPolicy,
    write_timeout: Duration,
    stats: Arc<RelayStats>,
}

impl RelayLoop {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        receiver: RelayReceiver,
        config: &RelayConfig,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            registry,
            receiver,
            echo: config.echo,
            write_timeout: config.write_timeout,
            stats,
        }
    }

    /// Drain the queue forever, one fan-out pass per message.
    ///
    /// Returns only when every producer has been dropped.
    pub async fn run(mut self) {
        tracing::info!(
            "Relay loop started (echo: {:?}, write timeout: {:?})",
            self.echo,
            self.write_timeout
        );
        while let Some(envelope) = self.receiver.recv().await {
            self.fan_out(&envelope).await;
        }
        tracing::warn!("Relay queue closed, relay loop stopping");
    }

    /// Deliver one message to every target.
    ///
    /// Writes run concurrently, each bounded by the write timeout. Recipients
    /// whose write fails are closed and removed; the rest are unaffected. A
    /// recipient that disconnected on its own during the pass is removed but
    /// not reported as dropped.
    pub async fn fan_out(&self, envelope: &Envelope) -> FanOutReport {
        let targets = broadcast_targets(self.registry.snapshot().await, envelope.sender, self.echo);
        let write_timeout = self.write_timeout;
        let payload = &envelope.payload;

        let results = join_all(targets.into_iter().map(|handle| async move {
            let result = match timeout(write_timeout, handle.send(payload)).await {
                Ok(result) => result,
                Err(_) => Err(ChannelError::TimedOut(write_timeout)),
            };
            (handle, result)
        }))
        .await;

        let mut report = FanOutReport::default();
        let mut failed = Vec::new();
        for (handle, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => failed.push((handle, e)),
            }
        }

        let released = join_all(failed.iter().map(|(handle, _)| self.drop_recipient(handle))).await;
        for ((handle, e), released) in failed.iter().zip(released) {
            if released {
                tracing::warn!(
                    "Connection '{}' removed after write failure: {}",
                    handle.id(),
                    e
                );
                report.dropped.push(handle.id());
            } else {
                // Its own handler closed it after the snapshot was taken.
                tracing::debug!("Connection '{}' disconnected during fan-out", handle.id());
            }
        }

        self.stats.record_pass(report.delivered, report.dropped.len());
        tracing::debug!(
            "Relayed {} bytes from '{}' to {} connection(s), dropped {}",
            payload.len(),
            envelope.sender,
            report.delivered,
            report.dropped.len()
        );
        report
    }

    /// Remove and close a recipient whose write failed.
    ///
    /// Returns `false` when the handle had already been closed elsewhere.
    async fn drop_recipient(&self, handle: &ConnectionHandle) -> bool {
        self.registry.remove(&handle.id()).await;
        handle.close_within(self.write_timeout).await
    }
}
