//! Relay counters, kept for observability only.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RelayStats {
    messages_relayed: AtomicU64,
    deliveries: AtomicU64,
    recipients_dropped: AtomicU64,
    messages_rejected: AtomicU64,
}

/// Point-in-time copy of `RelayStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Fan-out passes completed
    pub messages_relayed: u64,
    /// Successful per-recipient writes
    pub deliveries: u64,
    /// Recipients removed after a failed or timed-out write
    pub recipients_dropped: u64,
    /// Messages refused by a full bounded queue
    pub messages_rejected: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self, delivered: usize, dropped: usize) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.recipients_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            recipients_dropped: self.recipients_dropped.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_pass_accumulates() {
        // テスト項目: record_pass の結果が累積される
        // given (前提条件):
        let stats = RelayStats::new();

        // when (操作):
        stats.record_pass(3, 0);
        stats.record_pass(1, 2);
        stats.record_rejected();

        // then (期待する結果):
        assert_eq!(
            stats.snapshot(),
            RelayStatsSnapshot {
                messages_relayed: 2,
                deliveries: 4,
                recipients_dropped: 2,
                messages_rejected: 1,
            }
        );
    }
}
