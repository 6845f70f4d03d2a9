//! Relay configuration.

use std::time::Duration;

use clap::ValueEnum;

/// Default upper bound for one write to one recipient.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the sender of a message also receives it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoPolicy {
    /// Deliver to every live connection except the sender.
    #[default]
    ExcludeSender,
    /// Deliver to every live connection, the sender included.
    IncludeSender,
}

/// What a producer does when a bounded relay queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OverflowPolicy {
    /// Wait for room in the queue.
    #[default]
    Block,
    /// Drop the message and report `EnqueueError::QueueFull`.
    Reject,
}

/// Shape of the relay queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueuePolicy {
    #[default]
    Unbounded,
    Bounded {
        capacity: usize,
        overflow: OverflowPolicy,
    },
}

/// Settings for the relay core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub echo: EchoPolicy,
    pub queue: QueuePolicy,
    /// Per-recipient write timeout; a write that takes longer drops the recipient.
    pub write_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            echo: EchoPolicy::default(),
            queue: QueuePolicy::default(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl RelayConfig {
    pub fn with_echo(mut self, echo: EchoPolicy) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_queue(mut self, queue: QueuePolicy) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定は送信者除外・無制限キュー・5 秒タイムアウト
        // given (前提条件):

        // when (操作):
        let config = RelayConfig::default();

        // then (期待する結果):
        assert_eq!(config.echo, EchoPolicy::ExcludeSender);
        assert_eq!(config.queue, QueuePolicy::Unbounded);
        assert_eq!(config.write_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_methods_override_fields() {
        // テスト項目: with_* で各フィールドを上書きできる
        // given (前提条件):
        let queue = QueuePolicy::Bounded {
            capacity: 8,
            overflow: OverflowPolicy::Reject,
        };

        // when (操作):
        let config = RelayConfig::default()
            .with_echo(EchoPolicy::IncludeSender)
            .with_queue(queue)
            .with_write_timeout(Duration::from_millis(250));

        // then (期待する結果):
        assert_eq!(config.echo, EchoPolicy::IncludeSender);
        assert_eq!(config.queue, queue);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
    }
}
