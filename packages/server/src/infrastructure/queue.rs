//! Relay queue: multi-producer, single-consumer FIFO of envelopes.
//!
//! Backed by `tokio::sync::mpsc`. The queue is unbounded by default; a bounded
//! queue applies its `OverflowPolicy` when full.

use tokio::sync::mpsc;

use crate::{
    config::{OverflowPolicy, QueuePolicy},
    domain::{EnqueueError, Envelope},
};

/// Create a relay queue with the given shape.
pub fn relay_queue(policy: QueuePolicy) -> (RelaySender, RelayReceiver) {
    match policy {
        QueuePolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (RelaySender::Unbounded(tx), RelayReceiver::Unbounded(rx))
        }
        QueuePolicy::Bounded { capacity, overflow } => {
            // tokio panics on a zero-capacity channel
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (
                RelaySender::Bounded { tx, overflow },
                RelayReceiver::Bounded(rx),
            )
        }
    }
}

/// Producer side, cloned into every connection handler.
#[derive(Debug, Clone)]
pub enum RelaySender {
    Unbounded(mpsc::UnboundedSender<Envelope>),
    Bounded {
        tx: mpsc::Sender<Envelope>,
        overflow: OverflowPolicy,
    },
}

impl RelaySender {
    /// Hand an envelope to the relay loop without waiting for delivery.
    ///
    /// Only a bounded queue with `OverflowPolicy::Block` can suspend here.
    pub async fn enqueue(&self, envelope: Envelope) -> Result<(), EnqueueError> {
        match self {
            Self::Unbounded(tx) => tx.send(envelope).map_err(|_| EnqueueError::RelayStopped),
            Self::Bounded {
                tx,
                overflow: OverflowPolicy::Block,
            } => tx
                .send(envelope)
                .await
                .map_err(|_| EnqueueError::RelayStopped),
            Self::Bounded {
                tx,
                overflow: OverflowPolicy::Reject,
            } => tx.try_send(envelope).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EnqueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => EnqueueError::RelayStopped,
            }),
        }
    }
}

/// Consumer side, owned by the single relay loop.
#[derive(Debug)]
pub enum RelayReceiver {
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
    Bounded(mpsc::Receiver<Envelope>),
}

impl RelayReceiver {
    /// Next envelope in FIFO order; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Payload};
    use std::time::Duration;

    fn envelope(sender: ConnectionId, text: &str) -> Envelope {
        Envelope::new(sender, Payload::from(text))
    }

    #[tokio::test]
    async fn test_unbounded_queue_is_fifo() {
        // テスト項目: 無制限キューは投入順に取り出せる
        // given (前提条件):
        let (tx, mut rx) = relay_queue(QueuePolicy::Unbounded);
        let sender = ConnectionId::generate();

        // when (操作):
        for text in ["m1", "m2", "m3"] {
            tx.enqueue(envelope(sender, text)).await.unwrap();
        }

        // then (期待する結果):
        for text in ["m1", "m2", "m3"] {
            assert_eq!(rx.recv().await, Some(envelope(sender, text)));
        }
    }

    #[tokio::test]
    async fn test_enqueue_after_receiver_dropped_reports_relay_stopped() {
        // テスト項目: 受信側が破棄された後の enqueue は RelayStopped を返す
        // given (前提条件):
        let (tx, rx) = relay_queue(QueuePolicy::Unbounded);
        drop(rx);

        // when (操作):
        let result = tx.enqueue(envelope(ConnectionId::generate(), "m")).await;

        // then (期待する結果):
        assert_eq!(result, Err(EnqueueError::RelayStopped));
    }

    #[tokio::test]
    async fn test_bounded_reject_queue_rejects_when_full() {
        // テスト項目: Reject ポリシーの有限キューは満杯時に QueueFull を返す
        // given (前提条件):
        let (tx, mut rx) = relay_queue(QueuePolicy::Bounded {
            capacity: 1,
            overflow: OverflowPolicy::Reject,
        });
        let sender = ConnectionId::generate();
        tx.enqueue(envelope(sender, "m1")).await.unwrap();

        // when (操作):
        let result = tx.enqueue(envelope(sender, "m2")).await;

        // then (期待する結果):
        assert_eq!(result, Err(EnqueueError::QueueFull));
        assert_eq!(rx.recv().await, Some(envelope(sender, "m1")));
    }

    #[tokio::test]
    async fn test_bounded_block_queue_waits_for_room() {
        // テスト項目: Block ポリシーの有限キューは空きが出るまで待機する
        // given (前提条件):
        let (tx, mut rx) = relay_queue(QueuePolicy::Bounded {
            capacity: 1,
            overflow: OverflowPolicy::Block,
        });
        let sender = ConnectionId::generate();
        tx.enqueue(envelope(sender, "m1")).await.unwrap();

        // when (操作):
        let blocked = tokio::spawn({
            let tx = tx.clone();
            async move { tx.enqueue(envelope(sender, "m2")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());
        let first = rx.recv().await;

        // then (期待する結果):
        assert_eq!(first, Some(envelope(sender, "m1")));
        assert_eq!(blocked.await.unwrap(), Ok(()));
        assert_eq!(rx.recv().await, Some(envelope(sender, "m2")));
    }

    #[tokio::test]
    async fn test_bounded_queue_with_zero_capacity_still_accepts() {
        // テスト項目: 容量 0 を指定しても容量 1 として動作する
        // given (前提条件):
        let (tx, mut rx) = relay_queue(QueuePolicy::Bounded {
            capacity: 0,
            overflow: OverflowPolicy::Reject,
        });
        let sender = ConnectionId::generate();

        // when (操作):
        let result = tx.enqueue(envelope(sender, "m1")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(envelope(sender, "m1")));
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_all_senders_dropped() {
        // テスト項目: 全ての送信側が破棄されると recv は None を返す
        // given (前提条件):
        let (tx, mut rx) = relay_queue(QueuePolicy::Unbounded);

        // when (操作):
        drop(tx);

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
    }
}
