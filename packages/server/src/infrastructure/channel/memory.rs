//! In-process message channel.
//!
//! `memory_channel()` returns the two halves the relay core consumes plus a
//! `MemoryPeer` playing the remote client: it can send messages, observe what
//! the relay wrote, break the connection on either side, or stall writes and closes.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ChannelError, ChannelReader, ChannelWriter, Payload};

#[derive(Debug, Default)]
struct PeerState {
    fail_writes: AtomicBool,
    stall_writes: AtomicBool,
    stall_close: AtomicBool,
    closes: AtomicUsize,
}

/// Create a connected reader / writer / peer triple.
pub fn memory_channel() -> (MemoryReader, MemoryWriter, MemoryPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let state = Arc::new(PeerState::default());
    (
        MemoryReader {
            inbound: inbound_rx,
        },
        MemoryWriter {
            outbound: outbound_tx,
            state: state.clone(),
        },
        MemoryPeer {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            state,
        },
    )
}

pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<Result<Payload, ChannelError>>,
}

#[async_trait]
impl ChannelReader for MemoryReader {
    async fn read(&mut self) -> Result<Payload, ChannelError> {
        self.inbound.recv().await.unwrap_or(Err(ChannelError::Closed))
    }
}

pub struct MemoryWriter {
    outbound: mpsc::UnboundedSender<Payload>,
    state: Arc<PeerState>,
}

#[async_trait]
impl ChannelWriter for MemoryWriter {
    async fn write(&self, payload: &Payload) -> Result<(), ChannelError> {
        if self.state.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport("broken pipe".to_string()));
        }
        self.outbound
            .send(payload.clone())
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.stall_close.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

/// The remote end of a memory channel.
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Result<Payload, ChannelError>>>,
    outbound: mpsc::UnboundedReceiver<Payload>,
    state: Arc<PeerState>,
}

impl MemoryPeer {
    /// Send a message towards the relay. Returns `false` if the reader is gone.
    pub fn send(&self, payload: impl Into<Payload>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(Ok(payload.into())).is_ok(),
            None => false,
        }
    }

    /// Make the next read on the relay side fail with `error`.
    pub fn fail_read(&self, error: ChannelError) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Err(error));
        }
    }

    /// Hang up: pending reads on the relay side fail with `ChannelError::Closed`.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Every write from now on fails.
    pub fn fail_writes(&self) {
        self.state.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Every write from now on never completes.
    pub fn stall_writes(&self) {
        self.state.stall_writes.store(true, Ordering::SeqCst);
    }

    /// Closing the writer half is counted but never completes, like a peer
    /// that stopped reading with a full send buffer.
    pub fn stall_close(&self) {
        self.state.stall_close.store(true, Ordering::SeqCst);
    }

    /// Next message the relay wrote to this peer.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.outbound.recv().await
    }

    /// Message the relay already wrote, if any.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.outbound.try_recv().ok()
    }

    /// How many times the writer half has been closed.
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}
