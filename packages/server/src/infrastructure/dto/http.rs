//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::usecase::RelayStatsSnapshot;

/// Response body of `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDto {
    /// Connections currently in the registry
    pub connections: usize,
    /// Connection handler tasks still running
    pub handlers: usize,
    pub messages_relayed: u64,
    pub deliveries: u64,
    pub recipients_dropped: u64,
    pub messages_rejected: u64,
    /// Hub start time (JST, RFC 3339)
    pub started_at: Option<String>,
}

impl StatsDto {
    pub fn new(
        connections: usize,
        handlers: usize,
        stats: RelayStatsSnapshot,
        started_at: Option<String>,
    ) -> Self {
        Self {
            connections,
            handlers,
            messages_relayed: stats.messages_relayed,
            deliveries: stats.deliveries,
            recipients_dropped: stats.recipients_dropped,
            messages_rejected: stats.messages_rejected,
            started_at,
        }
    }
}
