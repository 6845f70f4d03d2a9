//! Server state.

use std::sync::Arc;

use crate::usecase::RelayHub;

/// Shared application state
pub struct AppState {
    /// RelayHub（ブロードキャストコアの窓口）
    pub hub: Arc<RelayHub>,
}
