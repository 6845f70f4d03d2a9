//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};

use crate::{infrastructure::channel::split_websocket, ui::state::AppState};

/// Upgrade `GET /ws` and hand the socket to the relay hub.
///
/// Every origin is accepted; there is no join policy at this layer.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (reader, writer) = split_websocket(socket);
    let id = state.hub.attach(reader, writer).await;
    tracing::info!("WebSocket client '{}' attached to relay", id);
}
