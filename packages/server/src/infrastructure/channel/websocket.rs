//! WebSocket を使った ChannelReader / ChannelWriter 実装
//!
//! The upgraded socket is split in two: the reader goes to the connection
//! handler, the writer goes into the `ConnectionHandle` the relay loop writes
//! through. Ping/pong is answered by the WebSocket layer itself, so the reader
//! skips those frames.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::Mutex;

use crate::domain::{ChannelError, ChannelReader, ChannelWriter, Payload};

/// Split an upgraded socket into its reader and writer halves.
pub fn split_websocket(socket: WebSocket) -> (WebSocketReader, WebSocketWriter) {
    let (sink, stream) = socket.split();
    (
        WebSocketReader { stream },
        WebSocketWriter {
            sink: Mutex::new(sink),
        },
    )
}

pub struct WebSocketReader {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl ChannelReader for WebSocketReader {
    async fn read(&mut self) -> Result<Payload, ChannelError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Payload::Text(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => return Ok(Payload::Binary(data.to_vec())),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    tracing::trace!("Skipping ping/pong frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("Received close frame: {:?}", frame);
                    return Err(ChannelError::Closed);
                }
                Some(Err(e)) => return Err(ChannelError::Transport(e.to_string())),
                None => return Err(ChannelError::Closed),
            }
        }
    }
}

pub struct WebSocketWriter {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl ChannelWriter for WebSocketWriter {
    async fn write(&self, payload: &Payload) -> Result<(), ChannelError> {
        let message = match payload {
            Payload::Text(text) => Message::Text(text.clone().into()),
            Payload::Binary(data) => Message::Binary(data.clone().into()),
        };
        let mut sink = self.sink.lock().await;
        sink.send(message)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            tracing::debug!("Error while closing WebSocket: {}", e);
        }
    }
}
