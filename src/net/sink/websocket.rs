use crate::net::output::OutFrame;
use crate::net::sink::ClientSink;
use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message};
use futures::{Sink, SinkExt};

pub struct WebSocketSink<S> {
    ws: S,
}

impl<S> WebSocketSink<S> {
    pub fn new(ws: S) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl<S> ClientSink for WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    async fn send_frame(&mut self, frame: OutFrame) -> anyhow::Result<()> {
        let msg = match frame {
            OutFrame::Message(m) => Message::Text(m.to_json().into()),
            OutFrame::Close { code, reason } => Message::Close(Some(CloseFrame {
                code,
                reason: reason.into(),
            })),
        };

        self.ws
            .send(msg)
            .await
            .map_err(|e| anyhow::Error::msg(format!("websocket send failed: {e}")))?;

        Ok(())
    }
}
