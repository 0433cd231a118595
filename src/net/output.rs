use crate::models::message::ServerMessage;
use crate::net::sink::ClientSink;
use tokio::sync::mpsc;

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutFrame {
    /// Regular `{"message": ...}` frame
    Message(ServerMessage),
    /// Close the connection; nothing is written after this frame
    Close { code: u16, reason: String },
}

/// Sending half of a connection's outbound queue. Cheap to clone; sends never block.
#[derive(Debug, Clone)]
pub struct OutputHandle {
    tx: mpsc::UnboundedSender<OutFrame>,
}

impl OutputHandle {
    /// Creates a handle together with the queue its frames end up in.
    pub fn channel() -> (OutputHandle, SessionOut) {
        let (tx, rx) = mpsc::unbounded_channel();
        (OutputHandle { tx }, SessionOut { rx })
    }

    /// Enqueues a frame. Returns false when the connection's writer is already gone.
    pub fn send(&self, frame: OutFrame) -> bool {
        self.tx.send(frame).is_ok()
    }

    pub fn message(&self, message: impl Into<ServerMessage>) -> bool {
        self.send(OutFrame::Message(message.into()))
    }

    pub fn close(&self, code: u16, reason: impl Into<String>) -> bool {
        self.send(OutFrame::Close {
            code,
            reason: reason.into(),
        })
    }
}

/// Receiving half: drained by the connection's writer task into a [`ClientSink`].
pub struct SessionOut {
    rx: mpsc::UnboundedReceiver<OutFrame>,
}

impl SessionOut {
    pub async fn run<C>(mut self, mut client: C) -> anyhow::Result<()>
    where
        C: ClientSink,
    {
        while let Some(frame) = self.rx.recv().await {
            let closing = matches!(frame, OutFrame::Close { .. });
            client.send_frame(frame).await?;
            if closing {
                break;
            }
        }

        Ok(())
    }

    /// Returns an already queued frame without waiting.
    pub fn try_next(&mut self) -> Option<OutFrame> {
        self.rx.try_recv().ok()
    }

    /// Drains everything queued so far.
    pub fn drain(&mut self) -> Vec<OutFrame> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
