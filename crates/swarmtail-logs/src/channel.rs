//! Transport channels: one socket per subscription

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use swarmtail_types::Frame;

/// Close code for an intentional, normal shutdown
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close frame carried no status code
pub const NO_STATUS: u16 = 1005;

/// Connection dropped without a close handshake
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Something that happened on a channel (or the reconnect timer)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEventKind {
    Opened,
    Frame(Frame),
    Error(String),
    Closed { code: u16, clean: bool },
    ReconnectDue,
}

/// An event tagged with the subscription generation it belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEvent {
    pub generation: u64,
    pub kind: StreamEventKind,
}

impl StreamEvent {
    pub fn new(generation: u64, kind: StreamEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Where a channel delivers its events
#[derive(Clone, Debug)]
pub struct ChannelSink {
    generation: u64,
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the receiving side is gone
    fn send(&self, kind: StreamEventKind) -> bool {
        self.tx.send(StreamEvent::new(self.generation, kind)).is_ok()
    }

    pub fn opened(&self) -> bool {
        self.send(StreamEventKind::Opened)
    }

    pub fn frame(&self, frame: Frame) -> bool {
        self.send(StreamEventKind::Frame(frame))
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(StreamEventKind::Error(message.into()))
    }

    pub fn closed(&self, code: u16, clean: bool) -> bool {
        self.send(StreamEventKind::Closed { code, clean })
    }
}

/// Owner of an open channel. Closing (or dropping) it stops delivery.
#[derive(Debug)]
pub struct ChannelHandle {
    cancel: CancellationToken,
}

impl ChannelHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Request a normal close
    pub fn close(self) {
        drop(self);
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        // The task sends its own close frame once it sees the cancellation
        self.cancel.cancel();
    }
}

/// Opens channels to a streaming endpoint
pub trait Transport: Send + Sync {
    fn open(&self, endpoint: &Url, sink: ChannelSink) -> ChannelHandle;
}

/// WebSocket transport
#[derive(Clone, Debug)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, endpoint: &Url, sink: ChannelSink) -> ChannelHandle {
        let cancel = CancellationToken::new();
        tokio::spawn(run_channel(
            endpoint.clone(),
            sink,
            cancel.clone(),
            self.connect_timeout,
        ));
        ChannelHandle::new(cancel)
    }
}

async fn run_channel(
    endpoint: Url,
    sink: ChannelSink,
    cancel: CancellationToken,
    connect_timeout: Duration,
) {
    let generation = sink.generation();
    debug!(%endpoint, generation, "opening log stream");

    let connect = tokio::time::timeout(connect_timeout, connect_async(endpoint.as_str()));
    let mut socket = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connect => match result {
            Ok(Ok((socket, _response))) => socket,
            Ok(Err(e)) => {
                warn!(%endpoint, error = %e, "log stream connect failed");
                sink.error(format!("Failed to connect to log stream: {}", e));
                sink.closed(ABNORMAL_CLOSURE, false);
                return;
            }
            Err(_) => {
                warn!(%endpoint, "log stream connect timed out");
                sink.error(format!(
                    "Timed out connecting to log stream after {}s",
                    connect_timeout.as_secs()
                ));
                sink.closed(ABNORMAL_CLOSURE, false);
                return;
            }
        }
    };

    if !sink.opened() {
        return;
    }

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                };
                if let Err(e) = socket.close(Some(frame)).await {
                    debug!(error = %e, "close handshake failed");
                }
                debug!(generation, "log stream closed by client");
                break;
            }

            message = socket.next() => {
                let delivered = match message {
                    Some(Ok(Message::Text(text))) => sink.frame(Frame::Text(text)),
                    Some(Ok(Message::Binary(bytes))) => sink.frame(Frame::Binary(bytes)),
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code)).unwrap_or(NO_STATUS);
                        debug!(generation, code, "log stream closed by server");
                        sink.closed(code, true);
                        break;
                    }
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => true,
                    Some(Err(e)) => {
                        warn!(generation, error = %e, "log stream read failed");
                        sink.error(format!("Log stream error: {}", e));
                        sink.closed(ABNORMAL_CLOSURE, false);
                        break;
                    }
                    None => {
                        sink.closed(ABNORMAL_CLOSURE, false);
                        break;
                    }
                };

                // Controller is gone
                if !delivered {
                    break;
                }
            }
        }
    }
}
