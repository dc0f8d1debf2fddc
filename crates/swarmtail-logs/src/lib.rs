//! Live log streaming for swarmtail
//!
//! This crate provides the stream controller, transport channels, frame
//! decoding, the bounded log buffer, search and export.

pub mod ansi;
mod buffer;
mod channel;
mod controller;
mod decoder;
mod endpoint;
mod export;
mod filter;

pub use buffer::{LevelCounts, LogBuffer};
pub use channel::{
    ABNORMAL_CLOSURE, ChannelHandle, ChannelSink, NORMAL_CLOSURE, StreamEvent, StreamEventKind,
    Transport, WebSocketTransport,
};
pub use controller::{DEFAULT_RECONNECT_DELAY, StreamConfig, StreamController};
pub use decoder::{DecodedFrame, DecodedLine, FrameDecoder};
pub use endpoint::{
    EndpointBuilder, EndpointError, ServiceLogsEndpoint, SwarmLogsEndpoint, socket_base,
};
pub use export::{export_file_name, export_text, write_export};
pub use filter::{LogView, SearchQuery};

// Re-export types used in our public API
pub use swarmtail_types::{
    ArcLogLine, ConnectionIndicator, ConnectionState, Frame, LogLevel, LogLine, StreamFilter,
    StyledSegment,
};
