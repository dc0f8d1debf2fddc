//! Shared types for swarmtail
//!
//! This crate contains data structures used across multiple swarmtail crates.

use chrono::{DateTime, Utc};
use ratatui::style::{Color, Style};
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Directory Types
// ============================================================================

/// A swarm service as reported by the management API
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub desired_count: u64,
    #[serde(default)]
    pub current_count: u64,
}

impl ServiceInfo {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            ..Default::default()
        }
    }

    /// Format replica status as "current/desired"
    pub fn replica_status(&self) -> String {
        format!("{}/{}", self.current_count, self.desired_count)
    }
}

/// A stack (services sharing a `com.docker.stack.namespace` label)
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StackInfo {
    pub name: String,
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
}

impl StackInfo {
    pub fn new(name: String) -> Self {
        Self {
            name,
            services: Vec::new(),
        }
    }
}

// ============================================================================
// Subscription Types
// ============================================================================

/// Rejected filter combinations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("service '{0}' selected without a stack")]
    ServiceWithoutScope(String),
}

/// Which backend log source is streamed.
///
/// Replaced, never mutated: any change means a new subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StreamFilter {
    scope: Option<String>,
    service: Option<String>,
}

impl StreamFilter {
    /// Build a filter, treating empty strings as absent
    pub fn new(scope: Option<String>, service: Option<String>) -> Result<Self, FilterError> {
        let scope = scope.filter(|s| !s.trim().is_empty());
        let service = service.filter(|s| !s.trim().is_empty());

        if let (None, Some(service)) = (&scope, &service) {
            return Err(FilterError::ServiceWithoutScope(service.clone()));
        }

        Ok(Self { scope, service })
    }

    /// The unfiltered subscription (every service of every stack)
    pub fn all() -> Self {
        Self::default()
    }

    pub fn stack(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            service: None,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Short human label, e.g. "web/api" or "all stacks"
    pub fn label(&self) -> String {
        match (&self.scope, &self.service) {
            (Some(scope), Some(service)) => format!("{}/{}", scope, service),
            (Some(scope), None) => scope.clone(),
            _ => "all stacks".to_string(),
        }
    }
}

/// Connection lifecycle of a stream controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
    Paused,
}

impl ConnectionState {
    pub fn indicator(&self) -> ConnectionIndicator {
        match self {
            Self::Connecting => ConnectionIndicator::Connecting,
            Self::Open => ConnectionIndicator::Connected,
            Self::Idle | Self::Closed => ConnectionIndicator::Disconnected,
            Self::Paused => ConnectionIndicator::Paused,
        }
    }
}

/// What the status badge shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionIndicator {
    Connecting,
    Connected,
    Disconnected,
    Paused,
}

impl ConnectionIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Paused => "paused",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Connecting => Color::Yellow,
            Self::Connected => Color::Green,
            Self::Disconnected => Color::Red,
            Self::Paused => Color::Cyan,
        }
    }
}

/// One unit of data delivered by a transport channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    #[default]
    Unknown,
}

impl LogLevel {
    /// Parse log level from common formats
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" | "trc" | "trce" => Self::Trace,
            "debug" | "dbg" | "debg" => Self::Debug,
            "info" | "inf" | "information" => Self::Info,
            "warn" | "warning" | "wrn" => Self::Warn,
            "error" | "err" | "erro" => Self::Error,
            "fatal" | "panic" | "critical" | "crit" | "ftl" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Trace => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Fatal => Color::Magenta,
            Self::Unknown => Color::White,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRC",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
            Self::Unknown => "---",
        }
    }
}

/// A run of message text sharing one terminal style
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSegment {
    pub text: String,
    pub style: Style,
}

impl StyledSegment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A single buffered log line. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    /// Insertion counter assigned by the buffer
    pub sequence: u64,

    /// Plain line text (what search and export see)
    pub text: String,

    /// When the line was appended
    pub received_at: DateTime<Utc>,

    /// `[service]` prefix added by the swarm endpoint
    pub source: Option<String>,

    /// Daemon timestamp prefix
    pub timestamp: Option<DateTime<Utc>>,

    /// Detected severity
    pub level: LogLevel,

    /// Byte offset of the message within `text`
    pub message_start: usize,

    /// Styled runs of the message, when terminal styling was translated
    pub segments: Option<Vec<StyledSegment>>,
}

impl LogLine {
    /// Message content without the source/timestamp prefix
    pub fn message(&self) -> &str {
        self.text.get(self.message_start..).unwrap_or(&self.text)
    }

    /// Short source name (task suffix dropped: "web_api.1.xyz" -> "web_api")
    pub fn short_source(&self) -> Option<&str> {
        self.source
            .as_deref()
            .map(|s| s.split('.').next().unwrap_or(s))
    }
}

/// An `Arc`-wrapped log line, cheap to clone into render snapshots
pub type ArcLogLine = std::sync::Arc<LogLine>;
