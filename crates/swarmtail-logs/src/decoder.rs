use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::ansi::{self, TranslateError};
use swarmtail_types::{Frame, LogLevel, StyledSegment};

/// Longest `[source]` prefix considered a service name
const MAX_SOURCE_LEN: usize = 128;

/// Longest RFC3339 token considered a timestamp prefix
const MAX_TIMESTAMP_LEN: usize = 40;

/// A line ready for the buffer, before it is given a sequence number
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedLine {
    pub text: String,
    pub source: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub message_start: usize,
    pub segments: Option<Vec<StyledSegment>>,
}

impl From<String> for DecodedLine {
    fn from(text: String) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }
}

impl From<&str> for DecodedLine {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

/// Lines decoded from one frame
#[derive(Clone, Debug, Default)]
pub struct DecodedFrame {
    pub lines: Vec<DecodedLine>,

    /// Last styling failure; affected lines fall back to raw text
    pub translation_error: Option<TranslateError>,
}

/// Turns transport frames into buffer lines
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameDecoder {
    style_translation: bool,
}

impl FrameDecoder {
    pub fn new(style_translation: bool) -> Self {
        Self { style_translation }
    }

    pub fn style_translation(&self) -> bool {
        self.style_translation
    }

    /// Decode a frame to a single string with trailing line terminators
    /// removed. Whitespace-only frames yield `None`.
    pub fn decode(&self, frame: &Frame) -> Option<String> {
        let text = frame_text(frame);
        let trimmed = text.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Decode a frame into one line per `\n`, skipping blank lines.
    ///
    /// The backend batches several lines into one frame, so this is what
    /// the stream controller uses.
    pub fn decode_lines(&self, frame: &Frame) -> DecodedFrame {
        let text = frame_text(frame);
        let mut decoded = DecodedFrame::default();

        for raw in text.split('\n') {
            let raw = raw.trim_end_matches('\r');
            if raw.trim().is_empty() {
                continue;
            }

            let (line, error) = self.parse_line(raw);
            if error.is_some() {
                decoded.translation_error = error;
            }
            decoded.lines.push(line);
        }

        decoded
    }

    /// Parse one raw line: styling, source prefix, timestamp, level
    pub fn parse_line(&self, raw: &str) -> (DecodedLine, Option<TranslateError>) {
        let (text, segments, error) = if self.style_translation {
            match ansi::translate(raw) {
                Ok(styled) => (styled.plain, Some(styled.segments), None),
                Err(e) => (raw.to_string(), None, Some(e)),
            }
        } else {
            (raw.to_string(), None, None)
        };

        let (source, after_source) = split_source(&text);
        let (timestamp, content) = split_timestamp(after_source);
        let message_start = text.len() - content.len();

        let level = level_from_json(content).unwrap_or_else(|| level_from_text(content));

        let segments = segments.map(|s| ansi::segments_from(&s, message_start));

        let line = DecodedLine {
            source,
            timestamp,
            level,
            message_start,
            segments,
            text,
        };

        (line, error)
    }
}

/// Frame payload as text, replacing invalid UTF-8
fn frame_text(frame: &Frame) -> Cow<'_, str> {
    match frame {
        Frame::Text(text) => Cow::Borrowed(text.as_str()),
        Frame::Binary(bytes) => String::from_utf8_lossy(bytes),
    }
}

/// Split a `[service] ` prefix. Bracketed level markers are not sources.
fn split_source(text: &str) -> (Option<String>, &str) {
    let Some(rest) = text.strip_prefix('[') else {
        return (None, text);
    };

    let Some(end) = rest.find(']') else {
        return (None, text);
    };

    let name = &rest[..end];
    if name.is_empty()
        || name.len() > MAX_SOURCE_LEN
        || name.contains(char::is_whitespace)
        || LogLevel::from_str(name) != LogLevel::Unknown
    {
        return (None, text);
    }

    (Some(name.to_string()), rest[end + 1..].trim_start())
}

/// Split a leading RFC3339 timestamp token
fn split_timestamp(text: &str) -> (Option<DateTime<Utc>>, &str) {
    let token_end = text.find(char::is_whitespace).unwrap_or(text.len());
    if !(20..=MAX_TIMESTAMP_LEN).contains(&token_end) {
        return (None, text);
    }

    match DateTime::parse_from_rfc3339(&text[..token_end]) {
        Ok(ts) => (Some(ts.with_timezone(&Utc)), text[token_end..].trim_start()),
        Err(_) => (None, text),
    }
}

/// Level from a JSON object's level field, if the content is JSON
fn level_from_json(content: &str) -> Option<LogLevel> {
    let trimmed = content.trim();
    if !trimmed.starts_with('{') {
        return None;
    }

    let value: Value = serde_json::from_str(trimmed).ok()?;
    let fields = value.as_object()?;

    const LEVEL_KEYS: [&str; 8] = [
        "level", "lvl", "severity", "log.level", "loglevel", "log_level", "Level", "LEVEL",
    ];

    let level = LEVEL_KEYS
        .iter()
        .find_map(|key| match fields.get(*key)? {
            Value::String(s) => Some(LogLevel::from_str(s)),
            // pino/bunyan numeric levels
            Value::Number(n) => n.as_u64().map(|num| match num {
                0..=10 => LogLevel::Trace,
                11..=20 => LogLevel::Debug,
                21..=30 => LogLevel::Info,
                31..=40 => LogLevel::Warn,
                41..=50 => LogLevel::Error,
                _ => LogLevel::Fatal,
            }),
            _ => None,
        })
        .unwrap_or(LogLevel::Unknown);

    Some(level)
}

/// Keywords in priority order
const LEVEL_WORDS: [(&str, LogLevel); 11] = [
    ("FATAL", LogLevel::Fatal),
    ("PANIC", LogLevel::Fatal),
    ("CRITICAL", LogLevel::Fatal),
    ("ERROR", LogLevel::Error),
    ("ERR", LogLevel::Error),
    ("WARNING", LogLevel::Warn),
    ("WARN", LogLevel::Warn),
    ("INFO", LogLevel::Info),
    ("DEBUG", LogLevel::Debug),
    ("TRACE", LogLevel::Trace),
    ("CRIT", LogLevel::Fatal),
];

/// Level from plain-text markers: `[ERROR]`, `ERROR:`, ` ERROR `, or a
/// leading keyword
fn level_from_text(content: &str) -> LogLevel {
    let upper = content.to_uppercase();

    let marked = |form: fn(&str) -> String| {
        LEVEL_WORDS
            .iter()
            .find(|(word, _)| upper.contains(&form(word)))
            .map(|(_, level)| *level)
    };

    marked(|w| format!("[{}]", w))
        .or_else(|| marked(|w| format!("{}:", w)))
        .or_else(|| marked(|w| format!(" {} ", w)))
        .or_else(|| {
            let leading = upper.trim_start();
            LEVEL_WORDS
                .iter()
                .find(|(word, _)| leading.starts_with(word))
                .map(|(_, level)| *level)
        })
        .unwrap_or(LogLevel::Unknown)
}
