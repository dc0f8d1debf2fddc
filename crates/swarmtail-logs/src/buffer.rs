use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;

use crate::decoder::DecodedLine;
use swarmtail_types::{ArcLogLine, LogLevel, LogLine};

/// Bounded ring buffer of decoded log lines.
///
/// Only the stream controller appends or clears; everyone else reads through
/// snapshots. Appending never fails: at capacity the oldest line is evicted.
pub struct LogBuffer {
    /// Internal storage
    entries: RwLock<VecDeque<ArcLogLine>>,

    /// Maximum line count
    capacity: usize,

    /// Next sequence number (never reset, so render keys stay unique)
    next_sequence: AtomicU64,

    /// Bumped on every mutation
    revision: AtomicU64,
}

impl LogBuffer {
    /// Create a new log buffer with the given capacity (at least one line)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_sequence: AtomicU64::new(0),
            revision: AtomicU64::new(0),
        }
    }

    /// Append a line, evicting the oldest if at capacity. Returns its sequence.
    pub(crate) fn append(&self, line: impl Into<DecodedLine>) -> u64 {
        let line = line.into();
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);

        let entry = Arc::new(LogLine {
            sequence,
            text: line.text,
            received_at: Utc::now(),
            source: line.source,
            timestamp: line.timestamp,
            level: line.level,
            message_start: line.message_start,
            segments: line.segments,
        });

        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        self.revision.fetch_add(1, Ordering::SeqCst);

        sequence
    }

    /// Ordered copy of the buffer contents (cheap `Arc` clones)
    pub fn snapshot(&self) -> Vec<ArcLogLine> {
        self.entries.read().iter().cloned().collect()
    }

    /// Get entries filtered by a predicate
    pub fn filtered<F>(&self, predicate: F) -> Vec<ArcLogLine>
    where
        F: Fn(&LogLine) -> bool,
    {
        self.entries
            .read()
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Get entry count per log level
    pub fn level_counts(&self) -> LevelCounts {
        let entries = self.entries.read();
        let mut counts = LevelCounts::default();

        for entry in entries.iter() {
            match entry.level {
                LogLevel::Trace => counts.trace += 1,
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Info => counts.info += 1,
                LogLevel::Warn => counts.warn += 1,
                LogLevel::Error => counts.error += 1,
                LogLevel::Fatal => counts.fatal += 1,
                LogLevel::Unknown => counts.unknown += 1,
            }
        }

        counts
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mutation counter, for caches derived from the contents
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Clear all entries
    pub(crate) fn clear(&self) {
        self.entries.write().clear();
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts per log level
#[derive(Clone, Debug, Default)]
pub struct LevelCounts {
    pub trace: usize,
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub fatal: usize,
    pub unknown: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.trace + self.debug + self.info + self.warn + self.error + self.fatal + self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buffer: &LogBuffer) -> Vec<String> {
        buffer.snapshot().iter().map(|l| l.text.clone()).collect()
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let buffer = LogBuffer::new(3);
        for line in ["a", "b", "c", "d"] {
            buffer.append(line);
        }
        assert_eq!(texts(&buffer), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let buffer = LogBuffer::new(5);
        for n in 0..37 {
            buffer.append(format!("line {}", n));
            assert!(buffer.len() <= 5);
        }

        // Retained lines are the most recent five, in arrival order
        let expected: Vec<String> = (32..37).map(|n| format!("line {}", n)).collect();
        assert_eq!(texts(&buffer), expected);
    }

    #[test]
    fn test_sequence_is_monotonic_across_clear() {
        let buffer = LogBuffer::new(10);
        let first = buffer.append("a");
        let second = buffer.append("b");
        buffer.clear();
        let third = buffer.append("c");

        assert!(first < second && second < third);
        assert_eq!(buffer.snapshot()[0].sequence, third);
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let buffer = LogBuffer::new(2);
        let start = buffer.revision();
        buffer.append("a");
        buffer.append("b");
        buffer.append("c");
        assert_eq!(buffer.revision(), start + 3);
        buffer.clear();
        assert_eq!(buffer.revision(), start + 4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one_line() {
        let buffer = LogBuffer::new(0);
        buffer.append("a");
        buffer.append("b");
        assert_eq!(texts(&buffer), vec!["b"]);
    }

    #[test]
    fn test_level_counts() {
        let buffer = LogBuffer::new(10);
        buffer.append("[ERROR] boom");
        buffer.append("WARN: careful");
        buffer.append("plain");

        // Plain appends skip level detection
        let counts = buffer.level_counts();
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.unknown, 3);
    }
}
