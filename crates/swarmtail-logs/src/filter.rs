use regex::Regex;

use crate::buffer::LogBuffer;
use swarmtail_types::{ArcLogLine, LogLine};

/// Case-insensitive literal substring search.
///
/// The term is escaped before compiling, so regex metacharacters typed by
/// the user match themselves.
#[derive(Clone, Default)]
pub struct SearchQuery {
    term: String,
    regex: Option<Regex>,
    /// Fallback when the term is too large to compile
    lowered: String,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        let regex = if term.is_empty() {
            None
        } else {
            Regex::new(&format!("(?i){}", regex::escape(term))).ok()
        };

        Self {
            term: term.to_string(),
            regex,
            lowered: term.to_lowercase(),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// An empty term matches everything
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.term.is_empty() {
            return true;
        }
        match &self.regex {
            Some(re) => re.is_match(text),
            None => text.to_lowercase().contains(&self.lowered),
        }
    }

    /// Byte ranges of every match, for highlighting
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }

    pub fn matches_line(&self, line: &LogLine) -> bool {
        self.matches(&line.text)
    }
}

impl std::fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQuery")
            .field("term", &self.term)
            .finish()
    }
}

/// Last computed visible set, keyed by term and buffer revision
#[derive(Default)]
struct ViewCache {
    term: String,
    revision: u64,
    lines: Vec<ArcLogLine>,
    valid: bool,
}

impl ViewCache {
    fn needs_refresh(&self, term: &str, revision: u64) -> bool {
        !self.valid || self.revision != revision || self.term != term
    }
}

/// Read-only projection of a buffer through a search term
#[derive(Default)]
pub struct LogView {
    query: SearchQuery,
    cache: ViewCache,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search term. Never touches the buffer.
    pub fn set_search(&mut self, term: &str) {
        if term != self.query.term() {
            self.query = SearchQuery::new(term);
        }
    }

    pub fn search(&self) -> &str {
        self.query.term()
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Lines whose text contains the term, in buffer order.
    /// Recomputed only when the term or the buffer revision changed.
    pub fn visible(&mut self, buffer: &LogBuffer) -> &[ArcLogLine] {
        let revision = buffer.revision();
        if self.cache.needs_refresh(self.query.term(), revision) {
            self.cache.lines = self.compute(buffer);
            self.cache.term = self.query.term().to_string();
            self.cache.revision = revision;
            self.cache.valid = true;
        }
        &self.cache.lines
    }

    /// Uncached variant of [`visible`](Self::visible)
    pub fn compute(&self, buffer: &LogBuffer) -> Vec<ArcLogLine> {
        if self.query.is_empty() {
            buffer.snapshot()
        } else {
            buffer.filtered(|line| self.query.matches_line(line))
        }
    }

    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        self.query.find_matches(text)
    }
}
