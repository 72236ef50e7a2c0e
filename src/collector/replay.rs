//! Replay of recorded key event streams.
//!
//! Recordings are newline-delimited JSON, one [`RawKeyEvent`] per line. Blank
//! lines and lines starting with `#` are skipped. Several recordings can be
//! chained into one source, which is how the CLI feeds multiple enrollment
//! samples through the same capture loop a live hook would use.

use crate::collector::source::{EventSource, SourcePoll};
use crate::collector::types::{KeyEvent, RawKeyEvent};
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors reading a recording.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// An [`EventSource`] over a fixed list of recorded events.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    events: VecDeque<KeyEvent>,
}

impl ReplaySource {
    pub fn new(events: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Parse an NDJSON recording.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut source = Self::default();
        source.extend_from_reader(reader)?;
        Ok(source)
    }

    /// Parse an NDJSON recording from disk.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let mut source = Self::default();
        source.extend_from_path(path)?;
        Ok(source)
    }

    /// Append another recording after the events already queued.
    pub fn extend_from_reader(&mut self, reader: impl BufRead) -> Result<(), ReplayError> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let raw: RawKeyEvent =
                serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
                    line: idx + 1,
                    source,
                })?;
            self.events.push_back(raw.into());
        }
        Ok(())
    }

    /// Append a recording read from disk.
    pub fn extend_from_path(&mut self, path: &Path) -> Result<(), ReplayError> {
        let file = std::fs::File::open(path)?;
        self.extend_from_reader(std::io::BufReader::new(file))
    }

    /// Number of events not yet replayed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ReplaySource {
    fn poll_event(&mut self, _timeout: Duration) -> SourcePoll {
        match self.events.pop_front() {
            Some(event) => SourcePoll::Event(event),
            None => SourcePoll::Closed,
        }
    }
}
