// src/debug_log.rs
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Marker,
    Event,
    Error,
    Command,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DebugLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
    pub message: String,
}

impl DebugLogEntry {
    /// `<ISO-8601> - <message>`
    pub fn render(&self) -> String {
        format!("{} - {}", iso_timestamp(self.timestamp), self.message)
    }
}

/// `2024-05-01T12:00:00.000Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Operator-facing session notes, exported as plain text.
#[derive(Clone, Debug, Default)]
pub struct DebugLog {
    entries: Vec<DebugLogEntry>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DebugLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_at(&mut self, timestamp: DateTime<Utc>, kind: EntryKind, message: impl Into<String>) {
        self.entries.push(DebugLogEntry {
            timestamp,
            kind,
            message: message.into(),
        });
    }

    pub fn push(&mut self, kind: EntryKind, message: impl Into<String>) {
        self.push_at(Utc::now(), kind, message);
    }

    /// Appends `Marker N`, numbered from the current entry count.
    pub fn add_marker(&mut self) -> &DebugLogEntry {
        let message = format!("Marker {}", self.entries.len() + 1);
        self.push(EntryKind::Marker, message);
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn export(&self) -> String {
        if self.entries.is_empty() {
            return "(empty)".to_owned();
        }
        self.entries
            .iter()
            .map(DebugLogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
