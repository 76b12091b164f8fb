use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;

/// Per-run accounting of what loaded and what was rejected. Rejected rows
/// are never silently dropped; permissive mode collects them here with their
/// source file, line, and reason.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    tables: BTreeMap<String, TableCounts>,
    issues: Vec<RowIssue>,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct TableCounts {
    pub loaded: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowIssue {
    pub file: String,
    pub line: u64,
    pub reason: String,
}

impl IngestReport {
    pub fn loaded(&mut self, file: &str, count: u64) {
        self.tables.entry(file.to_string()).or_default().loaded += count;
    }

    pub fn reject(&mut self, file: &str, error: &Error) {
        self.tables.entry(file.to_string()).or_default().rejected += 1;
        self.issues.push(RowIssue {
            file: file.to_string(),
            line: error_line(error),
            reason: error.to_string(),
        });
    }

    pub fn tables(&self) -> &BTreeMap<String, TableCounts> {
        &self.tables
    }

    pub fn issues(&self) -> &[RowIssue] {
        &self.issues
    }

    pub fn total_loaded(&self) -> u64 {
        self.tables.values().map(|counts| counts.loaded).sum()
    }

    pub fn total_rejected(&self) -> u64 {
        self.tables.values().map(|counts| counts.rejected).sum()
    }
}

fn error_line(error: &Error) -> u64 {
    match error {
        Error::MalformedRow { line, .. }
        | Error::InvalidFieldValue { line, .. }
        | Error::DanglingReference { line, .. } => *line,
        _ => 0,
    }
}
