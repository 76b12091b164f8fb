use std::io;
use thiserror::Error;

/// Everything that can go wrong between receiving archive bytes and
/// answering a query. Row-level variants carry the source file and the
/// 1-based line they came from so permissive-mode reports stay useful.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("archive corrupt: {0}")]
    ArchiveCorrupt(#[from] zip::result::ZipError),
    #[error("required table {0} is missing from the archive")]
    EntryMissing(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{file}: required column {column} is missing from the header")]
    MissingRequiredColumn { file: String, column: &'static str },
    #[error("{file}:{line}: malformed row: {reason}")]
    MalformedRow {
        file: String,
        line: u64,
        reason: String,
    },
    #[error("{file}:{line}: invalid value {value:?} for field {field}")]
    InvalidFieldValue {
        file: String,
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("{file}:{line}: reference to missing {parent} {parent_id:?}")]
    DanglingReference {
        file: String,
        line: u64,
        parent: &'static str,
        parent_id: String,
    },
    #[error("invalid query bounds: {0}")]
    InvalidQueryBounds(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("stored geometry unreadable: {0}")]
    Geometry(#[from] serde_json::Error),
    #[error("ingestion cancelled")]
    Cancelled,
}

impl Error {
    /// Row-level errors abort a single row in permissive mode; everything
    /// else aborts the whole ingestion regardless of mode.
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            Error::MalformedRow { .. }
                | Error::InvalidFieldValue { .. }
                | Error::DanglingReference { .. }
        )
    }
}
