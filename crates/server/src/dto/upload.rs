use std::collections::BTreeMap;

use depot::ingest::{RowIssue, TableCounts};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub accepted: bool,
    pub reason: String,
    pub feed_version_id: Option<i64>,
    pub tables: BTreeMap<String, TableCounts>,
    pub errors: Vec<RowIssue>,
}
