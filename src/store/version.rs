use sha2::{Digest, Sha256};
use sqlx::{Row as _, Sqlite, Transaction};

use crate::{error::Error, store::Store};

/// One ingested archive. Created on a successful dedup check, immutable
/// afterwards, never physically deleted; superseded versions stay behind as
/// the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedVersion {
    pub id: i64,
    pub filename: String,
    pub fingerprint: String,
    pub imported_at: String,
}

/// Content fingerprint over the raw archive bytes. This is the sole dedup
/// identity key; the filename is metadata only.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl Store {
    pub async fn find_version_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<FeedVersion>, Error> {
        let row = sqlx::query(
            "SELECT id, filename, fingerprint, imported_at
             FROM feed_versions WHERE fingerprint = ?",
        )
        .bind(fingerprint)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|row| FeedVersion {
            id: row.get("id"),
            filename: row.get("filename"),
            fingerprint: row.get("fingerprint"),
            imported_at: row.get("imported_at"),
        }))
    }

    pub async fn latest_version(&self) -> Result<Option<FeedVersion>, Error> {
        let row = sqlx::query(
            "SELECT id, filename, fingerprint, imported_at
             FROM feed_versions ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|row| FeedVersion {
            id: row.get("id"),
            filename: row.get("filename"),
            fingerprint: row.get("fingerprint"),
            imported_at: row.get("imported_at"),
        }))
    }

    pub async fn list_versions(&self) -> Result<Vec<FeedVersion>, Error> {
        let rows = sqlx::query(
            "SELECT id, filename, fingerprint, imported_at
             FROM feed_versions ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| FeedVersion {
                id: row.get("id"),
                filename: row.get("filename"),
                fingerprint: row.get("fingerprint"),
                imported_at: row.get("imported_at"),
            })
            .collect())
    }
}

/// Inserts the feed-version row inside the ingestion transaction, so an
/// aborted run rolls it back together with every child-table row.
pub(crate) async fn create_version(
    tx: &mut Transaction<'_, Sqlite>,
    filename: &str,
    fingerprint: &str,
) -> Result<FeedVersion, Error> {
    let imported_at = chrono::Utc::now().to_rfc3339();
    let row = sqlx::query(
        "INSERT INTO feed_versions (filename, fingerprint, imported_at)
         VALUES (?, ?, ?) RETURNING id",
    )
    .bind(filename)
    .bind(fingerprint)
    .bind(&imported_at)
    .fetch_one(&mut **tx)
    .await?;
    Ok(FeedVersion {
        id: row.get("id"),
        filename: filename.to_string(),
        fingerprint: fingerprint.to_string(),
        imported_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_content_addressed_test() {
        let a = fingerprint(b"feed bytes");
        let b = fingerprint(b"feed bytes");
        let c = fingerprint(b"different bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
