use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use depot::ingest::{IngestMode, IngestOutcome, Ingestor, OnConflict};

use crate::{api::map_error, dto::UploadResponse, state::AppState};

/// Ingestion entry point: archive bytes in the body, original filename as a
/// query parameter. A re-upload of identical bytes is a successful no-op
/// that reports the existing version.
pub async fn upload(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let filename = params
        .get("filename")
        .cloned()
        .ok_or(StatusCode::BAD_REQUEST)?;
    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mode = match params.get("mode").map(String::as_str) {
        None | Some("strict") => IngestMode::Strict,
        Some("permissive") => IngestMode::Permissive,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };
    let on_conflict = match params.get("on_conflict").map(String::as_str) {
        None | Some("ignore") => OnConflict::Ignore,
        Some("replace") => OnConflict::Replace,
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let ingestor = Ingestor::new(state.store.clone())
        .with_mode(mode)
        .with_on_conflict(on_conflict);
    match ingestor.ingest(body.to_vec(), &filename).await {
        Ok(outcome) => Ok(Json(UploadResponse::from(&outcome)).into_response()),
        Err(err) if err.is_row_level() => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(UploadResponse::rejected(&err)),
        )
            .into_response()),
        Err(err @ (depot::Error::ArchiveCorrupt(_)
        | depot::Error::EntryMissing(_)
        | depot::Error::MissingRequiredColumn { .. })) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(UploadResponse::rejected(&err)),
        )
            .into_response()),
        Err(err) => Err(map_error(err)),
    }
}

/// Audit trail of every ingested feed version.
pub async fn feeds(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let versions = state.store.list_versions().await.map_err(map_error)?;
    let body: Vec<_> = versions
        .into_iter()
        .map(|version| {
            serde_json::json!({
                "id": version.id,
                "filename": version.filename,
                "fingerprint": version.fingerprint,
                "imported_at": version.imported_at,
            })
        })
        .collect();
    Ok(Json(body).into_response())
}

impl UploadResponse {
    fn from(outcome: &IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Ingested { version, report } => Self {
                accepted: true,
                reason: "ingested".to_string(),
                feed_version_id: Some(version.id),
                tables: report.tables().clone(),
                errors: report.issues().to_vec(),
            },
            IngestOutcome::Duplicate { version } => Self {
                accepted: true,
                reason: "duplicate of an existing feed".to_string(),
                feed_version_id: Some(version.id),
                tables: Default::default(),
                errors: Vec::new(),
            },
        }
    }

    fn rejected(err: &depot::Error) -> Self {
        Self {
            accepted: false,
            reason: err.to_string(),
            feed_version_id: None,
            tables: Default::default(),
            errors: Vec::new(),
        }
    }
}
