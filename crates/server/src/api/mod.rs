mod departures;
mod feeds;
mod shapes;
mod stops;

pub use departures::*;
pub use feeds::*;
pub use shapes::*;
pub use stops::*;

use crate::state::AppState;
use axum::http::StatusCode;
use depot::Error;
use std::sync::Arc;
use tracing::error;

/// Query validation failures are the caller's problem; everything else is
/// ours and gets logged, never echoed back as a stack trace.
pub(crate) fn map_error(err: Error) -> StatusCode {
    match err {
        Error::InvalidQueryBounds(_) => StatusCode::BAD_REQUEST,
        err => {
            error!("query failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Resolves the feed-version scope of a read request: an explicit `feed`
/// parameter wins, otherwise the newest ingested version.
pub(crate) async fn resolve_version(
    state: &Arc<AppState>,
    param: Option<&String>,
) -> Result<i64, StatusCode> {
    match param {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => {
            let version = state
                .store
                .latest_version()
                .await
                .map_err(map_error)?
                .ok_or(StatusCode::NOT_FOUND)?;
            Ok(version.id)
        }
    }
}
