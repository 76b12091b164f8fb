use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    api::{map_error, resolve_version},
    dto::{Feature, FeatureCollection},
    state::AppState,
};

/// `GET /shapes[?shape=..][&feed=..]` — one LineString feature per shape.
pub async fn shapes(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let version = resolve_version(&state, params.get("feed")).await?;
    let polylines = state
        .queries
        .shape_polylines(version, params.get("shape").map(String::as_str))
        .await
        .map_err(map_error)?;
    let features = polylines.iter().map(Feature::from_polyline).collect();
    Ok(Json(FeatureCollection::new(features)).into_response())
}
