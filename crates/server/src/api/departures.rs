use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    api::{map_error, resolve_version},
    state::AppState,
};

/// `GET /departures?stop=..&after=HH:MM:SS[&count=..][&feed=..]`
pub async fn departures(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let stop = params.get("stop").ok_or(StatusCode::BAD_REQUEST)?;
    let after = params.get("after").ok_or(StatusCode::BAD_REQUEST)?;
    let count: usize = match params.get("count") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => 10,
    };
    let version = resolve_version(&state, params.get("feed")).await?;

    let departures = state
        .queries
        .departures_after(version, stop, after, count)
        .await
        .map_err(map_error)?;
    Ok(Json(departures).into_response())
}
