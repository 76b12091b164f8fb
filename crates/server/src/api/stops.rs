use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use depot::shared::geo::{Coordinate, Distance};

use crate::{
    api::{map_error, resolve_version},
    dto::{Feature, FeatureCollection},
    state::AppState,
};

/// `GET /stops/near?lat=..&lon=..&radius=..[&count=..][&feed=..]`
pub async fn near(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let latitude: f64 = parse_param(&params, "lat")?;
    let longitude: f64 = parse_param(&params, "lon")?;
    let radius: f64 = parse_param(&params, "radius")?;
    let count: usize = match params.get("count") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => 25,
    };
    let version = resolve_version(&state, params.get("feed")).await?;

    let nearby = state
        .queries
        .nearby_stops(
            version,
            Coordinate::new(latitude, longitude),
            Distance::from_meters(radius),
            count,
        )
        .await
        .map_err(map_error)?;
    let features = nearby.iter().map(Feature::from_nearby_stop).collect();
    Ok(Json(FeatureCollection::new(features)).into_response())
}

fn parse_param<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<T, StatusCode> {
    params
        .get(name)
        .ok_or(StatusCode::BAD_REQUEST)?
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)
}
