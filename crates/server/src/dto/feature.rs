use depot::{
    query::{NearbyStop, ShapePolyline},
    shared::geo::linestring_geojson,
};
use serde::Serialize;

/// Minimal GeoJSON feature types, enough for a map layer to consume the
/// query results directly.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    pub r#type: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub r#type: &'static str,
    pub geometry: serde_json::Value,
    pub properties: serde_json::Value,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            r#type: "FeatureCollection",
            features,
        }
    }
}

impl Feature {
    pub fn from_nearby_stop(nearby: &NearbyStop) -> Self {
        Self {
            r#type: "Feature",
            geometry: nearby.stop.coordinate.to_geojson(),
            properties: serde_json::json!({
                "stop_id": nearby.stop.stop_id,
                "name": nearby.stop.name,
                "code": nearby.stop.code,
                "location_type": nearby.stop.location_type,
                "parent_station": nearby.stop.parent_station,
                "distance_meters": nearby.distance_meters,
            }),
        }
    }

    pub fn from_polyline(polyline: &ShapePolyline) -> Self {
        Self {
            r#type: "Feature",
            geometry: linestring_geojson(&polyline.points),
            properties: serde_json::json!({
                "shape_id": polyline.shape_id,
            }),
        }
    }
}
