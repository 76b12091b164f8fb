use serde::{Deserialize, Serialize};
use sqlx::Row as _;

use crate::{
    error::Error,
    shared::{
        geo::{Coordinate, Distance},
        time::ServiceTime,
    },
    store::Store,
};

/// Hard ceiling on radius-query results regardless of what the caller asks
/// for.
pub const MAX_NEARBY_RESULTS: usize = 500;

/// Read-only spatial/temporal queries over a loaded feed version. Safe to
/// run concurrently with each other and with ingestion of other versions;
/// writes only become visible here after their transaction commits.
#[derive(Clone)]
pub struct QueryEngine {
    store: Store,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopRecord {
    pub stop_id: String,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub coordinate: Coordinate,
    pub location_type: i64,
    pub parent_station: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyStop {
    #[serde(flatten)]
    pub stop: StopRecord,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Departure {
    pub trip_id: String,
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i64,
    pub headsign: Option<String>,
    pub stop_sequence: i64,
    pub arrival_time: String,
    pub departure_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapePolyline {
    pub shape_id: String,
    pub points: Vec<Coordinate>,
}

impl QueryEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stops within `radius` of `center`, ascending by great-circle
    /// distance. A latitude/longitude box narrows the candidate set in SQL;
    /// the exact haversine distance decides membership and order.
    pub async fn nearby_stops(
        &self,
        version_id: i64,
        center: Coordinate,
        radius: Distance,
        limit: usize,
    ) -> Result<Vec<NearbyStop>, Error> {
        if !center.is_valid() {
            return Err(Error::InvalidQueryBounds(format!(
                "center out of range: {center}"
            )));
        }
        if !radius.is_valid_radius() {
            return Err(Error::InvalidQueryBounds(format!(
                "radius must be finite and positive, got {}",
                radius.as_meters()
            )));
        }
        let bounds = center.bounding_box(radius);
        // A box that crosses ±180° longitude spans the complement interval.
        let lon_span = if bounds.wraps_antimeridian() {
            "(lon >= ? OR lon <= ?)"
        } else {
            "lon BETWEEN ? AND ?"
        };
        let sql = format!(
            "SELECT stop_id, name, code, description, lat, lon, location_type, parent_station
             FROM stops
             WHERE feed_version_id = ?
               AND lat BETWEEN ? AND ?
               AND {lon_span}"
        );
        let rows = sqlx::query(&sql)
            .bind(version_id)
            .bind(bounds.min_lat)
            .bind(bounds.max_lat)
            .bind(bounds.min_lon)
            .bind(bounds.max_lon)
            .fetch_all(self.store.pool())
            .await?;

        let mut nearby: Vec<NearbyStop> = rows
            .into_iter()
            .map(|row| {
                let stop = stop_record(&row);
                let distance_meters = center.distance(&stop.coordinate).as_meters();
                NearbyStop {
                    stop,
                    distance_meters,
                }
            })
            .filter(|candidate| candidate.distance_meters <= radius.as_meters())
            .collect();
        nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        nearby.truncate(limit.min(MAX_NEARBY_RESULTS));
        Ok(nearby)
    }

    /// Scheduled departures from one stop at or after a time-of-day
    /// threshold, ascending. Comparison is lexical on zero-padded HH:MM:SS,
    /// so past-midnight times like "25:10:00" sort after "23:59:00" within
    /// the same service day. That is the GTFS convention, not wall-clock
    /// time.
    pub async fn departures_after(
        &self,
        version_id: i64,
        stop_id: &str,
        threshold: &str,
        limit: usize,
    ) -> Result<Vec<Departure>, Error> {
        let threshold = ServiceTime::from_hms(threshold)
            .ok_or_else(|| {
                Error::InvalidQueryBounds(format!("unparseable time threshold {threshold:?}"))
            })?
            .to_hms_string();
        let rows = sqlx::query(
            "SELECT st.trip_id, st.stop_sequence, st.arrival_time, st.departure_time,
                    t.headsign, t.route_id,
                    r.short_name AS route_short_name, r.long_name AS route_long_name,
                    r.route_type
             FROM stop_times st
             JOIN trips t ON t.feed_version_id = st.feed_version_id
                         AND t.trip_id = st.trip_id
             JOIN routes r ON r.feed_version_id = st.feed_version_id
                          AND r.route_id = t.route_id
             WHERE st.feed_version_id = ?
               AND st.stop_id = ?
               AND st.departure_time >= ?
             ORDER BY st.departure_time ASC
             LIMIT ?",
        )
        .bind(version_id)
        .bind(stop_id)
        .bind(&threshold)
        .bind(limit as i64)
        .fetch_all(self.store.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Departure {
                trip_id: row.get("trip_id"),
                route_id: row.get("route_id"),
                route_short_name: row.get("route_short_name"),
                route_long_name: row.get("route_long_name"),
                route_type: row.get("route_type"),
                headsign: row.get("headsign"),
                stop_sequence: row.get("stop_sequence"),
                arrival_time: row.get("arrival_time"),
                departure_time: row.get("departure_time"),
            })
            .collect())
    }

    /// Materialized polylines for one shape or every shape of a version,
    /// points in draw order.
    pub async fn shape_polylines(
        &self,
        version_id: i64,
        shape_id: Option<&str>,
    ) -> Result<Vec<ShapePolyline>, Error> {
        let rows = match shape_id {
            Some(shape_id) => {
                sqlx::query(
                    "SELECT shape_id, geom FROM shapes
                     WHERE feed_version_id = ? AND shape_id = ?",
                )
                .bind(version_id)
                .bind(shape_id)
                .fetch_all(self.store.pool())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT shape_id, geom FROM shapes
                     WHERE feed_version_id = ? ORDER BY shape_id",
                )
                .bind(version_id)
                .fetch_all(self.store.pool())
                .await?
            }
        };

        let mut polylines = Vec::with_capacity(rows.len());
        for row in rows {
            let geom: String = row.get("geom");
            let linestring: LineString = serde_json::from_str(&geom)?;
            polylines.push(ShapePolyline {
                shape_id: row.get("shape_id"),
                points: linestring
                    .coordinates
                    .into_iter()
                    .map(|[longitude, latitude]| Coordinate::new(latitude, longitude))
                    .collect(),
            });
        }
        Ok(polylines)
    }

    pub async fn stop(&self, version_id: i64, stop_id: &str) -> Result<Option<StopRecord>, Error> {
        let row = sqlx::query(
            "SELECT stop_id, name, code, description, lat, lon, location_type, parent_station
             FROM stops WHERE feed_version_id = ? AND stop_id = ?",
        )
        .bind(version_id)
        .bind(stop_id)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(row.map(|row| stop_record(&row)))
    }
}

fn stop_record(row: &sqlx::sqlite::SqliteRow) -> StopRecord {
    StopRecord {
        stop_id: row.get("stop_id"),
        name: row.get("name"),
        code: row.get("code"),
        description: row.get("description"),
        coordinate: Coordinate::new(row.get("lat"), row.get("lon")),
        location_type: row.get("location_type"),
        parent_station: row.get("parent_station"),
    }
}

#[derive(Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}
