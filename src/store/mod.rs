use std::path::Path;

use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

mod version;
pub use version::*;

use crate::error::Error;

/// Explicit handle to the relational store. Constructed once by the process
/// entry point and passed into the ingestor and query engine; nothing in the
/// crate holds global connection state.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single never-recycled connection keeps
    /// the database alive for the lifetime of the pool.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, Error> {
        Ok(self.pool.begin().await?)
    }

    /// Idempotent schema creation. Every entity table is keyed by
    /// `(feed_version_id, natural id)`; GTFS identifiers are only unique
    /// within their owning feed version, never globally.
    async fn migrate(&self) -> Result<(), Error> {
        const STATEMENTS: &[&str] = &[
            "CREATE TABLE IF NOT EXISTS feed_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                fingerprint TEXT NOT NULL UNIQUE,
                imported_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS agencies (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                agency_id TEXT NOT NULL,
                name TEXT NOT NULL,
                url TEXT,
                timezone TEXT,
                lang TEXT,
                phone TEXT,
                PRIMARY KEY (feed_version_id, agency_id)
            )",
            "CREATE TABLE IF NOT EXISTS routes (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                route_id TEXT NOT NULL,
                agency_id TEXT NOT NULL,
                short_name TEXT,
                long_name TEXT,
                description TEXT,
                route_type INTEGER NOT NULL,
                color TEXT,
                text_color TEXT,
                PRIMARY KEY (feed_version_id, route_id)
            )",
            "CREATE TABLE IF NOT EXISTS stops (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                stop_id TEXT NOT NULL,
                name TEXT NOT NULL,
                code TEXT,
                description TEXT,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                location_type INTEGER NOT NULL DEFAULT 0,
                parent_station TEXT,
                geom TEXT NOT NULL,
                PRIMARY KEY (feed_version_id, stop_id)
            )",
            "CREATE TABLE IF NOT EXISTS trips (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                trip_id TEXT NOT NULL,
                route_id TEXT NOT NULL,
                service_id TEXT NOT NULL,
                headsign TEXT,
                direction_id INTEGER,
                shape_id TEXT,
                PRIMARY KEY (feed_version_id, trip_id)
            )",
            "CREATE TABLE IF NOT EXISTS stop_times (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                trip_id TEXT NOT NULL,
                stop_sequence INTEGER NOT NULL,
                stop_id TEXT NOT NULL,
                arrival_time TEXT NOT NULL,
                departure_time TEXT NOT NULL,
                PRIMARY KEY (feed_version_id, trip_id, stop_sequence)
            )",
            "CREATE INDEX IF NOT EXISTS idx_stop_times_stop
                ON stop_times (feed_version_id, stop_id, departure_time)",
            "CREATE TABLE IF NOT EXISTS calendar (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                service_id TEXT NOT NULL,
                monday INTEGER NOT NULL,
                tuesday INTEGER NOT NULL,
                wednesday INTEGER NOT NULL,
                thursday INTEGER NOT NULL,
                friday INTEGER NOT NULL,
                saturday INTEGER NOT NULL,
                sunday INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                PRIMARY KEY (feed_version_id, service_id)
            )",
            "CREATE TABLE IF NOT EXISTS calendar_dates (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                service_id TEXT NOT NULL,
                date TEXT NOT NULL,
                exception_type INTEGER NOT NULL,
                PRIMARY KEY (feed_version_id, service_id, date)
            )",
            "CREATE TABLE IF NOT EXISTS shape_points (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                shape_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                PRIMARY KEY (feed_version_id, shape_id, sequence)
            )",
            "CREATE TABLE IF NOT EXISTS shapes (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                shape_id TEXT NOT NULL,
                geom TEXT NOT NULL,
                PRIMARY KEY (feed_version_id, shape_id)
            )",
            "CREATE TABLE IF NOT EXISTS fare_attributes (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                fare_id TEXT NOT NULL,
                price REAL NOT NULL,
                currency TEXT NOT NULL,
                payment_method INTEGER,
                transfers INTEGER,
                PRIMARY KEY (feed_version_id, fare_id)
            )",
            "CREATE TABLE IF NOT EXISTS fare_rules (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                fare_id TEXT NOT NULL,
                route_id TEXT,
                origin_id TEXT,
                destination_id TEXT
            )",
            "CREATE TABLE IF NOT EXISTS feed_info (
                feed_version_id INTEGER NOT NULL REFERENCES feed_versions (id),
                publisher_name TEXT NOT NULL,
                publisher_url TEXT,
                lang TEXT,
                start_date TEXT,
                end_date TEXT,
                version TEXT,
                PRIMARY KEY (feed_version_id)
            )",
        ];
        for statement in STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("store schema ready");
        Ok(())
    }
}
