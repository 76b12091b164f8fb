use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

mod report;
pub use report::*;

use crate::{
    error::Error,
    gtfs::{
        FeedArchive, GtfsAgency, GtfsCalendar, GtfsCalendarDate, GtfsFareAttribute, GtfsFareRule,
        GtfsFeedInfo, GtfsRoute, GtfsShapePoint, GtfsStop, GtfsStopTime, GtfsTrip, Row,
        TableSchema, schema,
    },
    shared::geo::{Coordinate, linestring_geojson},
    store::{FeedVersion, Store, create_version, fingerprint},
};

const BATCH_SIZE: usize = 2048;

/// Row-error policy. Strict is the production default: the first bad row
/// aborts the run and the transaction rolls back to the pre-import state.
/// Permissive skips and counts bad rows instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestMode {
    #[default]
    Strict,
    Permissive,
}

/// Upsert behavior for dimension tables. `Ignore` preserves first-write
/// semantics within a version; `Replace` is for re-imports of a version
/// that is still being assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnConflict {
    #[default]
    Ignore,
    Replace,
}

impl OnConflict {
    fn verb(self) -> &'static str {
        match self {
            OnConflict::Ignore => "INSERT OR IGNORE",
            OnConflict::Replace => "INSERT OR REPLACE",
        }
    }
}

/// Cooperative cancellation, checked between row batches. Cancelling while
/// the transaction is open rolls everything back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum IngestOutcome {
    /// A new feed version was created and loaded.
    Ingested {
        version: FeedVersion,
        report: IngestReport,
    },
    /// The exact same bytes were ingested before. Not an error: the caller
    /// gets the existing version back and nothing is re-loaded.
    Duplicate { version: FeedVersion },
}

impl IngestOutcome {
    pub fn version(&self) -> &FeedVersion {
        match self {
            IngestOutcome::Ingested { version, .. } => version,
            IngestOutcome::Duplicate { version } => version,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, IngestOutcome::Duplicate { .. })
    }
}

/// The normalization and load engine. Consumes one archive, writes one feed
/// version; tables load in fixed dependency order inside a single
/// transaction.
pub struct Ingestor {
    store: Store,
    mode: IngestMode,
    on_conflict: OnConflict,
    cancel: CancelToken,
}

impl Ingestor {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            mode: IngestMode::default(),
            on_conflict: OnConflict::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_mode(mut self, mode: IngestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn ingest(&self, bytes: Vec<u8>, filename: &str) -> Result<IngestOutcome, Error> {
        let fingerprint = fingerprint(&bytes);
        if let Some(version) = self.store.find_version_by_fingerprint(&fingerprint).await? {
            info!(
                filename,
                version = version.id,
                "duplicate feed, nothing to load"
            );
            return Ok(IngestOutcome::Duplicate { version });
        }

        let mut archive = FeedArchive::open(bytes)?;
        archive.require_tables()?;

        let mut tx = self.store.begin().await?;
        let version = match create_version(&mut tx, filename, &fingerprint).await {
            Ok(version) => version,
            // Lost a race with a concurrent upload of the same bytes: the
            // fingerprint row exists now, so report the winner's version.
            Err(Error::Sqlx(err)) if is_unique_violation(&err) => {
                drop(tx);
                let version = self
                    .store
                    .find_version_by_fingerprint(&fingerprint)
                    .await?
                    .ok_or(Error::Sqlx(err))?;
                info!(
                    filename,
                    version = version.id,
                    "duplicate feed, nothing to load"
                );
                return Ok(IngestOutcome::Duplicate { version });
            }
            Err(err) => return Err(err),
        };
        info!(filename, version = version.id, "ingesting feed");

        let mut report = IngestReport::default();
        let result = self
            .load_all(&mut tx, version.id, &mut archive, &mut report)
            .await;
        match result {
            Ok(()) => {
                tx.commit().await?;
                info!(
                    version = version.id,
                    loaded = report.total_loaded(),
                    rejected = report.total_rejected(),
                    "feed ingested"
                );
                Ok(IngestOutcome::Ingested { version, report })
            }
            // Dropping the transaction rolls back every write of this run,
            // including the feed-version row itself.
            Err(err) => Err(err),
        }
    }

    async fn load_all(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let agencies = self.load_agencies(tx, version_id, archive, report).await?;
        let routes = self
            .load_routes(tx, version_id, archive, report, &agencies)
            .await?;
        let trips = self
            .load_trips(tx, version_id, archive, report, &routes)
            .await?;
        let stops = self.load_stops(tx, version_id, archive, report).await?;
        self.load_stop_times(tx, version_id, archive, report, &trips, &stops)
            .await?;
        self.load_calendar(tx, version_id, archive, report).await?;
        self.load_calendar_dates(tx, version_id, archive, report)
            .await?;
        self.load_shapes(tx, version_id, archive, report).await?;
        self.load_fare_attributes(tx, version_id, archive, report)
            .await?;
        self.load_fare_rules(tx, version_id, archive, report).await?;
        self.load_feed_info(tx, version_id, archive, report).await?;
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Strict mode (and any non-row-level error) aborts; permissive mode
    /// counts the row and moves on.
    fn handle_row_error(
        &self,
        error: Error,
        file: &str,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        if self.mode == IngestMode::Strict || !error.is_row_level() {
            return Err(error);
        }
        debug!(file, %error, "skipping row");
        report.reject(file, &error);
        Ok(())
    }

    /// Parses one table entry into typed rows paired with their source
    /// lines. Conversion runs on row batches in parallel; the row-error
    /// policy is applied here so every table behaves the same way.
    fn parse_table<T: Send>(
        &self,
        archive: &mut FeedArchive,
        table: TableSchema,
        report: &mut IngestReport,
        convert: fn(&Row) -> Result<T, Error>,
    ) -> Result<Vec<(u64, T)>, Error> {
        let bytes = archive.entry(table.file)?;
        let mut reader = crate::gtfs::TableReader::new(bytes, table)?;
        let mut rows = Vec::new();
        loop {
            self.checkpoint()?;
            let mut batch = Vec::with_capacity(BATCH_SIZE);
            for result in reader.by_ref().take(BATCH_SIZE) {
                match result {
                    Ok(row) => batch.push(row),
                    Err(error) => self.handle_row_error(error, table.file, report)?,
                }
            }
            if batch.is_empty() {
                break;
            }
            let converted: Vec<(u64, Result<T, Error>)> = batch
                .par_iter()
                .map(|row| (row.line(), convert(row)))
                .collect();
            for (line, result) in converted {
                match result {
                    Ok(record) => rows.push((line, record)),
                    Err(error) => self.handle_row_error(error, table.file, report)?,
                }
            }
        }
        Ok(rows)
    }

    async fn load_agencies(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<HashSet<String>, Error> {
        let table = schema::AGENCY;
        let rows = self.parse_table(archive, table, report, GtfsAgency::from_row)?;
        let sql = format!(
            "{} INTO agencies (feed_version_id, agency_id, name, url, timezone, lang, phone)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut ids = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        for (index, (_, agency)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            let result = sqlx::query(&sql)
                .bind(version_id)
                .bind(&agency.agency_id)
                .bind(&agency.name)
                .bind(&agency.url)
                .bind(&agency.timezone)
                .bind(&agency.lang)
                .bind(&agency.phone)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
            ids.insert(agency.agency_id.clone());
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(ids)
    }

    async fn load_routes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
        agencies: &HashSet<String>,
    ) -> Result<HashSet<String>, Error> {
        let table = schema::ROUTES;
        let rows = self.parse_table(archive, table, report, GtfsRoute::from_row)?;
        let sql = format!(
            "{} INTO routes (feed_version_id, route_id, agency_id, short_name, long_name,
                             description, route_type, color, text_color)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut ids = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        // Rows citing a parent not committed yet wait in a deferral queue
        // bounded by one extra pass.
        let mut deferred = Vec::new();
        for (index, (line, route)) in rows.into_iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            if !agencies.contains(&route.agency_id) {
                deferred.push((line, route));
                continue;
            }
            if insert_route(tx, &sql, version_id, &route).await? {
                loaded += 1;
            }
            ids.insert(route.route_id);
        }
        for (line, route) in deferred {
            if agencies.contains(&route.agency_id) {
                if insert_route(tx, &sql, version_id, &route).await? {
                    loaded += 1;
                }
                ids.insert(route.route_id);
            } else {
                let error = Error::DanglingReference {
                    file: table.file.to_string(),
                    line,
                    parent: "agency",
                    parent_id: route.agency_id,
                };
                self.handle_row_error(error, table.file, report)?;
            }
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(ids)
    }

    async fn load_trips(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
        routes: &HashSet<String>,
    ) -> Result<HashSet<String>, Error> {
        let table = schema::TRIPS;
        let rows = self.parse_table(archive, table, report, GtfsTrip::from_row)?;
        let sql = format!(
            "{} INTO trips (feed_version_id, trip_id, route_id, service_id, headsign,
                            direction_id, shape_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut ids = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        let mut deferred = Vec::new();
        for (index, (line, trip)) in rows.into_iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            if !routes.contains(&trip.route_id) {
                deferred.push((line, trip));
                continue;
            }
            if insert_trip(tx, &sql, version_id, &trip).await? {
                loaded += 1;
            }
            ids.insert(trip.trip_id);
        }
        for (line, trip) in deferred {
            if routes.contains(&trip.route_id) {
                if insert_trip(tx, &sql, version_id, &trip).await? {
                    loaded += 1;
                }
                ids.insert(trip.trip_id);
            } else {
                let error = Error::DanglingReference {
                    file: table.file.to_string(),
                    line,
                    parent: "route",
                    parent_id: trip.route_id,
                };
                self.handle_row_error(error, table.file, report)?;
            }
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(ids)
    }

    async fn load_stops(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<HashSet<String>, Error> {
        let table = schema::STOPS;
        let rows = self.parse_table(archive, table, report, GtfsStop::from_row)?;
        let sql = format!(
            "{} INTO stops (feed_version_id, stop_id, name, code, description, lat, lon,
                            location_type, parent_station, geom)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut ids = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        for (index, (_, stop)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            // Canonical lat/lon and the derived geometry are both stored;
            // the geometry is computed exactly once, here.
            let geom = stop.coordinate.to_geojson().to_string();
            let result = sqlx::query(&sql)
                .bind(version_id)
                .bind(&stop.stop_id)
                .bind(&stop.name)
                .bind(&stop.code)
                .bind(&stop.description)
                .bind(stop.coordinate.latitude)
                .bind(stop.coordinate.longitude)
                .bind(stop.location_type)
                .bind(&stop.parent_station)
                .bind(&geom)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
            ids.insert(stop.stop_id.clone());
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(ids)
    }

    async fn load_stop_times(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
        trips: &HashSet<String>,
        stops: &HashSet<String>,
    ) -> Result<(), Error> {
        let table = schema::STOP_TIMES;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsStopTime::from_row)?;
        let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        let mut deferred = Vec::new();
        for (index, (line, stop_time)) in rows.into_iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            match self.stop_time_parent(line, &stop_time, trips, stops) {
                Ok(()) => {}
                Err(_) => {
                    deferred.push((line, stop_time));
                    continue;
                }
            }
            if !seen.insert((stop_time.trip_id.clone(), stop_time.stop_sequence)) {
                let error = Error::InvalidFieldValue {
                    file: table.file.to_string(),
                    line,
                    field: "stop_sequence",
                    value: format!(
                        "duplicate sequence {} for trip {}",
                        stop_time.stop_sequence, stop_time.trip_id
                    ),
                };
                self.handle_row_error(error, table.file, report)?;
                continue;
            }
            insert_stop_time(tx, version_id, &stop_time).await?;
            loaded += 1;
        }
        for (line, stop_time) in deferred {
            match self.stop_time_parent(line, &stop_time, trips, stops) {
                Ok(()) => {
                    if seen.insert((stop_time.trip_id.clone(), stop_time.stop_sequence)) {
                        insert_stop_time(tx, version_id, &stop_time).await?;
                        loaded += 1;
                    }
                }
                Err(error) => self.handle_row_error(error, table.file, report)?,
            }
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(())
    }

    fn stop_time_parent(
        &self,
        line: u64,
        stop_time: &GtfsStopTime,
        trips: &HashSet<String>,
        stops: &HashSet<String>,
    ) -> Result<(), Error> {
        if !trips.contains(&stop_time.trip_id) {
            return Err(Error::DanglingReference {
                file: schema::STOP_TIMES.file.to_string(),
                line,
                parent: "trip",
                parent_id: stop_time.trip_id.clone(),
            });
        }
        if !stops.contains(&stop_time.stop_id) {
            return Err(Error::DanglingReference {
                file: schema::STOP_TIMES.file.to_string(),
                line,
                parent: "stop",
                parent_id: stop_time.stop_id.clone(),
            });
        }
        Ok(())
    }

    async fn load_calendar(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::CALENDAR;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsCalendar::from_row)?;
        let sql = format!(
            "{} INTO calendar (feed_version_id, service_id, monday, tuesday, wednesday,
                               thursday, friday, saturday, sunday, start_date, end_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut loaded = 0;
        for (index, (_, calendar)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            let mut query = sqlx::query(&sql).bind(version_id).bind(&calendar.service_id);
            for day in calendar.weekdays {
                query = query.bind(day as i64);
            }
            let result = query
                .bind(&calendar.start_date)
                .bind(&calendar.end_date)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(())
    }

    async fn load_calendar_dates(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::CALENDAR_DATES;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsCalendarDate::from_row)?;
        let sql = format!(
            "{} INTO calendar_dates (feed_version_id, service_id, date, exception_type)
             VALUES (?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut loaded = 0;
        for (index, (_, exception)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            let result = sqlx::query(&sql)
                .bind(version_id)
                .bind(&exception.service_id)
                .bind(&exception.date)
                .bind(exception.exception_type)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(())
    }

    /// Two passes: every shape point loads (and is checked for duplicate
    /// sequence numbers) before any polyline is materialized, because draw
    /// order only exists once the whole set is known.
    async fn load_shapes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::SHAPES;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsShapePoint::from_row)?;
        let mut polylines: HashMap<String, Vec<(i64, Coordinate)>> = HashMap::new();
        let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(rows.len());
        let mut loaded = 0;
        for (index, (line, point)) in rows.into_iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            if !seen.insert((point.shape_id.clone(), point.sequence)) {
                let error = Error::InvalidFieldValue {
                    file: table.file.to_string(),
                    line,
                    field: "shape_pt_sequence",
                    value: format!(
                        "duplicate sequence {} for shape {}",
                        point.sequence, point.shape_id
                    ),
                };
                self.handle_row_error(error, table.file, report)?;
                continue;
            }
            sqlx::query(
                "INSERT INTO shape_points (feed_version_id, shape_id, sequence, lat, lon)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(version_id)
            .bind(&point.shape_id)
            .bind(point.sequence)
            .bind(point.coordinate.latitude)
            .bind(point.coordinate.longitude)
            .execute(&mut **tx)
            .await?;
            polylines
                .entry(point.shape_id)
                .or_default()
                .push((point.sequence, point.coordinate));
            loaded += 1;
        }
        for (shape_id, mut points) in polylines {
            self.checkpoint()?;
            points.sort_by_key(|(sequence, _)| *sequence);
            let ordered: Vec<Coordinate> =
                points.into_iter().map(|(_, coordinate)| coordinate).collect();
            let geom = linestring_geojson(&ordered).to_string();
            sqlx::query(
                "INSERT OR REPLACE INTO shapes (feed_version_id, shape_id, geom)
                 VALUES (?, ?, ?)",
            )
            .bind(version_id)
            .bind(&shape_id)
            .bind(&geom)
            .execute(&mut **tx)
            .await?;
        }
        report.loaded(table.file, loaded);
        debug!(table = table.file, rows = loaded, "loaded");
        Ok(())
    }

    async fn load_fare_attributes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::FARE_ATTRIBUTES;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsFareAttribute::from_row)?;
        let sql = format!(
            "{} INTO fare_attributes (feed_version_id, fare_id, price, currency,
                                      payment_method, transfers)
             VALUES (?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut loaded = 0;
        for (index, (_, fare)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            let result = sqlx::query(&sql)
                .bind(version_id)
                .bind(&fare.fare_id)
                .bind(fare.price)
                .bind(&fare.currency)
                .bind(fare.payment_method)
                .bind(fare.transfers)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
        }
        report.loaded(table.file, loaded);
        Ok(())
    }

    async fn load_fare_rules(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::FARE_RULES;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsFareRule::from_row)?;
        let mut loaded = 0;
        for (index, (_, rule)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            sqlx::query(
                "INSERT INTO fare_rules (feed_version_id, fare_id, route_id, origin_id,
                                         destination_id)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(version_id)
            .bind(&rule.fare_id)
            .bind(&rule.route_id)
            .bind(&rule.origin_id)
            .bind(&rule.destination_id)
            .execute(&mut **tx)
            .await?;
            loaded += 1;
        }
        report.loaded(table.file, loaded);
        Ok(())
    }

    async fn load_feed_info(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        version_id: i64,
        archive: &mut FeedArchive,
        report: &mut IngestReport,
    ) -> Result<(), Error> {
        let table = schema::FEED_INFO;
        if !archive.contains(table.file) {
            return Ok(());
        }
        let rows = self.parse_table(archive, table, report, GtfsFeedInfo::from_row)?;
        let sql = format!(
            "{} INTO feed_info (feed_version_id, publisher_name, publisher_url, lang,
                                start_date, end_date, version)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.on_conflict.verb()
        );
        let mut loaded = 0;
        for (index, (_, info)) in rows.iter().enumerate() {
            if index % BATCH_SIZE == 0 {
                self.checkpoint()?;
            }
            let result = sqlx::query(&sql)
                .bind(version_id)
                .bind(&info.publisher_name)
                .bind(&info.publisher_url)
                .bind(&info.lang)
                .bind(&info.start_date)
                .bind(&info.end_date)
                .bind(&info.version)
                .execute(&mut **tx)
                .await?;
            if result.rows_affected() > 0 {
                loaded += 1;
            }
        }
        report.loaded(table.file, loaded);
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

async fn insert_route(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    version_id: i64,
    route: &GtfsRoute,
) -> Result<bool, Error> {
    let result = sqlx::query(sql)
        .bind(version_id)
        .bind(&route.route_id)
        .bind(&route.agency_id)
        .bind(&route.short_name)
        .bind(&route.long_name)
        .bind(&route.description)
        .bind(route.route_type)
        .bind(&route.color)
        .bind(&route.text_color)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_trip(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    version_id: i64,
    trip: &GtfsTrip,
) -> Result<bool, Error> {
    let result = sqlx::query(sql)
        .bind(version_id)
        .bind(&trip.trip_id)
        .bind(&trip.route_id)
        .bind(&trip.service_id)
        .bind(&trip.headsign)
        .bind(trip.direction_id)
        .bind(&trip.shape_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_stop_time(
    tx: &mut Transaction<'_, Sqlite>,
    version_id: i64,
    stop_time: &GtfsStopTime,
) -> Result<(), Error> {
    sqlx::query(
        "INSERT INTO stop_times (feed_version_id, trip_id, stop_sequence, stop_id,
                                 arrival_time, departure_time)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(version_id)
    .bind(&stop_time.trip_id)
    .bind(stop_time.stop_sequence)
    .bind(&stop_time.stop_id)
    .bind(&stop_time.arrival_time)
    .bind(&stop_time.departure_time)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
