use std::io::{Cursor, Write};

use zip::{ZipWriter, write::SimpleFileOptions};

/// Builds a feed archive in memory from (entry name, body) pairs.
pub fn feed_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub const AGENCY: &str = "agency_id,agency_name,agency_url,agency_timezone\n\
                          A1,City Transit,https://transit.example,Europe/Stockholm\n";

pub const ROUTES: &str = "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                          R1,A1,1,Central Line,3\n";

pub const TRIPS: &str = "trip_id,route_id,service_id,trip_headsign\n\
                         T1,R1,WKDY,Northbound\n";

pub const STOPS: &str = "stop_id,stop_name,stop_lat,stop_lon\n\
                         S1,Central,59.33,18.06\n\
                         S2,North Square,59.335,18.06\n";

pub const STOP_TIMES: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                              T1,08:00:00,08:00:00,S1,1\n\
                              T1,08:05:00,08:05:00,S2,2\n";

/// The smallest feed that passes strict ingestion: the four mandatory
/// tables plus matching stop times.
pub fn minimal_feed() -> Vec<u8> {
    feed_zip(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", STOPS),
        ("stop_times.txt", STOP_TIMES),
    ])
}

pub async fn table_count(store: &depot::store::Store, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) AS n FROM {table}");
    let row = sqlx::query(&sql).fetch_one(store.pool()).await.unwrap();
    sqlx::Row::get(&row, "n")
}
