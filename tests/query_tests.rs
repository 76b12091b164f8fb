mod common;

use common::*;
use depot::{
    Error,
    ingest::Ingestor,
    query::QueryEngine,
    shared::geo::{Coordinate, Distance},
    store::Store,
};

async fn loaded_store(entries: &[(&str, &str)]) -> (Store, i64) {
    let store = Store::open_in_memory().await.unwrap();
    let outcome = Ingestor::new(store.clone())
        .ingest(feed_zip(entries), "test.zip")
        .await
        .unwrap();
    let version = outcome.version().id;
    (store, version)
}

fn spread_stops() -> &'static str {
    // Distances from (59.33, 18.06): near ~111m, mid ~556m, far ~7.8km.
    "stop_id,stop_name,stop_lat,stop_lon\n\
     NEAR,Near Stop,59.331,18.06\n\
     MID,Mid Stop,59.335,18.06\n\
     FAR,Far Stop,59.4,18.06\n"
}

#[tokio::test]
async fn nearby_stops_ordering_and_filter_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", spread_stops()),
    ])
    .await;
    let queries = QueryEngine::new(store);
    let center = Coordinate::new(59.33, 18.06);

    let nearby = queries
        .nearby_stops(version, center, Distance::from_meters(1000.0), 10)
        .await
        .unwrap();

    // Every returned stop is inside the radius, in ascending distance, and
    // no in-radius stop is missing.
    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[0].stop.stop_id, "NEAR");
    assert_eq!(nearby[1].stop.stop_id, "MID");
    for stop in &nearby {
        assert!(stop.distance_meters <= 1000.0);
        let exact = center.distance(&stop.stop.coordinate).as_meters();
        assert!((stop.distance_meters - exact).abs() < 1e-6);
    }

    let wider = queries
        .nearby_stops(version, center, Distance::from_kilometers(10.0), 10)
        .await
        .unwrap();
    assert_eq!(wider.len(), 3);
    assert_eq!(wider[2].stop.stop_id, "FAR");
}

#[tokio::test]
async fn nearby_stops_respects_limit_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", spread_stops()),
    ])
    .await;
    let queries = QueryEngine::new(store);
    let nearby = queries
        .nearby_stops(
            version,
            Coordinate::new(59.33, 18.06),
            Distance::from_kilometers(10.0),
            1,
        )
        .await
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].stop.stop_id, "NEAR");
}

#[tokio::test]
async fn nearby_stops_across_antimeridian_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        (
            // ACROSS sits ~2.2km from the center but on the far side of the
            // ±180° meridian; AWAY is hundreds of kilometers off.
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\n\
             ACROSS,Far Side,-16.8,-179.99\n\
             AWAY,Suva,-18.14,178.44\n",
        ),
    ])
    .await;
    let queries = QueryEngine::new(store);
    let center = Coordinate::new(-16.8, 179.99);

    let nearby = queries
        .nearby_stops(version, center, Distance::from_meters(5000.0), 10)
        .await
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].stop.stop_id, "ACROSS");
    assert!(nearby[0].distance_meters < 5000.0);
}

#[tokio::test]
async fn invalid_query_bounds_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", STOPS),
    ])
    .await;
    let queries = QueryEngine::new(store);

    let bad_center = queries
        .nearby_stops(
            version,
            Coordinate::new(95.0, 18.06),
            Distance::from_meters(100.0),
            10,
        )
        .await;
    assert!(matches!(bad_center, Err(Error::InvalidQueryBounds(_))));

    let bad_radius = queries
        .nearby_stops(
            version,
            Coordinate::new(59.33, 18.06),
            Distance::from_meters(f64::NAN),
            10,
        )
        .await;
    assert!(matches!(bad_radius, Err(Error::InvalidQueryBounds(_))));

    let bad_time = queries.departures_after(version, "S1", "25:99", 5).await;
    assert!(matches!(bad_time, Err(Error::InvalidQueryBounds(_))));
}

#[tokio::test]
async fn departures_past_midnight_ordering_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        (
            "trips.txt",
            "trip_id,route_id,service_id\nT1,R1,WKDY\nT2,R1,WKDY\nT3,R1,WKDY\n",
        ),
        (
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Central,59.33,18.06\n",
        ),
        (
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,08:00:00,08:00:00,S1,1\n\
             T2,23:50:00,23:50:00,S1,1\n\
             T3,25:10:00,25:10:00,S1,1\n",
        ),
    ])
    .await;
    let queries = QueryEngine::new(store);

    let departures = queries
        .departures_after(version, "S1", "23:00:00", 10)
        .await
        .unwrap();
    let times: Vec<&str> = departures
        .iter()
        .map(|departure| departure.departure_time.as_str())
        .collect();
    // "25:10:00" is 01:10 on the next calendar day but the same service
    // day, and sorts after "23:50:00" lexically.
    assert_eq!(times, ["23:50:00", "25:10:00"]);

    let all = queries
        .departures_after(version, "S1", "00:00:00", 10)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].departure_time, "08:00:00");
    assert_eq!(all[0].route_id, "R1");
    assert_eq!(all[0].route_short_name.as_deref(), Some("1"));

    let capped = queries
        .departures_after(version, "S1", "00:00:00", 2)
        .await
        .unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn departures_threshold_is_normalized_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", STOPS),
        ("stop_times.txt", STOP_TIMES),
    ])
    .await;
    let queries = QueryEngine::new(store);
    // An unpadded threshold must compare numerically, not as "8:..".
    let departures = queries
        .departures_after(version, "S1", "7:59:00", 10)
        .await
        .unwrap();
    assert_eq!(departures.len(), 1);
    assert_eq!(departures[0].departure_time, "08:00:00");
}

#[tokio::test]
async fn shape_aggregation_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", STOPS),
        (
            // Rows arrive out of order across shapes; draw order comes from
            // the sequence numbers alone.
            "shapes.txt",
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
             B,59.40,18.10,1\n\
             A,59.34,18.07,2\n\
             A,59.33,18.06,1\n",
        ),
    ])
    .await;
    let queries = QueryEngine::new(store);

    let polylines = queries.shape_polylines(version, None).await.unwrap();
    assert_eq!(polylines.len(), 2);
    let a = polylines.iter().find(|p| p.shape_id == "A").unwrap();
    let b = polylines.iter().find(|p| p.shape_id == "B").unwrap();
    assert_eq!(
        a.points,
        vec![Coordinate::new(59.33, 18.06), Coordinate::new(59.34, 18.07)]
    );
    assert_eq!(b.points, vec![Coordinate::new(59.40, 18.10)]);

    let only_a = queries.shape_polylines(version, Some("A")).await.unwrap();
    assert_eq!(only_a.len(), 1);
    assert_eq!(only_a[0].shape_id, "A");
}

#[tokio::test]
async fn stop_lookup_test() {
    let (store, version) = loaded_store(&[
        ("agency.txt", AGENCY),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stops.txt", STOPS),
    ])
    .await;
    let queries = QueryEngine::new(store);

    let stop = queries.stop(version, "S1").await.unwrap().unwrap();
    assert_eq!(stop.name, "Central");
    assert!((stop.coordinate.latitude - 59.33).abs() < 1e-9);
    assert!((stop.coordinate.longitude - 18.06).abs() < 1e-9);
    assert!(queries.stop(version, "NOPE").await.unwrap().is_none());
}

#[tokio::test]
async fn queries_are_version_scoped_test() {
    let store = Store::open_in_memory().await.unwrap();
    let ingestor = Ingestor::new(store.clone());
    let first = ingestor
        .ingest(minimal_feed(), "first.zip")
        .await
        .unwrap()
        .version()
        .id;
    let second = ingestor
        .ingest(
            feed_zip(&[
                ("agency.txt", AGENCY),
                ("routes.txt", ROUTES),
                ("trips.txt", TRIPS),
                (
                    "stops.txt",
                    "stop_id,stop_name,stop_lat,stop_lon\nS9,Elsewhere,59.50,18.20\n",
                ),
            ]),
            "second.zip",
        )
        .await
        .unwrap()
        .version()
        .id;
    assert_ne!(first, second);

    let queries = QueryEngine::new(store);
    assert!(queries.stop(first, "S1").await.unwrap().is_some());
    assert!(queries.stop(second, "S1").await.unwrap().is_none());
    assert!(queries.stop(second, "S9").await.unwrap().is_some());
}
