pub mod error;
pub mod gtfs;
pub mod ingest;
pub mod query;
pub mod shared;
pub mod store;

pub use error::Error;

pub mod prelude {
    pub use crate::error::Error;
    pub use crate::ingest::{
        CancelToken, IngestMode, IngestOutcome, IngestReport, Ingestor, OnConflict,
    };
    pub use crate::query::QueryEngine;
    pub use crate::shared::geo::{Coordinate, Distance};
    pub use crate::store::{FeedVersion, Store};
}
