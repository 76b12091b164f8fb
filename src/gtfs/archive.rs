use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::Error;

/// Tables that must be present for an archive to be ingestible at all.
pub const REQUIRED_TABLES: [&str; 4] = ["agency.txt", "stops.txt", "routes.txt", "trips.txt"];

/// A GTFS feed package. Entries are decompressed one at a time on lookup,
/// never all at once, so large feeds do not need to be resident in memory
/// beyond the archive bytes themselves.
pub struct FeedArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl FeedArchive {
    pub fn open(bytes: Vec<u8>) -> Result<Self, Error> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Decompressed bytes of a named entry, or `EntryMissing`.
    pub fn entry(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let index = self
            .archive
            .index_for_name(name)
            .ok_or_else(|| Error::EntryMissing(name.to_string()))?;
        let mut file = self.archive.by_index(index)?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Verifies the mandatory table set before any row is parsed, so a
    /// truncated archive aborts ingestion instead of partially loading.
    pub fn require_tables(&self) -> Result<(), Error> {
        for name in REQUIRED_TABLES {
            if !self.contains(name) {
                return Err(Error::EntryMissing(name.to_string()));
            }
        }
        Ok(())
    }
}
