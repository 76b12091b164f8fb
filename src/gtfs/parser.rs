use std::{collections::HashMap, io::Cursor, str::FromStr, sync::Arc};

use csv::StringRecord;

use crate::{error::Error, gtfs::schema::TableSchema};

/// Reads one CSV-shaped GTFS entry against an expected [`TableSchema`].
///
/// The header row decides actual column order; reordered and unknown columns
/// are tolerated, absent required columns fail up front. Each yielded [`Row`]
/// carries its 1-based source line so row-level errors stay attributable.
/// What to do with a failed row (abort or collect) is the caller's policy,
/// not the parser's.
pub struct TableReader {
    schema: TableSchema,
    index: Arc<HashMap<&'static str, usize>>,
    header_len: usize,
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
}

impl TableReader {
    pub fn new(bytes: Vec<u8>, schema: TableSchema) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(Cursor::new(bytes));
        let header = reader.headers()?.clone();

        let mut index = HashMap::new();
        for column in schema.columns {
            match header.iter().position(|name| name == column.name) {
                Some(position) => {
                    index.insert(column.name, position);
                }
                None if column.required => {
                    return Err(Error::MissingRequiredColumn {
                        file: schema.file.to_string(),
                        column: column.name,
                    });
                }
                None => {}
            }
        }

        Ok(Self {
            schema,
            index: Arc::new(index),
            header_len: header.len(),
            records: reader.into_records(),
        })
    }

    pub fn file(&self) -> &'static str {
        self.schema.file
    }
}

impl Iterator for TableReader {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err
                    .position()
                    .map(|position| position.line())
                    .unwrap_or_default();
                return Some(Err(Error::MalformedRow {
                    file: self.schema.file.to_string(),
                    line,
                    reason: "unreadable record".to_string(),
                }));
            }
        };
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        if record.len() != self.header_len {
            return Some(Err(Error::MalformedRow {
                file: self.schema.file.to_string(),
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    self.header_len,
                    record.len()
                ),
            }));
        }
        Some(Ok(Row {
            file: self.schema.file,
            line,
            index: self.index.clone(),
            record,
        }))
    }
}

/// One data row, addressable by schema column name. Empty values read as
/// absent, matching how GTFS producers leave optional cells blank.
#[derive(Debug, Clone)]
pub struct Row {
    file: &'static str,
    line: u64,
    index: Arc<HashMap<&'static str, usize>>,
    record: StringRecord,
}

impl Row {
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        let position = *self.index.get(column)?;
        self.record.get(position).filter(|value| !value.is_empty())
    }

    pub fn require(&self, column: &'static str) -> Result<&str, Error> {
        self.get(column).ok_or_else(|| Error::InvalidFieldValue {
            file: self.file.to_string(),
            line: self.line,
            field: column,
            value: String::new(),
        })
    }

    pub fn parse<T: FromStr>(&self, column: &'static str) -> Result<Option<T>, Error> {
        match self.get(column) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(column, value)),
        }
    }

    pub fn require_parse<T: FromStr>(&self, column: &'static str) -> Result<T, Error> {
        let value = self.require(column)?;
        value.parse().map_err(|_| self.invalid(column, value))
    }

    pub fn invalid(&self, column: &'static str, value: &str) -> Error {
        Error::InvalidFieldValue {
            file: self.file.to_string(),
            line: self.line,
            field: column,
            value: value.to_string(),
        }
    }
}
