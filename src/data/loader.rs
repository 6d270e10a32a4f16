use crate::data::bar::{Bar, BarError};
use crate::data::series::PriceSeries;
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

//fatal input errors; any of these aborts the sweep before a combination runs
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open CSV file {path}: {source}")]
    Open {
        path: String,
        source: csv::Error,
    },
    #[error("Failed to parse CSV record at line {line}: {source}")]
    Record {
        line: usize,
        source: csv::Error,
    },
    #[error("Failed to parse timestamp '{value}' at line {line}")]
    Timestamp { line: usize, value: String },
    #[error("Bad price at line {line}: {source}")]
    Price {
        line: usize,
        source: BarError,
    },
    #[error("Duplicate timestamp {timestamp} in {path}")]
    DuplicateTimestamp {
        path: String,
        timestamp: DateTime<Utc>,
    },
    #[error("No rows in {path}")]
    Empty { path: String },
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Timestamp")]
    timestamp: String,
    open: f64,
    close: f64,
}

//parses an rfc3339 timestamp, falling back to the space-separated
//format exchange dumps commonly use
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .ok()
}

//loads a price series from a csv file with timestamp, open, close columns
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries, DataError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DataError::Open {
            path: display.clone(),
            source,
        })?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let line = index + 2;
        let record: CsvRecord = result.map_err(|source| DataError::Record { line, source })?;

        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| DataError::Timestamp {
            line,
            value: record.timestamp.clone(),
        })?;

        let bar = Bar::new(timestamp, record.open, record.close)
            .map_err(|source| DataError::Price { line, source })?;

        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(DataError::Empty { path: display });
    }

    //sort by timestamp to ensure chronological order
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    //timestamps must be unique within a series
    for pair in bars.windows(2) {
        if pair[0].timestamp == pair[1].timestamp {
            return Err(DataError::DuplicateTimestamp {
                path: display,
                timestamp: pair[0].timestamp,
            });
        }
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(display);

    Ok(PriceSeries::new(name, bars))
}
