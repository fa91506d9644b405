use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use common::{Candle, EngineError, Result};
use tracing::debug;

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

fn parse_field(value: &str, field: &str, line: usize) -> Result<f64> {
    value.trim().parse().map_err(|_| {
        EngineError::CsvError(format!("line {}: invalid {}: {:?}", line, field, value))
    })
}

/// Load candles from a CSV file.
///
/// Columns: time, open, high, low, close, [volume]. A header row is expected.
pub fn load_csv(path: &Path) -> Result<Vec<Candle>> {
    let file = File::open(path).map_err(|e| EngineError::DataLoadError(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut candles = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| EngineError::CsvError(e.to_string()))?;
        // Header is line 1
        let line = row + 2;
        if record.len() < 5 {
            debug!(line, fields = record.len(), "skipping short csv row");
            continue;
        }

        let volume = match record.get(5) {
            Some(v) if !v.is_empty() => parse_field(v, "volume", line)?,
            _ => 0.0,
        };

        candles.push(Candle::new(
            parse_timestamp(&record[0])?,
            parse_field(&record[1], "open", line)?,
            parse_field(&record[2], "high", line)?,
            parse_field(&record[3], "low", line)?,
            parse_field(&record[4], "close", line)?,
            volume,
        ));
    }

    debug!(path = %path.display(), candles = candles.len(), "loaded csv");
    Ok(candles)
}

/// Load candles from a JSON array of `{time, open, high, low, close, volume}`
pub fn load_json(path: &Path) -> Result<Vec<Candle>> {
    let file = File::open(path).map_err(|e| EngineError::DataLoadError(e.to_string()))?;
    let candles: Vec<Candle> = serde_json::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), candles = candles.len(), "loaded json");
    Ok(candles)
}

/// Parse a timestamp into epoch seconds.
///
/// Accepts RFC 3339, a few common date and date-time layouts (taken as UTC),
/// and raw epoch seconds.
pub fn parse_timestamp(s: &str) -> Result<i64> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt).timestamp());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&dt).timestamp());
            }
        }
    }

    s.parse::<i64>()
        .map_err(|_| EngineError::CsvError(format!("Unable to parse timestamp: {}", s)))
}
