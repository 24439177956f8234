//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>_<TIMEFRAME>.csv` with a header row naming
//! `time,open,high,low,close,real_volume` and optionally `tick_volume`
//! (`volume` is accepted for `real_volume`).

use crate::adapters::volume_source::{self, BarRecord};
use crate::domain::bar::Bar;
use crate::domain::error::VppaError;
use crate::ports::data_port::{DataPort, VolumeSource};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    volume_source: VolumeSource,
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    real_volume: usize,
    tick_volume: Option<usize>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            volume_source: VolumeSource::default(),
        }
    }

    pub fn with_volume_source(mut self, volume_source: VolumeSource) -> Self {
        self.volume_source = volume_source;
        self
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }

    fn read_records(&self, symbol: &str, timeframe: &str) -> Result<Vec<BarRecord>, VppaError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VppaError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            },
            _ => VppaError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| VppaError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = locate_columns(headers)?;

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| VppaError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = row + 2;

            let time_str = field(&record, columns.time, "time", line)?;
            let time = parse_time(time_str).ok_or_else(|| VppaError::Data {
                reason: format!("line {line}: invalid time '{time_str}'"),
            })?;
            let high = number(&record, columns.high, "high", line)?;
            let low = number(&record, columns.low, "low", line)?;
            if high < low {
                return Err(VppaError::Data {
                    reason: format!("line {line}: high {high} is below low {low}"),
                });
            }

            records.push(BarRecord {
                time,
                open: number(&record, columns.open, "open", line)?,
                high,
                low,
                close: number(&record, columns.close, "close", line)?,
                real_volume: number(&record, columns.real_volume, "real_volume", line)?,
                tick_volume: match columns.tick_volume {
                    Some(idx) => number(&record, idx, "tick_volume", line)?,
                    None => 0.0,
                },
            });
        }

        records.sort_by_key(|r| r.time);
        // keep the last row for a repeated timestamp
        records.reverse();
        records.dedup_by_key(|r| r.time);
        records.reverse();
        Ok(records)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: Option<usize>,
    ) -> Result<Vec<Bar>, VppaError> {
        let mut records = self.read_records(symbol, timeframe)?;
        if let Some(n) = count {
            if records.len() > n {
                let excess = records.len() - n;
                records.drain(..excess);
            }
        }
        tracing::info!(
            symbol,
            timeframe,
            bars = records.len(),
            source = %self.volume_source,
            "loaded bars"
        );
        Ok(volume_source::into_bars(records, self.volume_source))
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, VppaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| VppaError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", timeframe);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| VppaError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, VppaError> {
        let records = match self.read_records(symbol, timeframe) {
            Ok(r) => r,
            Err(VppaError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (records.first(), records.last()) {
            (Some(first), Some(last)) => Ok(Some((first.time, last.time, records.len()))),
            _ => Ok(None),
        }
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, VppaError> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| VppaError::Data {
            reason: format!("missing {} column", names[0]),
        })
    };

    Ok(Columns {
        time: require(&["time"])?,
        open: require(&["open"])?,
        high: require(&["high"])?,
        low: require(&["low"])?,
        close: require(&["close"])?,
        real_volume: require(&["real_volume", "volume"])?,
        tick_volume: find(&["tick_volume"]),
    })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, VppaError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| VppaError::Data {
            reason: format!("line {line}: missing {name} column"),
        })
}

fn number(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    line: usize,
) -> Result<f64, VppaError> {
    let raw = field(record, idx, name, line)?;
    raw.parse::<f64>().map_err(|e| VppaError::Data {
        reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
    })
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or integer Unix seconds.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
