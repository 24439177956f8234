//! Volume column selection, applied before bars reach the engine.
//!
//! Some instruments report no real volume at all. With [`VolumeSource::Auto`]
//! the tick count stands in when real volume sums to zero over the fetched
//! series. The choice is made once per series, never per bar.

use crate::domain::bar::Bar;
use crate::ports::data_port::VolumeSource;
use chrono::{DateTime, Utc};

/// A raw row from a data source carrying both volume columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub real_volume: f64,
    pub tick_volume: f64,
}

/// Resolve `Auto` to a concrete column for these records.
pub fn resolve(records: &[BarRecord], source: VolumeSource) -> VolumeSource {
    match source {
        VolumeSource::Auto => {
            let real: f64 = records.iter().map(|r| r.real_volume).sum();
            if real == 0.0 {
                VolumeSource::Tick
            } else {
                VolumeSource::Real
            }
        }
        concrete => concrete,
    }
}

pub fn into_bars(records: Vec<BarRecord>, source: VolumeSource) -> Vec<Bar> {
    let resolved = resolve(&records, source);
    if source == VolumeSource::Auto && resolved == VolumeSource::Tick && !records.is_empty() {
        tracing::warn!(
            bars = records.len(),
            "real volume sums to zero, using tick volume"
        );
    }

    records
        .into_iter()
        .map(|r| Bar {
            time: r.time,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: match resolved {
                VolumeSource::Tick => r.tick_volume,
                _ => r.real_volume,
            },
        })
        .collect()
}
