#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use vppa::domain::bar::Bar;
use vppa::domain::error::VppaError;
use vppa::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: Option<usize>,
    ) -> Result<Vec<Bar>, VppaError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VppaError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).ok_or_else(|| VppaError::NoData {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        })?;
        let skip = count.map_or(0, |n| bars.len().saturating_sub(n));
        Ok(bars[skip..].to_vec())
    }

    fn list_symbols(&self, _timeframe: &str) -> Result<Vec<String>, VppaError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        _timeframe: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, VppaError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].time,
                bars[bars.len() - 1].time,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

pub fn make_bar(i: usize, high: f64, low: f64, volume: f64) -> Bar {
    Bar {
        time: start_time() + Duration::minutes(i as i64),
        open: low,
        high,
        low,
        close: high,
        volume,
    }
}

/// Bars from `(high, low, volume)` triples, one minute apart.
pub fn bars_from(triples: &[(f64, f64, f64)]) -> Vec<Bar> {
    triples
        .iter()
        .enumerate()
        .map(|(i, &(high, low, volume))| make_bar(i, high, low, volume))
        .collect()
}

/// Bars centred on `closes` with a two-point range and constant volume.
pub fn bars_from_closes(closes: &[f64], volume: f64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c + 1.0, c - 1.0, volume))
        .collect()
}

/// A triangle wave: rises for `leg` bars, falls for `leg` bars, `cycles` times.
/// Peaks sit at `leg, 3*leg, ...` and troughs at `2*leg, 4*leg, ...`.
pub fn zigzag(leg: usize, cycles: usize, base: f64, volume: f64) -> Vec<Bar> {
    let mut closes = Vec::with_capacity(2 * leg * cycles + 1);
    for _ in 0..cycles {
        for k in 0..leg {
            closes.push(base + k as f64);
        }
        for k in 0..leg {
            closes.push(base + (leg - k) as f64);
        }
    }
    closes.push(base);
    bars_from_closes(&closes, volume)
}
