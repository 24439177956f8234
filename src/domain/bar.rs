//! Price bar and pivot point representation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One OHLCV observation. Bars are addressed by their index in the series;
/// `time` is carried for annotation only and never enters the math.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PivotKind {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "L")]
    Low,
}

impl fmt::Display for PivotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotKind::High => write!(f, "H"),
            PivotKind::Low => write!(f, "L"),
        }
    }
}

/// A confirmed local extremum. `price` is the bar's high for a High pivot and
/// its low for a Low pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPoint {
    pub index: usize,
    pub kind: PivotKind,
    pub price: f64,
    pub time: DateTime<Utc>,
}
