//! Bar series access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::VppaError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Which volume column a data source should feed the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeSource {
    /// Exchange-reported traded volume.
    Real,
    /// Tick count.
    Tick,
    /// Real volume, or tick volume when real volume sums to zero.
    #[default]
    Auto,
}

impl FromStr for VolumeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "real" => Ok(VolumeSource::Real),
            "tick" => Ok(VolumeSource::Tick),
            "auto" => Ok(VolumeSource::Auto),
            other => Err(format!(
                "unknown volume source '{other}' (expected real, tick or auto)"
            )),
        }
    }
}

impl fmt::Display for VolumeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolumeSource::Real => "real",
            VolumeSource::Tick => "tick",
            VolumeSource::Auto => "auto",
        };
        write!(f, "{name}")
    }
}

pub trait DataPort {
    /// Time-ascending bars for `symbol`. With `count`, only the newest
    /// `count` bars are returned.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: Option<usize>,
    ) -> Result<Vec<Bar>, VppaError>;

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, VppaError>;

    /// First bar time, last bar time and bar count, or `None` without data.
    fn get_data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, VppaError>;
}
