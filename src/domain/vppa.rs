//! VPPA orchestration: pivots, ranges, and one profile + value area per range.
//!
//! Every call recomputes everything from the bar slice it is given. Nothing is
//! cached between calls and no state is shared, so calls on different inputs
//! may run on any number of threads.

use crate::domain::bar::{Bar, PivotKind, PivotPoint};
use crate::domain::error::VppaError;
use crate::domain::pivot::find_pivots;
use crate::domain::profile::{build_profile, VolumeProfile};
use crate::domain::range::{extract_ranges, PivotRange};
use crate::domain::value_area::{resolve_value_area, validate_target_pct, ValueArea};
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// Engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VppaParams {
    /// Bars on each side a pivot must dominate.
    pub window_length: usize,
    /// Price levels per profile.
    pub level_count: usize,
    /// Fraction of histogram volume the value area must hold, in (0, 1].
    pub target_pct: f64,
    pub include_developing: bool,
}

impl Default for VppaParams {
    fn default() -> Self {
        Self {
            window_length: 73,
            level_count: 49,
            target_pct: 0.68,
            include_developing: true,
        }
    }
}

impl VppaParams {
    pub fn validate(&self) -> Result<(), VppaError> {
        if self.window_length == 0 {
            return Err(VppaError::InvalidParameter {
                name: "window_length".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.level_count == 0 {
            return Err(VppaError::InvalidParameter {
                name: "level_count".into(),
                reason: "must be at least 1".into(),
            });
        }
        validate_target_pct(self.target_pct)
    }

    pub fn min_bars(&self) -> usize {
        crate::domain::pivot::min_bars(self.window_length)
    }
}

/// A profiled range: either a confirmed pivot-to-pivot range or the
/// developing range from the last pivot to the last bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeAnalysis {
    pub range: PivotRange,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub profile: VolumeProfile,
    pub value_area: ValueArea,
    pub avg_volume_per_bar: f64,
    pub is_developing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VppaMetadata {
    pub total_bars: usize,
    pub window_length: usize,
    pub level_count: usize,
    pub target_pct: f64,
    pub total_pivot_points: usize,
    pub pivot_highs: usize,
    pub pivot_lows: usize,
    pub total_ranges: usize,
    pub avg_range_bars: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VppaResult {
    pub metadata: VppaMetadata,
    pub pivots: Vec<PivotPoint>,
    pub ranges: Vec<RangeAnalysis>,
    pub developing: Option<RangeAnalysis>,
}

impl VppaResult {
    pub fn has_developing_range(&self) -> bool {
        self.developing.is_some()
    }
}

pub fn compute_vppa(bars: &[Bar], params: &VppaParams) -> Result<VppaResult, VppaError> {
    params.validate()?;
    let minimum = params.min_bars();
    if bars.len() < minimum {
        return Err(VppaError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    let pivots = find_pivots(bars, params.window_length)?;
    let pivot_ranges = extract_ranges(&pivots);

    let ranges = pivot_ranges
        .into_par_iter()
        .map(|range| analyze_range(bars, range, params, false))
        .collect::<Result<Vec<_>, _>>()?;

    let developing = match pivots.last() {
        Some(last) if params.include_developing && last.index < bars.len() - 1 => {
            let end = bars.len() - 1;
            let range = PivotRange::new(last.index, end, last.kind, last.price);
            Some(analyze_range(bars, range, params, true)?)
        }
        _ => None,
    };

    let pivot_highs = pivots.iter().filter(|p| p.kind == PivotKind::High).count();
    let avg_range_bars = if ranges.is_empty() {
        0.0
    } else {
        ranges.iter().map(|r| r.range.bar_count as f64).sum::<f64>() / ranges.len() as f64
    };

    let metadata = VppaMetadata {
        total_bars: bars.len(),
        window_length: params.window_length,
        level_count: params.level_count,
        target_pct: params.target_pct,
        total_pivot_points: pivots.len(),
        pivot_highs,
        pivot_lows: pivots.len() - pivot_highs,
        total_ranges: ranges.len(),
        avg_range_bars,
    };

    tracing::debug!(
        bars = metadata.total_bars,
        pivots = metadata.total_pivot_points,
        ranges = metadata.total_ranges,
        developing = developing.is_some(),
        "vppa computed"
    );

    Ok(VppaResult {
        metadata,
        pivots,
        ranges,
        developing,
    })
}

/// Run [`compute_vppa`] for several independent series in parallel.
/// Results come back in input order.
pub fn compute_vppa_batch<S>(
    series: &[(S, Vec<Bar>)],
    params: &VppaParams,
) -> Vec<(S, Result<VppaResult, VppaError>)>
where
    S: Clone + Send + Sync,
{
    series
        .par_iter()
        .map(|(key, bars)| (key.clone(), compute_vppa(bars, params)))
        .collect()
}

fn analyze_range(
    bars: &[Bar],
    range: PivotRange,
    params: &VppaParams,
    is_developing: bool,
) -> Result<RangeAnalysis, VppaError> {
    let profile = build_profile(bars, range.start_index, range.end_index, params.level_count)?;
    let value_area = resolve_value_area(&profile, params.target_pct)?;
    let avg_volume_per_bar = profile.total_volume / profile.bar_count as f64;

    Ok(RangeAnalysis {
        start_time: bars[range.start_index].time,
        end_time: bars[range.end_index].time,
        range,
        profile,
        value_area,
        avg_volume_per_bar,
        is_developing,
    })
}
