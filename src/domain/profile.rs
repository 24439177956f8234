//! Volume profile construction for one bar range.
//!
//! The range's price span is cut into `level_count` bands of equal height.
//! A bar touching a band contributes `volume * step / (high - low)` to it,
//! i.e. its volume is spread by price span, not by overlap fraction. A bar
//! touching `k` bands therefore distributes `k * volume * step / range`,
//! which equals its volume only when its range is a whole number of steps.

use crate::domain::bar::Bar;
use crate::domain::error::VppaError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileLevel {
    pub price_center: f64,
    pub volume: f64,
}

/// Price-by-volume histogram over `[start_index, end_index]`.
///
/// `price_step == 0.0` marks a flat range; it carries its whole volume in
/// level 0 and has no usable histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeProfile {
    pub price_lowest: f64,
    pub price_highest: f64,
    pub price_step: f64,
    pub levels: Vec<ProfileLevel>,
    /// Traded volume of the bars in the range.
    pub total_volume: f64,
    pub bar_count: usize,
}

impl VolumeProfile {
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.volume).collect()
    }

    pub fn price_centers(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.price_center).collect()
    }

    /// Sum of the per-level volumes.
    pub fn allocated_volume(&self) -> f64 {
        self.levels.iter().map(|l| l.volume).sum()
    }

    pub fn price_range(&self) -> f64 {
        self.price_highest - self.price_lowest
    }

    /// Lower edge of level `level`.
    pub fn level_low(&self, level: usize) -> f64 {
        self.price_lowest + level as f64 * self.price_step
    }
}

pub fn build_profile(
    bars: &[Bar],
    start_index: usize,
    end_index: usize,
    level_count: usize,
) -> Result<VolumeProfile, VppaError> {
    if start_index >= end_index || end_index >= bars.len() {
        return Err(VppaError::InvalidRange {
            start: start_index,
            end: end_index,
            len: bars.len(),
        });
    }
    if level_count == 0 {
        return Err(VppaError::InvalidParameter {
            name: "level_count".into(),
            reason: "must be at least 1".into(),
        });
    }

    let window = &bars[start_index..=end_index];
    let price_lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let price_highest = window
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let total_volume: f64 = window.iter().map(|b| b.volume).sum();

    if price_highest == price_lowest {
        let mut levels = vec![
            ProfileLevel {
                price_center: price_lowest,
                volume: 0.0,
            };
            level_count
        ];
        levels[0].volume = total_volume;
        return Ok(VolumeProfile {
            price_lowest,
            price_highest,
            price_step: 0.0,
            levels,
            total_volume,
            bar_count: window.len(),
        });
    }

    let price_step = (price_highest - price_lowest) / level_count as f64;
    let mut volumes = vec![0.0; level_count];

    for bar in window {
        let bar_range = bar.range();
        if bar_range == 0.0 {
            volumes[level_of(bar.low, price_lowest, price_step, level_count)] += bar.volume;
            continue;
        }
        let share = bar.volume * (price_step / bar_range);
        for (level, volume) in volumes.iter_mut().enumerate() {
            let (level_low, level_high) = band(price_lowest, price_step, level);
            if bar.high >= level_low && bar.low < level_high {
                *volume += share;
            }
        }
    }

    let levels = volumes
        .into_iter()
        .enumerate()
        .map(|(level, volume)| ProfileLevel {
            price_center: price_lowest + (level as f64 + 0.5) * price_step,
            volume,
        })
        .collect();

    Ok(VolumeProfile {
        price_lowest,
        price_highest,
        price_step,
        levels,
        total_volume,
        bar_count: window.len(),
    })
}

/// Lower and upper edge of `level`, computed the same way for every caller.
fn band(price_lowest: f64, price_step: f64, level: usize) -> (f64, f64) {
    let low = price_lowest + level as f64 * price_step;
    (low, low + price_step)
}

/// Band holding `price` under the same `[low, high)` test the span loop
/// uses; the top edge belongs to the last band.
fn level_of(price: f64, price_lowest: f64, price_step: f64, level_count: usize) -> usize {
    (0..level_count)
        .find(|&level| {
            let (low, high) = band(price_lowest, price_step, level);
            price >= low && price < high
        })
        .unwrap_or(level_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from(highs: &[f64], lows: &[f64], volumes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        highs
            .iter()
            .zip(lows)
            .zip(volumes)
            .enumerate()
            .map(|(i, ((&high, &low), &volume))| Bar {
                time: start + Duration::minutes(i as i64),
                open: low,
                high,
                low,
                close: high,
                volume,
            })
            .collect()
    }

    #[test]
    fn staircase_profile_extremes_and_totals() {
        let bars = bars_from(
            &[102.0, 104.0, 106.0, 108.0, 110.0],
            &[100.0, 102.0, 104.0, 106.0, 108.0],
            &[100.0; 5],
        );
        let profile = build_profile(&bars, 0, 4, 5).unwrap();

        assert_eq!(profile.price_lowest, 100.0);
        assert_eq!(profile.price_highest, 110.0);
        assert_eq!(profile.price_step, 2.0);
        assert_eq!(profile.total_volume, 500.0);
        assert_eq!(profile.bar_count, 5);
        assert_eq!(profile.level_count(), 5);
    }

    #[test]
    fn span_proportional_allocation_counts_touching_edges() {
        // Each of the first four bars closes exactly on the next band's lower
        // edge, so it touches two bands and gives a full share to each.
        let bars = bars_from(
            &[102.0, 104.0, 106.0, 108.0, 110.0],
            &[100.0, 102.0, 104.0, 106.0, 108.0],
            &[100.0; 5],
        );
        let profile = build_profile(&bars, 0, 4, 5).unwrap();

        assert_eq!(profile.volumes(), vec![100.0, 200.0, 200.0, 200.0, 200.0]);
        assert_abs_diff_eq!(profile.allocated_volume(), 900.0);
    }

    #[test]
    fn allocation_is_not_volume_conserving_for_partial_spans() {
        // One bar spanning 1.5 bands of a 2-level profile.
        let bars = bars_from(&[103.0, 104.0], &[100.0, 100.0], &[300.0, 0.0]);
        let profile = build_profile(&bars, 0, 1, 2).unwrap();

        // step = 2, first bar range = 3 -> share = 300 * 2 / 3 = 200 per band
        assert_abs_diff_eq!(profile.levels[0].volume, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(profile.levels[1].volume, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(profile.total_volume, 300.0);
    }

    #[test]
    fn price_centers_sit_mid_band() {
        let bars = bars_from(&[110.0, 105.0], &[100.0, 101.0], &[10.0, 10.0]);
        let profile = build_profile(&bars, 0, 1, 5).unwrap();
        let centers = profile.price_centers();
        assert_abs_diff_eq!(centers[0], 101.0);
        assert_abs_diff_eq!(centers[4], 109.0);
        assert_abs_diff_eq!(profile.level_low(3), 106.0);
    }

    #[test]
    fn zero_range_bar_lands_in_single_band() {
        let bars = bars_from(&[110.0, 105.0, 110.0], &[100.0, 105.0, 100.0], &[0.0, 70.0, 0.0]);
        let profile = build_profile(&bars, 0, 2, 5).unwrap();
        // 105 falls in [104, 106)
        assert_eq!(profile.volumes(), vec![0.0, 0.0, 70.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_range_bar_on_inexact_edge_agrees_with_span_bands() {
        // step = 0.1 is not exact in binary, so 1.3 sits on a band edge only
        // approximately.
        let bars = bars_from(&[2.0, 1.3, 2.0], &[1.0, 1.3, 1.0], &[0.0, 25.0, 0.0]);
        let profile = build_profile(&bars, 0, 2, 10).unwrap();

        let (level, _) = profile
            .levels
            .iter()
            .enumerate()
            .find(|(_, l)| l.volume > 0.0)
            .unwrap();
        let low = profile.level_low(level);
        assert!(1.3 >= low && 1.3 < low + profile.price_step);
        assert_abs_diff_eq!(profile.allocated_volume(), 25.0);

        // a bar spanning [1.3, 1.3 + tiny) touches exactly the same band
        let spanning = bars_from(&[2.0, 1.3 + 1e-9, 2.0], &[1.0, 1.3, 1.0], &[0.0, 25.0, 0.0]);
        let spanning = build_profile(&spanning, 0, 2, 10).unwrap();
        assert!(spanning.levels[level].volume > 0.0);
    }

    #[test]
    fn zero_range_bar_at_top_edge_uses_last_band() {
        let bars = bars_from(&[110.0, 110.0], &[100.0, 110.0], &[0.0, 40.0]);
        let profile = build_profile(&bars, 0, 1, 5).unwrap();
        assert_abs_diff_eq!(profile.levels[4].volume, 40.0);
    }

    #[test]
    fn flat_range_returns_sentinel_profile() {
        let bars = bars_from(&[100.0; 3], &[100.0; 3], &[50.0; 3]);
        let profile = build_profile(&bars, 0, 2, 5).unwrap();

        assert_eq!(profile.price_step, 0.0);
        assert_eq!(profile.total_volume, 150.0);
        assert_eq!(profile.levels[0].volume, 150.0);
        assert!(profile.levels[1..].iter().all(|l| l.volume == 0.0));
        assert_eq!(profile.level_count(), 5);
    }

    #[test]
    fn sub_range_only_reads_its_bars() {
        let bars = bars_from(
            &[200.0, 102.0, 104.0, 300.0],
            &[1.0, 100.0, 101.0, 2.0],
            &[999.0, 10.0, 20.0, 999.0],
        );
        let profile = build_profile(&bars, 1, 2, 4).unwrap();
        assert_eq!(profile.price_lowest, 100.0);
        assert_eq!(profile.price_highest, 104.0);
        assert_eq!(profile.total_volume, 30.0);
        assert_eq!(profile.bar_count, 2);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let bars = bars_from(&[105.0, 110.0, 115.0], &[95.0, 100.0, 105.0], &[100.0; 3]);
        for (start, end) in [(2, 1), (1, 1), (0, 3)] {
            assert!(matches!(
                build_profile(&bars, start, end, 5),
                Err(VppaError::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let bars = bars_from(
            &[101.3, 102.7, 101.9, 103.4, 102.2],
            &[99.8, 100.9, 100.4, 101.7, 100.1],
            &[120.0, 95.0, 143.0, 88.0, 101.0],
        );
        let a = build_profile(&bars, 0, 4, 7).unwrap();
        let b = build_profile(&bars, 0, 4, 7).unwrap();
        assert_eq!(a, b);
    }
}
