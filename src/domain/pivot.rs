//! Pivot detection.
//!
//! A bar at index `i` is a pivot high when its high is strictly greater than
//! every high in the `length` bars on each side of it, and a pivot low when
//! its low is strictly lower than every low on each side. The last `length`
//! bars can never be confirmed because their right window is incomplete.

use crate::domain::bar::{Bar, PivotKind, PivotPoint};
use crate::domain::error::VppaError;

/// Minimum number of bars needed to confirm any pivot with the given window.
pub fn min_bars(length: usize) -> usize {
    2 * length + 1
}

/// Find all confirmed pivots, index-ascending.
///
/// When a single bar passes both tests it is emitted once, as a High pivot,
/// so no two pivots ever share an index.
pub fn find_pivots(bars: &[Bar], length: usize) -> Result<Vec<PivotPoint>, VppaError> {
    if length == 0 {
        return Err(VppaError::InvalidParameter {
            name: "window_length".into(),
            reason: "must be at least 1".into(),
        });
    }
    let minimum = min_bars(length);
    if bars.len() < minimum {
        return Err(VppaError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    let mut pivots = Vec::new();
    for i in length..bars.len() - length {
        let left = &bars[i - length..i];
        let right = &bars[i + 1..=i + length];
        let bar = &bars[i];

        if bar.high > max_high(left) && bar.high > max_high(right) {
            pivots.push(PivotPoint {
                index: i,
                kind: PivotKind::High,
                price: bar.high,
                time: bar.time,
            });
        } else if bar.low < min_low(left) && bar.low < min_low(right) {
            pivots.push(PivotPoint {
                index: i,
                kind: PivotKind::Low,
                price: bar.low,
                time: bar.time,
            });
        }
    }

    tracing::debug!(
        bars = bars.len(),
        length,
        pivots = pivots.len(),
        "pivot detection complete"
    );
    Ok(pivots)
}

fn max_high(window: &[Bar]) -> f64 {
    window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max)
}

fn min_low(window: &[Bar]) -> f64 {
    window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&high, &low))| Bar {
                time: start + Duration::hours(i as i64),
                open: low,
                high,
                low,
                close: high,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn detects_pivot_high_at_peak() {
        let mut highs = vec![1.0; 8];
        highs.extend([2.0, 3.0, 10.0, 3.0, 2.0]);
        highs.extend(vec![1.0; 8]);
        let lows: Vec<f64> = highs.iter().map(|h| h - 0.5).collect();

        let pivots = find_pivots(&bars_from(&highs, &lows), 3).unwrap();
        let high = pivots
            .iter()
            .find(|p| p.kind == PivotKind::High)
            .expect("pivot high");
        assert_eq!(high.index, 10);
        assert_eq!(high.price, 10.0);
    }

    #[test]
    fn detects_pivot_low_at_trough() {
        let mut lows = vec![10.0; 8];
        lows.extend([9.0, 8.0, 1.0, 8.0, 9.0]);
        lows.extend(vec![10.0; 8]);
        let highs: Vec<f64> = lows.iter().map(|l| l + 0.5).collect();

        let pivots = find_pivots(&bars_from(&highs, &lows), 3).unwrap();
        let low = pivots
            .iter()
            .find(|p| p.kind == PivotKind::Low)
            .expect("pivot low");
        assert_eq!(low.index, 10);
        assert_eq!(low.price, 1.0);
    }

    #[test]
    fn zigzag_yields_alternating_pivots() {
        let highs = [
            1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 5.0, 4.0, 3.0,
            2.0, 1.0,
        ];
        let lows: Vec<f64> = highs.iter().map(|h| h - 0.5).collect();
        let pivots = find_pivots(&bars_from(&highs, &lows), 3).unwrap();

        let summary: Vec<(usize, PivotKind)> = pivots.iter().map(|p| (p.index, p.kind)).collect();
        assert_eq!(
            summary,
            vec![
                (4, PivotKind::High),
                (8, PivotKind::Low),
                (13, PivotKind::High)
            ]
        );
    }

    #[test]
    fn equal_neighbour_blocks_pivot() {
        // Two equal peaks: neither is strictly greater than the other.
        let highs = [1.0, 2.0, 5.0, 5.0, 2.0, 1.0, 0.5];
        let lows: Vec<f64> = highs.iter().map(|h| h - 0.1).collect();
        let pivots = find_pivots(&bars_from(&highs, &lows), 2).unwrap();
        assert!(pivots.iter().all(|p| p.kind != PivotKind::High));
    }

    #[test]
    fn outside_bar_is_reported_once_as_high() {
        // Bar 2 has both the highest high and the lowest low.
        let highs = [5.0, 5.0, 9.0, 5.0, 5.0];
        let lows = [4.0, 4.0, 1.0, 4.0, 4.0];
        let pivots = find_pivots(&bars_from(&highs, &lows), 2).unwrap();
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].index, 2);
        assert_eq!(pivots[0].kind, PivotKind::High);
        assert_eq!(pivots[0].price, 9.0);
    }

    #[test]
    fn edges_are_never_pivots() {
        // Extremes at the first and last bars must be ignored.
        let highs = [9.0, 2.0, 3.0, 2.0, 9.0];
        let lows = [0.0, 1.0, 2.0, 1.0, 0.0];
        let pivots = find_pivots(&bars_from(&highs, &lows), 1).unwrap();
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].index, 2);
    }

    #[test]
    fn insufficient_data_is_an_error() {
        let bars = bars_from(&[1.0, 2.0, 3.0], &[0.5, 1.5, 2.5]);
        let err = find_pivots(&bars, 20).unwrap_err();
        assert!(matches!(
            err,
            VppaError::InsufficientData {
                bars: 3,
                minimum: 41
            }
        ));
    }

    #[test]
    fn exactly_minimum_bars_is_accepted() {
        let bars = bars_from(&[1.0, 3.0, 1.0], &[0.5, 2.5, 0.5]);
        let pivots = find_pivots(&bars, 1).unwrap();
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].index, 1);
    }

    #[test]
    fn zero_length_is_rejected() {
        let bars = bars_from(&[1.0, 3.0, 1.0], &[0.5, 2.5, 0.5]);
        assert!(matches!(
            find_pivots(&bars, 0),
            Err(VppaError::InvalidParameter { .. })
        ));
    }
}
