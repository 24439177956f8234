//! Pivot-to-pivot interval extraction.

use crate::domain::bar::{PivotKind, PivotPoint};
use serde::Serialize;

/// A closed bar interval between two consecutive pivots. The anchor is the
/// pivot that closes the interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRange {
    pub start_index: usize,
    pub end_index: usize,
    pub bar_count: usize,
    pub anchor_kind: PivotKind,
    pub anchor_price: f64,
}

impl PivotRange {
    pub fn new(
        start_index: usize,
        end_index: usize,
        anchor_kind: PivotKind,
        anchor_price: f64,
    ) -> Self {
        Self {
            start_index,
            end_index,
            bar_count: end_index - start_index + 1,
            anchor_kind,
            anchor_price,
        }
    }
}

/// Chain consecutive pivots into ranges. Pivot kinds are not filtered: a
/// High may follow a High. Fewer than two pivots yields no ranges.
pub fn extract_ranges(pivots: &[PivotPoint]) -> Vec<PivotRange> {
    pivots
        .windows(2)
        .map(|pair| PivotRange::new(pair[0].index, pair[1].index, pair[1].kind, pair[1].price))
        .collect()
}
