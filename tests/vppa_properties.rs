//! Property tests for the VPPA engine.

mod common;

use common::*;
use proptest::prelude::*;
use vppa::domain::bar::{Bar, PivotKind};
use vppa::domain::pivot::find_pivots;
use vppa::domain::profile::build_profile;
use vppa::domain::range::extract_ranges;
use vppa::domain::value_area::resolve_value_area;

fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((1.0f64..1000.0, 0.0f64..20.0, 0.0f64..500.0), 3..max_len).prop_map(
        |rows| {
            let triples: Vec<(f64, f64, f64)> = rows
                .into_iter()
                .map(|(low, span, volume)| (low + span, low, volume))
                .collect();
            bars_from(&triples)
        },
    )
}

proptest! {
    #[test]
    fn pivots_stay_inside_confirmable_window(bars in arb_bars(80), length in 1usize..6) {
        prop_assume!(bars.len() >= 2 * length + 1);
        let pivots = find_pivots(&bars, length).unwrap();
        for p in &pivots {
            prop_assert!(p.index >= length);
            prop_assert!(p.index < bars.len() - length);
        }
        for pair in pivots.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn pivots_strictly_dominate_their_windows(bars in arb_bars(80), length in 1usize..6) {
        prop_assume!(bars.len() >= 2 * length + 1);
        for p in find_pivots(&bars, length).unwrap() {
            let i = p.index;
            let neighbours = (i - length..i).chain(i + 1..=i + length);
            match p.kind {
                PivotKind::High => {
                    prop_assert_eq!(p.price, bars[i].high);
                    for j in neighbours {
                        prop_assert!(bars[i].high > bars[j].high);
                    }
                }
                PivotKind::Low => {
                    prop_assert_eq!(p.price, bars[i].low);
                    for j in neighbours {
                        prop_assert!(bars[i].low < bars[j].low);
                    }
                }
            }
        }
    }

    #[test]
    fn ranges_chain_consecutive_pivots(bars in arb_bars(120), length in 1usize..4) {
        prop_assume!(bars.len() >= 2 * length + 1);
        let pivots = find_pivots(&bars, length).unwrap();
        let ranges = extract_ranges(&pivots);
        prop_assert_eq!(ranges.len(), pivots.len().saturating_sub(1));
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end_index, pair[1].start_index);
        }
        for r in &ranges {
            prop_assert_eq!(r.bar_count, r.end_index - r.start_index + 1);
        }
    }

    #[test]
    fn value_area_brackets_poc_and_meets_quota(
        bars in arb_bars(40),
        level_count in 1usize..30,
        target_pct in 0.05f64..=1.0,
    ) {
        let end = bars.len() - 1;
        let profile = build_profile(&bars, 0, end, level_count).unwrap();
        prop_assume!(profile.allocated_volume() > 0.0);

        let va = resolve_value_area(&profile, target_pct).unwrap();
        prop_assert!(va.val <= va.poc_price);
        prop_assert!(va.poc_price <= va.vah);
        prop_assert!(va.lower_level <= va.poc_level && va.poc_level <= va.upper_level);

        let volumes = profile.volumes();
        let below = if va.lower_level == 0 { 0.0 } else { volumes[va.lower_level - 1] };
        let above = volumes.get(va.upper_level + 1).copied().unwrap_or(0.0);
        let edges_reached = va.lower_level == 0 && va.upper_level == level_count - 1;
        let stalled = below == 0.0 && above == 0.0;
        prop_assert!(
            edges_reached
                || stalled
                || va.value_area_volume >= va.total_volume * target_pct * (1.0 - 1e-12)
        );
    }

    #[test]
    fn builder_is_deterministic(bars in arb_bars(40), level_count in 1usize..30) {
        let end = bars.len() - 1;
        let a = build_profile(&bars, 0, end, level_count).unwrap();
        let b = build_profile(&bars, 0, end, level_count).unwrap();
        prop_assert_eq!(a.total_volume, b.total_volume);
        prop_assert_eq!(a.volumes(), b.volumes());
        prop_assert_eq!(a.level_count(), level_count);
    }
}
