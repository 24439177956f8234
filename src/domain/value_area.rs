//! Point of control and value area.
//!
//! The value area grows outward from the POC one level at a time, always
//! toward the neighbour with more volume (upward on ties), until it holds
//! `target_pct` of the histogram volume. Expansion also stops when both
//! cursors sit on the profile edges or both neighbours are empty.

use crate::domain::error::VppaError;
use crate::domain::profile::VolumeProfile;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueArea {
    pub poc_level: usize,
    pub poc_price: f64,
    pub poc_volume: f64,
    /// POC volume as a percentage of `total_volume`.
    pub poc_volume_pct: f64,
    pub vah: f64,
    pub val: f64,
    pub lower_level: usize,
    pub upper_level: usize,
    pub value_area_volume: f64,
    /// Value-area volume as a percentage of `total_volume`.
    pub value_area_pct: f64,
    /// Histogram volume the area was measured against.
    pub total_volume: f64,
}

impl ValueArea {
    pub fn width(&self) -> f64 {
        self.vah - self.val
    }
}

pub fn validate_target_pct(target_pct: f64) -> Result<(), VppaError> {
    if target_pct > 0.0 && target_pct <= 1.0 {
        Ok(())
    } else {
        Err(VppaError::InvalidParameter {
            name: "target_pct".into(),
            reason: format!("{target_pct} is outside (0, 1]"),
        })
    }
}

pub fn resolve_value_area(
    profile: &VolumeProfile,
    target_pct: f64,
) -> Result<ValueArea, VppaError> {
    validate_target_pct(target_pct)?;
    let volumes = profile.volumes();
    if volumes.is_empty() {
        return Err(VppaError::InvalidParameter {
            name: "level_count".into(),
            reason: "profile has no levels".into(),
        });
    }

    let poc_level = argmax(&volumes);
    let poc_volume = volumes[poc_level];
    let poc_price = profile.levels[poc_level].price_center;
    let total_volume: f64 = volumes.iter().sum();

    if total_volume == 0.0 {
        return Ok(ValueArea {
            poc_level,
            poc_price,
            poc_volume,
            poc_volume_pct: 0.0,
            vah: profile.level_low(poc_level + 1),
            val: profile.level_low(poc_level),
            lower_level: poc_level,
            upper_level: poc_level,
            value_area_volume: 0.0,
            value_area_pct: 0.0,
            total_volume,
        });
    }

    let target_volume = total_volume * target_pct;
    let last = volumes.len() - 1;
    let mut value_area_volume = poc_volume;
    let mut lower = poc_level;
    let mut upper = poc_level;

    while value_area_volume < target_volume {
        let lower_exhausted = lower == 0;
        let upper_exhausted = upper == last;
        let below = if lower_exhausted { 0.0 } else { volumes[lower - 1] };
        let above = if upper_exhausted { 0.0 } else { volumes[upper + 1] };

        if (lower_exhausted && upper_exhausted) || (below == 0.0 && above == 0.0) {
            break;
        }

        if !upper_exhausted && (above >= below || lower_exhausted) {
            upper += 1;
            value_area_volume += above;
        } else {
            lower -= 1;
            value_area_volume += below;
        }
    }

    Ok(ValueArea {
        poc_level,
        poc_price,
        poc_volume,
        poc_volume_pct: poc_volume / total_volume * 100.0,
        vah: profile.level_low(upper + 1),
        val: profile.level_low(lower),
        lower_level: lower,
        upper_level: upper,
        value_area_volume,
        value_area_pct: value_area_volume / total_volume * 100.0,
        total_volume,
    })
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
