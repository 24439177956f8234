//! Series-level volume statistics reported alongside the VPPA result.

use crate::domain::bar::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStats {
    /// Simple mean of the last `ma_length` volumes.
    pub latest_volume_ma: Option<f64>,
    pub avg_volume: f64,
    pub total_volume: f64,
}

pub fn compute(bars: &[Bar], ma_length: usize) -> VolumeStats {
    let total_volume: f64 = bars.iter().map(|b| b.volume).sum();
    let avg_volume = if bars.is_empty() {
        0.0
    } else {
        total_volume / bars.len() as f64
    };

    VolumeStats {
        latest_volume_ma: latest_sma(bars, ma_length),
        avg_volume,
        total_volume,
    }
}

fn latest_sma(bars: &[Bar], length: usize) -> Option<f64> {
    if length == 0 || bars.len() < length {
        return None;
    }
    let tail = &bars[bars.len() - length..];
    Some(tail.iter().map(|b| b.volume).sum::<f64>() / length as f64)
}
