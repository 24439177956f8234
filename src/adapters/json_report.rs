//! JSON report adapter.
//!
//! Flattens a [`VppaResult`] into an acyclic document of plain numbers,
//! strings and arrays. Non-finite floats are written as `null`.

use crate::domain::bar::{PivotKind, PivotPoint};
use crate::domain::error::VppaError;
use crate::domain::volume_stats;
use crate::domain::vppa::RangeAnalysis;
use crate::ports::report_port::{ReportContext, ReportPort};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timeframe: String,
    pub analysis_time: String,
    pub parameters: ReportParameters,
    pub data_range: DataRange,
    pub summary: Summary,
    pub pivot_points: Vec<PivotEntry>,
    pub pivot_ranges: Vec<RangeEntry>,
    pub developing_range: Option<RangeEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReportParameters {
    pub count: usize,
    pub pivot_length: usize,
    pub price_levels: usize,
    pub value_area_pct: f64,
    pub volume_ma_length: usize,
}

#[derive(Debug, Serialize)]
pub struct DataRange {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_bars: usize,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_pivot_points: usize,
    pub pivot_highs: usize,
    pub pivot_lows: usize,
    pub total_ranges: usize,
    pub avg_range_bars: Option<f64>,
    pub has_developing_range: bool,
    pub volume_stats: VolumeStatsEntry,
}

#[derive(Debug, Serialize)]
pub struct VolumeStatsEntry {
    pub latest_volume_ma: Option<f64>,
    pub avg_volume: Option<f64>,
    pub total_volume: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PivotEntry {
    pub index: usize,
    pub time: String,
    pub kind: PivotKind,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RangeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_id: Option<usize>,
    pub start_idx: usize,
    pub end_idx: usize,
    pub start_time: String,
    pub end_time: String,
    pub bar_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_type: Option<PivotKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_price: Option<f64>,
    pub is_developing: bool,
    pub price_info: PriceInfo,
    pub poc: PocEntry,
    pub value_area: ValueAreaEntry,
    pub volume_info: VolumeInfo,
    pub volume_profile: ProfileEntry,
}

#[derive(Debug, Serialize)]
pub struct PriceInfo {
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    pub range: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PocEntry {
    pub level: usize,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub volume_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ValueAreaEntry {
    pub vah: Option<f64>,
    pub val: Option<f64>,
    pub width: Option<f64>,
    pub volume: Option<f64>,
    pub pct: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct VolumeInfo {
    pub total: Option<f64>,
    pub avg_per_bar: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProfileEntry {
    pub levels: usize,
    pub price_centers: Vec<Option<f64>>,
    pub volumes: Vec<Option<f64>>,
}

pub struct JsonReportAdapter {
    pretty: bool,
    analysis_time: DateTime<Utc>,
}

impl JsonReportAdapter {
    /// Stamps every report with the current UTC time.
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            analysis_time: Utc::now(),
        }
    }

    pub fn with_analysis_time(mut self, analysis_time: DateTime<Utc>) -> Self {
        self.analysis_time = analysis_time;
        self
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String, VppaError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| VppaError::Report {
            reason: format!("failed to serialise report: {e}"),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn render(&self, contexts: &[ReportContext<'_>]) -> Result<String, VppaError> {
        let reports: Vec<AnalysisReport> = contexts
            .iter()
            .map(|ctx| build_report(ctx, self.analysis_time))
            .collect();
        match reports.as_slice() {
            [single] => self.to_json(single),
            many => self.to_json(&many),
        }
    }
}

pub fn build_report(ctx: &ReportContext<'_>, analysis_time: DateTime<Utc>) -> AnalysisReport {
    let result = ctx.result;
    let meta = &result.metadata;
    let stats = volume_stats::compute(ctx.bars, ctx.volume_ma_length);

    AnalysisReport {
        symbol: ctx.symbol.to_string(),
        timeframe: ctx.timeframe.to_string(),
        analysis_time: timestamp(analysis_time),
        parameters: ReportParameters {
            count: ctx.bars.len(),
            pivot_length: meta.window_length,
            price_levels: meta.level_count,
            value_area_pct: meta.target_pct,
            volume_ma_length: ctx.volume_ma_length,
        },
        data_range: DataRange {
            start_time: ctx.bars.first().map(|b| timestamp(b.time)),
            end_time: ctx.bars.last().map(|b| timestamp(b.time)),
            total_bars: ctx.bars.len(),
        },
        summary: Summary {
            total_pivot_points: meta.total_pivot_points,
            pivot_highs: meta.pivot_highs,
            pivot_lows: meta.pivot_lows,
            total_ranges: meta.total_ranges,
            avg_range_bars: finite(meta.avg_range_bars),
            has_developing_range: result.has_developing_range(),
            volume_stats: VolumeStatsEntry {
                latest_volume_ma: stats.latest_volume_ma.and_then(finite),
                avg_volume: finite(stats.avg_volume),
                total_volume: finite(stats.total_volume),
            },
        },
        pivot_points: result.pivots.iter().map(pivot_entry).collect(),
        pivot_ranges: result
            .ranges
            .iter()
            .enumerate()
            .map(|(id, r)| range_entry(r, Some(id)))
            .collect(),
        developing_range: result.developing.as_ref().map(|r| range_entry(r, None)),
    }
}

fn pivot_entry(p: &PivotPoint) -> PivotEntry {
    PivotEntry {
        index: p.index,
        time: timestamp(p.time),
        kind: p.kind,
        price: finite(p.price),
    }
}

fn range_entry(r: &RangeAnalysis, range_id: Option<usize>) -> RangeEntry {
    let profile = &r.profile;
    let va = &r.value_area;
    let confirmed = !r.is_developing;

    RangeEntry {
        range_id,
        start_idx: r.range.start_index,
        end_idx: r.range.end_index,
        start_time: timestamp(r.start_time),
        end_time: timestamp(r.end_time),
        bar_count: r.range.bar_count,
        pivot_type: confirmed.then_some(r.range.anchor_kind),
        pivot_price: if confirmed { finite(r.range.anchor_price) } else { None },
        is_developing: r.is_developing,
        price_info: PriceInfo {
            highest: finite(profile.price_highest),
            lowest: finite(profile.price_lowest),
            range: finite(profile.price_range()),
            step: finite(profile.price_step),
        },
        poc: PocEntry {
            level: va.poc_level,
            price: finite(va.poc_price),
            volume: finite(va.poc_volume),
            volume_pct: finite(va.poc_volume_pct),
        },
        value_area: ValueAreaEntry {
            vah: finite(va.vah),
            val: finite(va.val),
            width: finite(va.width()),
            volume: finite(va.value_area_volume),
            pct: finite(va.value_area_pct),
        },
        volume_info: VolumeInfo {
            total: finite(profile.total_volume),
            avg_per_bar: finite(r.avg_volume_per_bar),
        },
        volume_profile: ProfileEntry {
            levels: profile.level_count(),
            price_centers: profile.levels.iter().map(|l| finite(l.price_center)).collect(),
            volumes: profile.levels.iter().map(|l| finite(l.volume)).collect(),
        },
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
