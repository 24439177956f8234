//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReportAdapter;
use crate::domain::bar::Bar;
use crate::domain::config_validation::validate_config;
use crate::domain::error::VppaError;
use crate::domain::universe::parse_symbols;
use crate::domain::vppa::{compute_vppa_batch, VppaParams, VppaResult};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, VolumeSource};
use crate::ports::report_port::{ReportContext, ReportPort};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TIMEFRAME: &str = "M1";
const DEFAULT_VOLUME_MA_LENGTH: i64 = 14;

#[derive(Parser, Debug)]
#[command(name = "vppa", about = "Volume profile analysis anchored on pivot points")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run VPPA analysis for one or more symbols
    Analyze(AnalyzeArgs),
    /// Validate a configuration file and print the effective parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a symbol
    Info {
        symbol: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List symbols with data for a timeframe
    ListSymbols {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where bars come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub timeframe: Option<String>,
    /// real, tick or auto
    #[arg(long)]
    pub volume_source: Option<VolumeSource>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Symbol to analyse; overrides `[data] symbols`
    pub symbol: Option<String>,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Analyse only the newest N bars
    #[arg(long)]
    pub count: Option<usize>,
    #[arg(long)]
    pub pivot_length: Option<usize>,
    #[arg(long)]
    pub price_levels: Option<usize>,
    #[arg(long)]
    pub value_area_pct: Option<f64>,
    #[arg(long)]
    pub volume_ma_length: Option<usize>,
    /// Skip the range after the last pivot
    #[arg(long)]
    pub no_developing: bool,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub pretty: bool,
}

/// Effective settings after merging config file and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub data_dir: PathBuf,
    pub timeframe: String,
    pub volume_source: VolumeSource,
    pub count: Option<usize>,
    pub params: VppaParams,
    pub volume_ma_length: usize,
    pub pretty: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init(cli.verbose);

    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Validate { config } => run_validate(&config),
        Command::Info { symbol, source } => run_info(&symbol, &source),
        Command::ListSymbols { source } => run_list_symbols(&source),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

fn fail(err: &VppaError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn run_analyze(args: &AnalyzeArgs) -> ExitCode {
    let config = match load_config(args.source.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_settings(&config, args) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let symbols = match resolve_symbols(args.symbol.as_deref(), &config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let data_port =
        CsvAdapter::new(settings.data_dir.clone()).with_volume_source(settings.volume_source);
    let report = JsonReportAdapter::new(settings.pretty);

    run_analyze_pipeline(
        &data_port,
        &report,
        &symbols,
        &settings,
        args.output.as_deref(),
    )
}

/// Merge `[data]`, `[vppa]` and `[output]` with command-line overrides.
/// Flags win over config values, config values over defaults.
pub fn build_settings(
    config: &dyn ConfigPort,
    args: &AnalyzeArgs,
) -> Result<AnalysisSettings, VppaError> {
    let defaults = VppaParams::default();

    let params = VppaParams {
        window_length: match args.pivot_length {
            Some(v) => v,
            None => non_negative(
                config.get_int("vppa", "pivot_length", defaults.window_length as i64),
                "pivot_length",
            )?,
        },
        level_count: match args.price_levels {
            Some(v) => v,
            None => non_negative(
                config.get_int("vppa", "price_levels", defaults.level_count as i64),
                "price_levels",
            )?,
        },
        target_pct: args.value_area_pct.unwrap_or_else(|| {
            config.get_double("vppa", "value_area_pct", defaults.target_pct)
        }),
        include_developing: !args.no_developing
            && config.get_bool("vppa", "include_developing", defaults.include_developing),
    };
    params.validate()?;

    let volume_ma_length = match args.volume_ma_length {
        Some(v) => v,
        None => non_negative(
            config.get_int("vppa", "volume_ma_length", DEFAULT_VOLUME_MA_LENGTH),
            "volume_ma_length",
        )?,
    };

    let count = match args.count {
        Some(0) => {
            return Err(VppaError::InvalidParameter {
                name: "count".into(),
                reason: "must be at least 1".into(),
            });
        }
        Some(n) => Some(n),
        None => config
            .get_string("data", "count")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0),
    };

    Ok(AnalysisSettings {
        data_dir: resolve_data_dir(config, &args.source),
        timeframe: resolve_timeframe(config, &args.source),
        volume_source: resolve_volume_source(config, &args.source)?,
        count,
        params,
        volume_ma_length,
        pretty: args.pretty || config.get_bool("output", "pretty", false),
    })
}

fn non_negative(value: i64, key: &str) -> Result<usize, VppaError> {
    usize::try_from(value).map_err(|_| VppaError::ConfigInvalid {
        section: "vppa".into(),
        key: key.into(),
        reason: format!("{value} must be non-negative"),
    })
}

fn resolve_data_dir(config: &dyn ConfigPort, source: &SourceArgs) -> PathBuf {
    source.data_dir.clone().unwrap_or_else(|| {
        PathBuf::from(config.get_string_or("data", "data_dir", DEFAULT_DATA_DIR))
    })
}

fn resolve_timeframe(config: &dyn ConfigPort, source: &SourceArgs) -> String {
    source
        .timeframe
        .clone()
        .unwrap_or_else(|| config.get_string_or("data", "timeframe", DEFAULT_TIMEFRAME))
}

fn resolve_volume_source(
    config: &dyn ConfigPort,
    source: &SourceArgs,
) -> Result<VolumeSource, VppaError> {
    if let Some(v) = source.volume_source {
        return Ok(v);
    }
    config
        .get_string_or("data", "volume_source", "auto")
        .parse()
        .map_err(|reason| VppaError::ConfigInvalid {
            section: "data".into(),
            key: "volume_source".into(),
            reason,
        })
}

pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, VppaError> {
    if let Some(symbol) = symbol_override {
        return parse_symbols(symbol).map_err(|e| VppaError::InvalidParameter {
            name: "symbol".into(),
            reason: e.to_string(),
        });
    }

    match config.get_string("data", "symbols") {
        Some(list) => parse_symbols(&list).map_err(|e| VppaError::ConfigInvalid {
            section: "data".into(),
            key: "symbols".into(),
            reason: e.to_string(),
        }),
        None => Err(VppaError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        }),
    }
}

pub fn run_analyze_pipeline(
    data_port: &dyn DataPort,
    report: &dyn ReportPort,
    symbols: &[String],
    settings: &AnalysisSettings,
    output_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load bars
    let mut series: Vec<(String, Vec<Bar>)> = Vec::with_capacity(symbols.len());
    let mut first_error: Option<VppaError> = None;

    for symbol in symbols {
        match data_port.fetch_bars(symbol, &settings.timeframe, settings.count) {
            Ok(bars) if bars.is_empty() => {
                eprintln!("warning: skipping {symbol} (no bars)");
                tracing::warn!(symbol = %symbol, "skipping symbol: no bars");
                first_error = first_error.or(Some(VppaError::NoData {
                    symbol: symbol.clone(),
                    timeframe: settings.timeframe.clone(),
                }));
            }
            Ok(bars) => {
                eprintln!(
                    "Loaded {} bars for {} ({})",
                    bars.len(),
                    symbol,
                    settings.timeframe
                );
                series.push((symbol.clone(), bars));
            }
            Err(e) => {
                eprintln!("warning: skipping {symbol} ({e})");
                tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
                first_error = first_error.or(Some(e));
            }
        }
    }

    if series.is_empty() {
        return match first_error {
            Some(e) => fail(&e),
            None => {
                eprintln!("error: no symbols to analyse");
                ExitCode::from(2)
            }
        };
    }

    // Stage 2: Run the engine, one series per worker
    let p = &settings.params;
    eprintln!(
        "Running VPPA: {} symbol(s), pivot_length={}, price_levels={}, value_area_pct={}",
        series.len(),
        p.window_length,
        p.level_count,
        p.target_pct,
    );
    let results = compute_vppa_batch(&series, p);

    let mut analysed: Vec<(&str, &[Bar], VppaResult)> = Vec::with_capacity(results.len());
    for ((symbol, bars), (_, result)) in series.iter().zip(results) {
        match result {
            Ok(r) => analysed.push((symbol.as_str(), bars.as_slice(), r)),
            Err(e) => {
                eprintln!("warning: {symbol}: {e}");
                tracing::warn!(symbol = %symbol, error = %e, "skipping symbol");
                first_error = first_error.or(Some(e));
            }
        }
    }

    if analysed.is_empty() {
        return match first_error {
            Some(e) => fail(&e),
            None => ExitCode::from(5),
        };
    }

    // Stage 3: Console summary
    for (symbol, _, result) in &analysed {
        print_summary(symbol, result);
    }

    // Stage 4: Report
    let contexts: Vec<ReportContext<'_>> = analysed
        .iter()
        .map(|(symbol, bars, result)| ReportContext {
            symbol,
            timeframe: &settings.timeframe,
            volume_ma_length: settings.volume_ma_length,
            bars,
            result,
        })
        .collect();

    match report.write(&contexts, output_path) {
        Ok(()) => {
            if let Some(path) = output_path {
                eprintln!("\nReport written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(symbol: &str, result: &VppaResult) {
    let meta = &result.metadata;
    eprintln!("\n=== {symbol} ===");
    eprintln!("Bars:             {}", meta.total_bars);
    eprintln!(
        "Pivots:           {} ({} high, {} low)",
        meta.total_pivot_points, meta.pivot_highs, meta.pivot_lows
    );
    eprintln!("Ranges:           {}", meta.total_ranges);
    eprintln!("Avg range bars:   {:.1}", meta.avg_range_bars);

    if let Some(latest) = result.ranges.last() {
        let va = &latest.value_area;
        eprintln!(
            "Last range:       POC {:.5}, VA {:.5} - {:.5}",
            va.poc_price, va.val, va.vah
        );
    }
    match &result.developing {
        Some(dev) => {
            let va = &dev.value_area;
            eprintln!(
                "Developing:       {} bars, POC {:.5}, VA {:.5} - {:.5}",
                dev.range.bar_count, va.poc_price, va.val, va.vah
            );
        }
        None => eprintln!("Developing:       none"),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_settings(&config, &AnalyzeArgs::default()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let symbols = resolve_symbols(None, &config).unwrap_or_default();

    eprintln!("Config validated successfully");
    eprintln!("\n[data]");
    eprintln!("  data_dir:           {}", settings.data_dir.display());
    eprintln!("  timeframe:          {}", settings.timeframe);
    eprintln!("  volume_source:      {}", settings.volume_source);
    match settings.count {
        Some(n) => eprintln!("  count:              {n}"),
        None => eprintln!("  count:              all"),
    }
    if symbols.is_empty() {
        eprintln!("  symbols:            (none; pass SYMBOL to analyze)");
    } else {
        eprintln!("  symbols:            {}", symbols.join(", "));
    }
    eprintln!("\n[vppa]");
    eprintln!("  pivot_length:       {}", settings.params.window_length);
    eprintln!("  price_levels:       {}", settings.params.level_count);
    eprintln!("  value_area_pct:     {}", settings.params.target_pct);
    eprintln!("  include_developing: {}", settings.params.include_developing);
    eprintln!("  volume_ma_length:   {}", settings.volume_ma_length);
    eprintln!("  minimum bars:       {}", settings.params.min_bars());
    ExitCode::SUCCESS
}

fn open_source(source: &SourceArgs) -> Result<(CsvAdapter, String), ExitCode> {
    let config = load_config(source.config.as_deref())?;
    let volume_source = resolve_volume_source(&config, source).map_err(|e| fail(&e))?;
    let adapter =
        CsvAdapter::new(resolve_data_dir(&config, source)).with_volume_source(volume_source);
    Ok((adapter, resolve_timeframe(&config, source)))
}

fn run_info(symbol: &str, source: &SourceArgs) -> ExitCode {
    let (adapter, timeframe) = match open_source(source) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let symbol = symbol.trim().to_uppercase();

    match adapter.get_data_range(&symbol, &timeframe) {
        Ok(Some((first, last, count))) => {
            println!("{symbol} {timeframe}: {count} bars, {first} to {last}");
            ExitCode::SUCCESS
        }
        Ok(None) => fail(&VppaError::NoData {
            symbol,
            timeframe,
        }),
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(source: &SourceArgs) -> ExitCode {
    let (adapter, timeframe) = match open_source(source) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let symbols = match adapter.list_symbols(&timeframe) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for timeframe {timeframe}");
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
