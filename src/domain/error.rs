//! Domain error types.

/// Top-level error type for vppa.
#[derive(Debug, thiserror::Error)]
pub enum VppaError {
    #[error("insufficient data: have {bars} bars, need at least {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid range [{start}, {end}] for a series of {len} bars")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VppaError> for std::process::ExitCode {
    fn from(err: &VppaError) -> Self {
        let code: u8 = match err {
            VppaError::Io(_) | VppaError::Report { .. } => 1,
            VppaError::ConfigParse { .. }
            | VppaError::ConfigMissing { .. }
            | VppaError::ConfigInvalid { .. } => 2,
            VppaError::Data { .. } | VppaError::NoData { .. } => 3,
            VppaError::InsufficientData { .. }
            | VppaError::InvalidRange { .. }
            | VppaError::InvalidParameter { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
