//! Configuration validation.
//!
//! Validates the `[data]`, `[vppa]` and `[output]` sections before any bars
//! are loaded. Keys that are present but unparsable are rejected rather than
//! silently replaced by defaults.

use crate::domain::error::VppaError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::VolumeSource;
use std::str::FromStr;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), VppaError> {
    validate_data_config(config)?;
    validate_vppa_config(config)?;
    validate_output_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), VppaError> {
    if let Some(symbols) = present(config, "data", "symbols") {
        parse_symbols(&symbols).map_err(|e| invalid("data", "symbols", e.to_string()))?;
    }
    if let Some(count) = parse_present::<i64>(config, "data", "count")? {
        if count < 1 {
            return Err(invalid("data", "count", "count must be at least 1"));
        }
    }
    if let Some(source) = present(config, "data", "volume_source") {
        source
            .parse::<VolumeSource>()
            .map_err(|reason| invalid("data", "volume_source", reason))?;
    }
    if let Some(timeframe) = config.get_string("data", "timeframe") {
        if timeframe.trim().is_empty() {
            return Err(invalid("data", "timeframe", "timeframe must not be empty"));
        }
    }
    Ok(())
}

pub fn validate_vppa_config(config: &dyn ConfigPort) -> Result<(), VppaError> {
    if let Some(length) = parse_present::<i64>(config, "vppa", "pivot_length")? {
        if length < 1 {
            return Err(invalid("vppa", "pivot_length", "pivot_length must be at least 1"));
        }
    }
    if let Some(levels) = parse_present::<i64>(config, "vppa", "price_levels")? {
        if levels < 1 {
            return Err(invalid("vppa", "price_levels", "price_levels must be at least 1"));
        }
    }
    if let Some(pct) = parse_present::<f64>(config, "vppa", "value_area_pct")? {
        if !(pct > 0.0 && pct <= 1.0) {
            return Err(invalid(
                "vppa",
                "value_area_pct",
                "value_area_pct must be in (0, 1]",
            ));
        }
    }
    if let Some(ma) = parse_present::<i64>(config, "vppa", "volume_ma_length")? {
        if ma < 0 {
            return Err(invalid(
                "vppa",
                "volume_ma_length",
                "volume_ma_length must be non-negative",
            ));
        }
    }
    validate_bool(config, "vppa", "include_developing")
}

pub fn validate_output_config(config: &dyn ConfigPort) -> Result<(), VppaError> {
    validate_bool(config, "output", "pretty")
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_present<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, VppaError> {
    match present(config, section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a valid number"))),
    }
}

fn validate_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), VppaError> {
    match present(config, section, key) {
        None => Ok(()),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" | "false" | "no" | "0" => Ok(()),
            _ => Err(invalid(section, key, format!("'{raw}' is not a boolean"))),
        },
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> VppaError {
    VppaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
