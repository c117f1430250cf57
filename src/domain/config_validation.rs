//! Run configuration: INI values merged with command-line overrides and
//! validated before any market data is requested.

use std::path::PathBuf;

use crate::domain::error::DslError;
use crate::ports::config_port::ConfigPort;

pub const MARKET_DATA_SECTION: &str = "market_data";
pub const LOGGING_SECTION: &str = "logging";

pub const DEFAULT_INTERVAL: &str = "1h";
pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_DATA_DIR: &str = ".";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub data_dir: Option<PathBuf>,
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub symbol: String,
    pub interval: String,
    pub limit: usize,
}

pub fn validate_market_data_config(config: &dyn ConfigPort) -> Result<(), DslError> {
    validate_limit(config)?;
    validate_not_blank(config, "symbol")?;
    validate_not_blank(config, "interval")?;
    Ok(())
}

fn validate_limit(config: &dyn ConfigPort) -> Result<Option<usize>, DslError> {
    let invalid = |reason: String| DslError::ConfigInvalid {
        section: MARKET_DATA_SECTION.to_string(),
        key: "limit".to_string(),
        reason,
    };
    match config.get_int(MARKET_DATA_SECTION, "limit") {
        Ok(None) => Ok(None),
        Ok(Some(limit)) if limit >= 1 => Ok(Some(limit as usize)),
        Ok(Some(limit)) => Err(invalid(format!(
            "limit must be a positive integer, got {}",
            limit
        ))),
        Err(e) => Err(invalid(format!("limit must be a positive integer: {}", e))),
    }
}

fn validate_not_blank(config: &dyn ConfigPort, key: &str) -> Result<(), DslError> {
    match config.get_string(MARKET_DATA_SECTION, key) {
        Some(s) if s.trim().is_empty() => Err(DslError::ConfigInvalid {
            section: MARKET_DATA_SECTION.to_string(),
            key: key.to_string(),
            reason: format!("{} must not be empty", key),
        }),
        _ => Ok(()),
    }
}

/// Merge the optional file with the overrides. `symbol` has no default.
pub fn build_run_config(
    config: Option<&dyn ConfigPort>,
    overrides: RunOverrides,
) -> Result<RunConfig, DslError> {
    let file_limit = match config {
        Some(config) => {
            validate_not_blank(config, "symbol")?;
            validate_not_blank(config, "interval")?;
            validate_limit(config)?
        }
        None => None,
    };
    let from_file = |key: &str| config.and_then(|c| c.get_string(MARKET_DATA_SECTION, key));

    let symbol = overrides
        .symbol
        .or_else(|| from_file("symbol"))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DslError::ConfigMissing {
            section: MARKET_DATA_SECTION.to_string(),
            key: "symbol".to_string(),
        })?;

    let interval = overrides
        .interval
        .or_else(|| from_file("interval"))
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    if interval.trim().is_empty() {
        return Err(DslError::ConfigInvalid {
            section: MARKET_DATA_SECTION.to_string(),
            key: "interval".to_string(),
            reason: "interval must not be empty".to_string(),
        });
    }

    let limit = overrides.limit.or(file_limit).unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(DslError::ConfigInvalid {
            section: MARKET_DATA_SECTION.to_string(),
            key: "limit".to_string(),
            reason: "limit must be a positive integer, got 0".to_string(),
        });
    }

    let data_dir = overrides
        .data_dir
        .or_else(|| from_file("data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    Ok(RunConfig {
        data_dir,
        symbol: symbol.trim().to_string(),
        interval: interval.trim().to_string(),
        limit,
    })
}

pub fn log_level(config: Option<&dyn ConfigPort>) -> String {
    config
        .and_then(|c| c.get_string(LOGGING_SECTION, "level"))
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}
