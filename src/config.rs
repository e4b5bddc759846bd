use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicator::IndicatorParams;
use crate::market_data::yahoo::YAHOO_BASE_URL;
use crate::model::{Interval, Period};
use crate::screener::ScreenSettings;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "screener.toml";

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_log_file() -> String {
    "stock-screener.log".into()
}

fn default_base_url() -> String {
    YAHOO_BASE_URL.into()
}

fn default_period() -> String {
    "3mo".into()
}

fn default_interval() -> String {
    "1d".into()
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_std_dev() -> f64 {
    2.0
}

fn default_rsi_period() -> usize {
    14
}

fn default_tail_rows() -> usize {
    5
}

fn default_overbought() -> f64 {
    70.0
}

fn default_oversold() -> f64 {
    30.0
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Dashboard mode logs here since the terminal belongs to the UI.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_file: default_log_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            period: default_period(),
            interval: default_interval(),
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_std_dev")]
    pub bollinger_std_dev: f64,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            bollinger_period: default_bollinger_period(),
            bollinger_std_dev: default_bollinger_std_dev(),
            rsi_period: default_rsi_period(),
        }
    }
}

impl IndicatorConfig {
    pub fn params(&self) -> IndicatorParams {
        IndicatorParams {
            bollinger_period: self.bollinger_period,
            bollinger_multiplier: self.bollinger_std_dev,
            rsi_period: self.rsi_period,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    /// Rows shown in the data table.
    #[serde(default = "default_tail_rows")]
    pub tail_rows: usize,
    #[serde(default = "default_overbought")]
    pub overbought: f64,
    #[serde(default = "default_oversold")]
    pub oversold: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tail_rows: default_tail_rows(),
            overbought: default_overbought(),
            oversold: default_oversold(),
        }
    }
}

impl AppConfig {
    /// Request settings. Only valid after `validate` has accepted the config.
    pub fn screen_settings(&self) -> ScreenSettings {
        ScreenSettings {
            period: Period::from_str(&self.market_data.period).unwrap_or(Period::Month3),
            interval: Interval::from_str(&self.market_data.interval).unwrap_or(Interval::Day1),
            params: self.indicators.params(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

/// Load `path` if given, else `screener.toml` if it exists, else defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, Report<ConfigError>> {
    if let Some(path) = path {
        return load(path);
    }
    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        return load(fallback);
    }
    Ok(AppConfig::default())
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_market_data(config)?;
    validate_indicators(config)?;
    validate_display(config)?;
    Ok(())
}

fn validation(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = &config.general.log_format;
    if !VALID_LOG_FORMATS.contains(&format.as_str()) {
        return Err(validation(format!(
            "general.log_format \"{format}\" is not one of {VALID_LOG_FORMATS:?}"
        )));
    }
    Ok(())
}

fn validate_market_data(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let md = &config.market_data;
    if Period::from_str(&md.period).is_none() {
        return Err(validation(format!(
            "market_data.period: unknown period \"{}\"",
            md.period
        )));
    }
    if Interval::from_str(&md.interval).is_none() {
        return Err(validation(format!(
            "market_data.interval: unknown interval \"{}\"",
            md.interval
        )));
    }
    if md.requests_per_second == 0 {
        return Err(validation("market_data.requests_per_second must be > 0".into()));
    }
    if md.timeout_secs == 0 {
        return Err(validation("market_data.timeout_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    config
        .indicators
        .params()
        .build()
        .change_context(ConfigError::Validation {
            field: "indicators".into(),
        })?;
    Ok(())
}

fn validate_display(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let display = &config.display;
    if display.tail_rows == 0 {
        return Err(validation("display.tail_rows must be > 0".into()));
    }
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(display.overbought) || !in_range(display.oversold) {
        return Err(validation(
            "display.overbought and display.oversold must be within 0..=100".into(),
        ));
    }
    if display.overbought <= display.oversold {
        return Err(validation(format!(
            "display.overbought ({}) must be greater than display.oversold ({})",
            display.overbought, display.oversold
        )));
    }
    Ok(())
}
