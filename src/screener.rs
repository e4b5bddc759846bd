use tracing::{info, warn};

use crate::indicator::{IndicatorParams, compute_indicators};
use crate::market_data::MarketData;
use crate::model::{Interval, Period, Series};

/// Everything a single request needs besides the ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSettings {
    pub period: Period,
    pub interval: Interval,
    pub params: IndicatorParams,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            period: Period::Month3,
            interval: Interval::Day1,
            params: IndicatorParams::default(),
        }
    }
}

/// Result of one request, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The ticker was blank; nothing was fetched.
    AwaitingInput,
    NoData { symbol: String },
    Failed { symbol: String, reason: String },
    Ready(Series),
}

/// Trim and upper-case a ticker; `None` when nothing is left.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return None;
    }
    Some(symbol.to_uppercase())
}

/// Fetch history for `raw_ticker` and attach indicators.
///
/// Every call goes to the source again; nothing is cached between requests.
pub async fn screen(source: &dyn MarketData, raw_ticker: &str, settings: &ScreenSettings) -> Outcome {
    let Some(symbol) = normalize_symbol(raw_ticker) else {
        return Outcome::AwaitingInput;
    };

    info!(provider = source.name(), symbol = %symbol, "fetching stock data");

    let bars = match source
        .fetch_bars(&symbol, settings.period, settings.interval)
        .await
    {
        Ok(bars) => bars,
        Err(report) => {
            warn!(error = ?report, symbol = %symbol, "market data fetch failed");
            return Outcome::Failed {
                symbol,
                reason: report.current_context().to_string(),
            };
        }
    };

    if bars.is_empty() {
        info!(symbol = %symbol, "no data found for ticker");
        return Outcome::NoData { symbol };
    }

    match compute_indicators(Series::new(symbol.clone(), bars), &settings.params) {
        Ok(series) => Outcome::Ready(series),
        Err(report) => {
            warn!(error = ?report, symbol = %symbol, "indicator calculation failed");
            Outcome::Failed {
                symbol,
                reason: report.current_context().to_string(),
            }
        }
    }
}
