pub mod bollinger;
pub mod ma;
pub mod rsi;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::rsi::Rsi;
use crate::model::Series;

/// A technical analysis indicator that attaches derived fields to a series.
///
/// Bars must be in ascending chronological order (oldest first). The value at
/// index `i` depends only on bars `0..=i`.
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "bollinger").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one value.
    fn required_bars(&self) -> usize;

    /// Fill this indicator's fields on every bar. Bars before the warm-up
    /// point are left as `Derived::WarmUp`.
    fn apply(&self, series: &mut Series);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub rsi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            rsi_period: 14,
        }
    }
}

impl IndicatorParams {
    /// Build the indicator set, rejecting invalid parameters.
    pub fn build(&self) -> Result<Vec<Box<dyn Indicator>>, Report<IndicatorError>> {
        Ok(vec![
            Box::new(BollingerBands::new(
                self.bollinger_period,
                self.bollinger_multiplier,
            )?),
            Box::new(Rsi::new(self.rsi_period)?),
        ])
    }
}

/// Run every indicator over `series` and return it with derived fields attached.
///
/// The bars are neither reordered nor deduplicated.
pub fn compute_indicators(
    mut series: Series,
    params: &IndicatorParams,
) -> Result<Series, Report<IndicatorError>> {
    for indicator in params.build()? {
        tracing::debug!(
            indicator = indicator.name(),
            symbol = %series.symbol,
            bars = series.len(),
            required = indicator.required_bars(),
            "applying indicator"
        );
        indicator.apply(&mut series);
    }
    Ok(series)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};

    use crate::model::{Bar, Series};

    pub fn series_from_closes(closes: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + Duration::days(i as i64), c, c, c, c, 1_000))
            .collect();
        Series::new("TEST", bars)
    }
}
