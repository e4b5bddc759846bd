pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::MarketDataError;
use crate::model::{Bar, Interval, Period};

/// Source of historical OHLC bars.
///
/// Uses `BoxFuture` instead of `async fn` in trait to keep the trait
/// object-safe (`dyn MarketData`).
pub trait MarketData: Send + Sync {
    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch bars for `symbol`, oldest first with unique dates.
    ///
    /// An unknown symbol or a symbol without history yields `Ok(vec![])`.
    fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Vec<Bar>, Report<MarketDataError>>>;
}

/// Sort bars by date and keep the last row seen for any repeated date.
pub(crate) fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    // stable sort keeps provider order within a date
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        Bar::new(date, close, close, close, close, 0)
    }

    #[test]
    fn normalize_sorts_ascending() {
        let bars = normalize_bars(vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn normalize_keeps_latest_duplicate() {
        let bars = normalize_bars(vec![bar(1, 1.0), bar(2, 2.0), bar(2, 2.5)]);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 2.5);
    }
}
