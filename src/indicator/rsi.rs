use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::{mean, rolling};
use crate::model::{Derived, Series};

/// RSI (Relative Strength Index) using simple moving averages of gains and
/// losses over the last `period` price changes.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// One entry per price. The first `period` entries are `WarmUp` since
    /// index 0 has no price change.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Derived> {
        if prices.is_empty() {
            return Vec::new();
        }

        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let gains: Vec<f64> = deltas.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
        let losses: Vec<f64> = deltas.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

        let avg_gains = rolling(&gains, self.period, mean);
        let avg_losses = rolling(&losses, self.period, mean);

        std::iter::once(Derived::WarmUp)
            .chain(avg_gains.into_iter().zip(avg_losses).map(|pair| match pair {
                (Some(avg_gain), Some(avg_loss)) => rsi_value(avg_gain, avg_loss),
                _ => Derived::WarmUp,
            }))
            .collect()
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn apply(&self, series: &mut Series) {
        let values = self.calculate_prices(&series.closes());
        for (bar, rsi) in series.bars.iter_mut().zip(values) {
            bar.derived.rsi = rsi;
        }
    }
}

/// No losses in the window saturates at 100; a window with neither gains nor
/// losses has no RSI.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> Derived {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return Derived::Undefined;
        }
        return Derived::Value(100.0);
    }
    let rs = avg_gain / avg_loss;
    Derived::Value(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::series_from_closes;

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_short_series_all_warm_up() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate_prices(&[1.0; 14]);
        assert_eq!(values.len(), 14);
        assert!(values.iter().all(|v| v.is_warm_up()));
    }

    #[test]
    fn rsi_empty_and_single_price() {
        let rsi = Rsi::new(3).unwrap();
        assert!(rsi.calculate_prices(&[]).is_empty());
        assert_eq!(rsi.calculate_prices(&[5.0]), vec![Derived::WarmUp]);
    }

    #[test]
    fn rsi_first_value_at_period_index() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate_prices(&[1.0, 2.0, 1.0, 2.0, 3.0]);
        assert!(values[..3].iter().all(|v| v.is_warm_up()));
        assert!(values[3].value().is_some());
        assert!(values[4].value().is_some());
    }

    #[test]
    fn rsi_strictly_increasing_saturates() {
        let rsi = Rsi::new(14).unwrap();
        let prices: Vec<f64> = (100..120).map(f64::from).collect();
        let values = rsi.calculate_prices(&prices);
        for v in &values[14..] {
            assert_eq!(*v, Derived::Value(100.0));
        }
    }

    #[test]
    fn rsi_constant_prices_undefined() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate_prices(&[100.0; 20]);
        assert!(values[..14].iter().all(|v| v.is_warm_up()));
        assert!(values[14..].iter().all(|v| *v == Derived::Undefined));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate_prices(&[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(values[3], Derived::Value(0.0));
    }

    #[test]
    fn rsi_known_value() {
        // deltas +2, -1, +1: avg_gain 1, avg_loss 1/3, rs 3 -> 75
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate_prices(&[10.0, 12.0, 11.0, 12.0]);
        let v = values[3].value().unwrap();
        assert!((v - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_window_drops_old_changes() {
        // window of 2 changes: at index 3 only -1, -1 remain
        let rsi = Rsi::new(2).unwrap();
        let values = rsi.calculate_prices(&[1.0, 5.0, 4.0, 3.0]);
        assert_eq!(values[3], Derived::Value(0.0));
    }

    #[test]
    fn rsi_apply_sets_series_field() {
        let rsi = Rsi::new(2).unwrap();
        let mut series = series_from_closes(&[1.0, 2.0, 3.0]);
        rsi.apply(&mut series);
        assert!(series.bars[1].derived.rsi.is_warm_up());
        assert_eq!(series.bars[2].derived.rsi, Derived::Value(100.0));
    }
}
