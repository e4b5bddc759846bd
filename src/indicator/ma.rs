use error_stack::{Report, bail};

use crate::error::IndicatorError;

/// Simple Moving Average over a rolling window.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// One entry per price; `None` until the window is full.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        rolling(prices, self.period, mean)
    }
}

/// Rolling sample standard deviation (denominator `n - 1`).
pub struct StdDev {
    period: usize,
}

impl StdDev {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2 for sample standard deviation".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        rolling(prices, self.period, sample_std_dev)
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let sum_sq = values.iter().map(|&v| (v - m).powi(2)).sum::<f64>();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Apply `f` to each full trailing window, aligned to the input index.
pub(crate) fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let warm_up = period.saturating_sub(1).min(values.len());
    std::iter::repeat_n(None, warm_up)
        .chain(values.windows(period).map(|w| Some(f(w))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_known_value() {
        let values = Sma::new(3).unwrap().calculate_prices(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!((values[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((values[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_short_input_all_none() {
        let values = Sma::new(5).unwrap().calculate_prices(&[1.0; 4]);
        assert_eq!(values, vec![None; 4]);
    }

    #[test]
    fn std_dev_rejects_single_period() {
        assert!(StdDev::new(1).is_err());
        assert!(StdDev::new(0).is_err());
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        // mean 2.5, squared deviations sum 5.0, 5/3 under n-1
        let values = StdDev::new(4).unwrap().calculate_prices(&[1.0, 2.0, 3.0, 4.0]);
        let expected = (5.0_f64 / 3.0).sqrt();
        assert!((values[3].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn std_dev_flat_prices_zero() {
        let values = StdDev::new(3).unwrap().calculate_prices(&[7.0; 5]);
        assert!(values[2..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn rolling_empty_input() {
        assert!(rolling(&[], 3, mean).is_empty());
    }
}
