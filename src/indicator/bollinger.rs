use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::{Sma, StdDev};
use crate::model::{Derived, Series};

/// Middle band plus the envelope at `multiplier` sample standard deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub middle: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
}

pub struct BollingerBands {
    sma: Sma,
    std_dev: StdDev,
    period: usize,
    multiplier: f64,
}

impl BollingerBands {
    /// `period` must be at least 2; a single-bar window has no sample
    /// standard deviation.
    pub fn new(period: usize, multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "multiplier must be a finite number > 0".into(),
            });
        }
        Ok(Self {
            sma: Sma::new(period)?,
            std_dev: StdDev::new(period)?,
            period,
            multiplier,
        })
    }

    /// One entry per price; `None` until `period` prices are available.
    pub fn calculate_bands(&self, prices: &[f64]) -> Vec<Option<Band>> {
        let sma = self.sma.calculate_prices(prices);
        let std_dev = self.std_dev.calculate_prices(prices);

        sma.into_iter()
            .zip(std_dev)
            .map(|(middle, std_dev)| {
                let (middle, std_dev) = (middle?, std_dev?);
                Some(Band {
                    middle,
                    std_dev,
                    upper: middle + self.multiplier * std_dev,
                    lower: middle - self.multiplier * std_dev,
                })
            })
            .collect()
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn apply(&self, series: &mut Series) {
        let bands = self.calculate_bands(&series.closes());
        for (bar, band) in series.bars.iter_mut().zip(bands) {
            let d = &mut bar.derived;
            match band {
                Some(band) => {
                    d.sma = Derived::Value(band.middle);
                    d.std_dev = Derived::Value(band.std_dev);
                    d.upper_band = Derived::Value(band.upper);
                    d.lower_band = Derived::Value(band.lower);
                }
                None => {
                    d.sma = Derived::WarmUp;
                    d.std_dev = Derived::WarmUp;
                    d.upper_band = Derived::WarmUp;
                    d.lower_band = Derived::WarmUp;
                }
            }
        }
    }
}
