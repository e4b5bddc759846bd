use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Lookback range requested from the market-data provider.
///
/// String representations match the config file format (e.g. `"3mo"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
}

impl Period {
    /// Parse a config-format string into a `Period`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1mo" => Some(Self::Month1),
            "3mo" => Some(Self::Month3),
            "6mo" => Some(Self::Month6),
            "1y" => Some(Self::Year1),
            "2y" => Some(Self::Year2),
            _ => None,
        }
    }

    /// Return the config-format string, which is also the Yahoo `range` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
            Self::Month6 => "6mo",
            Self::Year1 => "1y",
            Self::Year2 => "2y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bar interval. Bars are keyed by calendar date, so only daily or coarser
/// intervals are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Day1,
    Week1,
    Month1,
}

impl Interval {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Self::Day1),
            "1wk" => Some(Self::Week1),
            "1mo" => Some(Self::Month1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Week1 => "1wk",
            Self::Month1 => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value computed by the indicator engine for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Derived {
    /// Not enough preceding bars to fill the window.
    #[default]
    WarmUp,
    /// The window is full but the value has no numeric meaning (e.g. RSI 0/0).
    Undefined,
    Value(f64),
}

impl Derived {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::WarmUp | Self::Undefined => None,
        }
    }

    #[allow(dead_code)]
    pub fn is_warm_up(self) -> bool {
        matches!(self, Self::WarmUp)
    }
}

/// Indicator fields attached to a bar by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DerivedFields {
    pub sma: Derived,
    pub std_dev: Derived,
    pub upper_band: Derived,
    pub lower_band: Derived,
    pub rsi: Derived,
}

/// One trading session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub derived: DerivedFields,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            derived: DerivedFields::default(),
        }
    }
}

/// Bars for one symbol in ascending date order.
///
/// Built fresh for every request and dropped once it has been rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The last `n` bars (or all of them if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}
