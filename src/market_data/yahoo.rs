use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::MarketDataError;
use crate::market_data::{MarketData, normalize_bars};
use crate::model::{Bar, Interval, Period};

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER: &str = "yahoo";
// The chart endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-screener";
const NOT_FOUND_CODE: &str = "Not Found";

/// Yahoo Finance `v8/finance/chart` client.
pub struct YahooFinance {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooFinance {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        requests_per_second: NonZeroU32,
    ) -> Result<Self, Report<MarketDataError>> {
        let base_url = Url::parse(base_url)
            .change_context(client_error())
            .attach_with(|| format!("base_url: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(Report::new(client_error()).attach(format!("base_url: {base_url}")));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .change_context(client_error())?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second))),
        })
    }

    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", symbol]);
        }
        url
    }
}

impl MarketData for YahooFinance {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> BoxFuture<'_, Result<Vec<Bar>, Report<MarketDataError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = self.chart_url(&symbol);
            let params = [
                ("range", period.as_str()),
                ("interval", interval.as_str()),
                ("events", "history"),
            ];

            debug!(url = %url, range = %period, interval = %interval, "requesting chart");

            let response = self
                .client
                .get(url)
                .query(&params)
                .send()
                .await
                .change_context(request_error())
                .attach_with(|| format!("symbol: {symbol}"))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .change_context(request_error())
                .attach_with(|| format!("HTTP status: {status}"))?;

            let bars = parse_chart(status, &body)?;

            info!(
                provider = PROVIDER,
                symbol = %symbol,
                period = %period,
                interval = %interval,
                fetched = bars.len(),
                "chart fetch complete"
            );

            Ok(bars)
        })
    }
}

fn client_error() -> MarketDataError {
    MarketDataError::Client {
        provider: PROVIDER.into(),
    }
}

fn request_error() -> MarketDataError {
    MarketDataError::Request {
        provider: PROVIDER.into(),
    }
}

/// Turn a chart response into clean bars. A "Not Found" error body (unknown
/// or delisted symbol) is an empty result, not a failure.
fn parse_chart(status: StatusCode, body: &str) -> Result<Vec<Bar>, Report<MarketDataError>> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(Report::new(request_error()).attach(format!("HTTP status: {status}")));
        }
        Err(e) => {
            return Err(Report::new(e).change_context(MarketDataError::ResponseParse {
                provider: PROVIDER.into(),
            }));
        }
    };

    if let Some(error) = envelope.chart.error {
        if error.code == NOT_FOUND_CODE {
            debug!(description = %error.description, "symbol not found");
            return Ok(Vec::new());
        }
        return Err(Report::new(request_error())
            .attach(format!("HTTP status: {status}"))
            .attach(format!("{}: {}", error.code, error.description)));
    }

    if !status.is_success() {
        return Err(Report::new(request_error()).attach(format!("HTTP status: {status}")));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    Ok(normalize_bars(result.into_bars()))
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Seconds east of UTC for the listing exchange.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl ChartResult {
    /// Rows with a missing or non-positive price are dropped.
    fn into_bars(self) -> Vec<Bar> {
        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Vec::new();
        };
        let offset = self.meta.gmtoffset;
        let price = |column: &[Option<f64>], i: usize| {
            column
                .get(i)
                .copied()
                .flatten()
                .filter(|p| p.is_finite() && *p > 0.0)
        };

        let bars: Vec<Bar> = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some(Bar::new(
                    date,
                    price(quote.open.as_slice(), i)?,
                    price(quote.high.as_slice(), i)?,
                    price(quote.low.as_slice(), i)?,
                    price(quote.close.as_slice(), i)?,
                    quote.volume.get(i).copied().flatten().unwrap_or(0),
                ))
            })
            .collect();

        let skipped = self.timestamp.len() - bars.len();
        if skipped > 0 {
            debug!(skipped, "dropped incomplete chart rows");
        }
        bars
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    // 2024-01-02 and 2024-01-03 at 09:30 New York (UTC-5)
    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, 184.22, null],
                        "high":   [188.44, 185.88, 183.09],
                        "low":    [183.89, 183.43, 180.88],
                        "close":  [185.64, 184.25, 181.91],
                        "volume": [82488700, null, 71983600]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    const CHART_NOT_FOUND: &str = r#"{
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    }"#;

    fn yahoo() -> YahooFinance {
        YahooFinance::new(
            YAHOO_BASE_URL,
            Duration::from_secs(10),
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn chart_response_parses_into_bars() {
        let bars = parse_chart(StatusCode::OK, CHART_OK).unwrap();
        // third row has a null open and is dropped
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].open, 187.15);
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[0].volume, 82_488_700);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].volume, 0);
        assert!(bars[0].derived.sma.is_warm_up());
    }

    #[test]
    fn not_found_is_empty_result() {
        let bars = parse_chart(StatusCode::NOT_FOUND, CHART_NOT_FOUND).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn other_chart_error_is_failure() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(parse_chart(StatusCode::BAD_REQUEST, body).is_err());
    }

    #[test]
    fn non_json_error_status_is_failure() {
        assert!(parse_chart(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").is_err());
    }

    #[test]
    fn malformed_success_body_is_parse_failure() {
        let report = parse_chart(StatusCode::OK, "{not json").unwrap_err();
        assert!(matches!(
            report.current_context(),
            MarketDataError::ResponseParse { .. }
        ));
    }

    #[test]
    fn result_without_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(StatusCode::OK, body).unwrap().is_empty());
    }

    #[test]
    fn chart_url_escapes_symbol() {
        let url = yahoo().chart_url("BRK B");
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/BRK%20B"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        let result = YahooFinance::new(
            "not a url",
            Duration::from_secs(1),
            NonZeroU32::new(1).unwrap(),
        );
        assert!(result.is_err());
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_bars() {
        let bars = yahoo()
            .fetch_bars("AAPL", Period::Month3, Interval::Day1)
            .await
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }
}
