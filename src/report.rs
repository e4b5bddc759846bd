//! Plain-text rendering of the tail view, shared by `--print` and the
//! dashboard table.

use crate::indicator::IndicatorParams;
use crate::model::{Bar, Derived, Series};

const WARM_UP_CELL: &str = "-";
const UNDEFINED_CELL: &str = "NaN";

pub fn headers(params: &IndicatorParams) -> Vec<String> {
    vec![
        "Date".into(),
        "Open".into(),
        "High".into(),
        "Low".into(),
        "Close".into(),
        "Volume".into(),
        format!("SMA {}", params.bollinger_period),
        format!("STD {}", params.bollinger_period),
        "Upper Band".into(),
        "Lower Band".into(),
        format!("RSI {}", params.rsi_period),
    ]
}

pub fn format_derived(value: Derived) -> String {
    match value {
        Derived::Value(v) => format!("{v:.2}"),
        Derived::WarmUp => WARM_UP_CELL.into(),
        Derived::Undefined => UNDEFINED_CELL.into(),
    }
}

pub fn row_cells(bar: &Bar) -> Vec<String> {
    let d = &bar.derived;
    vec![
        bar.date.format("%Y-%m-%d").to_string(),
        format!("{:.2}", bar.open),
        format!("{:.2}", bar.high),
        format!("{:.2}", bar.low),
        format!("{:.2}", bar.close),
        bar.volume.to_string(),
        format_derived(d.sma),
        format_derived(d.std_dev),
        format_derived(d.upper_band),
        format_derived(d.lower_band),
        format_derived(d.rsi),
    ]
}

/// Right-aligned table of the last `rows` bars, one line per bar.
pub fn render_table(series: &Series, rows: usize, params: &IndicatorParams) -> String {
    let headers = headers(params);
    let body: Vec<Vec<String>> = series.tail(rows).iter().map(row_cells).collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            body.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = format!("{}\n", series.symbol);
    out.push_str(&format_line(headers.as_slice()));
    out.push('\n');
    for row in &body {
        out.push_str(&format_line(row.as_slice()));
        out.push('\n');
    }
    out
}

pub fn render_json(series: &Series) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::compute_indicators;
    use crate::indicator::test_support::series_from_closes;

    fn computed(n: usize) -> Series {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i % 3) as f64).collect();
        compute_indicators(series_from_closes(&closes), &IndicatorParams::default()).unwrap()
    }

    #[test]
    fn derived_cells() {
        assert_eq!(format_derived(Derived::Value(12.345)), "12.35");
        assert_eq!(format_derived(Derived::WarmUp), "-");
        assert_eq!(format_derived(Derived::Undefined), "NaN");
    }

    #[test]
    fn headers_name_windows() {
        let headers = headers(&IndicatorParams::default());
        assert_eq!(headers.len(), 11);
        assert_eq!(headers[6], "SMA 20");
        assert_eq!(headers[10], "RSI 14");
    }

    #[test]
    fn table_shows_only_tail_rows() {
        let series = computed(25);
        let table = render_table(&series, 5, &IndicatorParams::default());
        let lines: Vec<&str> = table.lines().collect();
        // symbol + header + 5 rows
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "TEST");
        assert!(lines[1].contains("Upper Band"));
        assert!(lines[6].trim_start().starts_with("2024-01-25"));
    }

    #[test]
    fn table_marks_warm_up_rows() {
        let series = computed(3);
        let table = render_table(&series, 5, &IndicatorParams::default());
        let last = table.lines().last().unwrap();
        assert!(last.trim_end().ends_with('-'));
    }

    #[test]
    fn json_contains_derived_state() {
        let json = render_json(&computed(21)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["symbol"], "TEST");
        assert_eq!(value["bars"][0]["derived"]["sma"]["state"], "warm_up");
        assert_eq!(value["bars"][20]["derived"]["sma"]["state"], "value");
    }
}
