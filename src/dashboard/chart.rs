use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget};

use crate::model::{Bar, Derived, DerivedFields, Series};

const PAD_RATIO: f64 = 0.05;
const CLOSE_COLOR: Color = Color::Blue;
const UPPER_COLOR: Color = Color::Red;
const LOWER_COLOR: Color = Color::Green;
const RSI_COLOR: Color = Color::Magenta;

/// Candlesticks with horizontal grid lines. At most one column per bar; when
/// the area is wider than the series the candles are spread out.
pub struct CandleChart<'a> {
    bars: &'a [Bar],
}

impl<'a> CandleChart<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }
}

impl Widget for CandleChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.bars.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let n = self.bars.len().min(width);
        let visible = &self.bars[self.bars.len() - n..];

        let lows = visible.iter().map(|b| b.low);
        let highs = visible.iter().map(|b| b.high);
        let Some((y_min, y_max)) = padded_bounds(lows.chain(highs)) else {
            return;
        };
        let span = y_max - y_min;
        let height = area.height as i32;

        let row_min = area.y as i32;
        let row_max = row_min + height - 1;
        let map_price_to_row = |price: f64| -> i32 {
            let ratio = ((price - y_min) / span).clamp(0.0, 1.0);
            let rel = (ratio * (height as f64 - 1.0)).round() as i32;
            row_max - rel
        };

        let grid_lines = 4;
        for i in 0..=grid_lines {
            let price = y_min + span * i as f64 / grid_lines as f64;
            let row = map_price_to_row(price).clamp(row_min, row_max);
            for x in area.x..area.x + area.width {
                if let Some(cell) = buf.cell_mut((x, row as u16)) {
                    cell.set_symbol("─").set_fg(Color::DarkGray);
                }
            }
        }

        for (i, bar) in visible.iter().enumerate() {
            let x = area.x + (i * width / n) as u16;
            let color = if bar.close >= bar.open {
                Color::Green
            } else {
                Color::Red
            };

            let (open_row, close_row) = (map_price_to_row(bar.open), map_price_to_row(bar.close));
            let wick = map_price_to_row(bar.high)..=map_price_to_row(bar.low);
            let body = open_row.min(close_row)..=open_row.max(close_row);

            for y in wick {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("│").set_fg(color);
                }
            }
            for y in body {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("█").set_fg(color);
                }
            }
        }
    }
}

/// Min/max of `values` widened by a small margin. `None` for no finite values.
pub fn padded_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;
    let pad = ((hi - lo) * PAD_RATIO).max(1e-3);
    Some((lo - pad, hi + pad))
}

pub fn close_points(series: &Series) -> Vec<(f64, f64)> {
    series
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| (i as f64, b.close))
        .collect()
}

/// Points for one derived field, skipping bars without a numeric value.
pub fn derived_points(series: &Series, field: fn(&DerivedFields) -> Derived) -> Vec<(f64, f64)> {
    series
        .bars
        .iter()
        .enumerate()
        .filter_map(|(i, b)| field(&b.derived).value().map(|v| (i as f64, v)))
        .collect()
}

/// A horizontal reference line drawn as evenly spaced dots.
pub fn level_points(len: usize, level: f64) -> Vec<(f64, f64)> {
    (0..len).step_by(2).map(|i| (i as f64, level)).collect()
}

fn x_axis(series: &Series) -> Axis<'static> {
    let last = series.len().saturating_sub(1);
    let label = |i: usize| {
        series
            .bars
            .get(i)
            .map(|b| b.date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, last.max(1) as f64])
        .labels(vec![label(0), label(last / 2), label(last)])
}

fn line_dataset<'a>(name: &'a str, color: Color, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
}

pub fn render_candles(f: &mut Frame, area: Rect, series: &Series) {
    let block = titled_block("Candlestick Chart");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(CandleChart::new(&series.bars), inner);
}

pub fn render_bollinger(f: &mut Frame, area: Rect, series: &Series) {
    let close = close_points(series);
    let upper = derived_points(series, |d| d.upper_band);
    let lower = derived_points(series, |d| d.lower_band);

    let Some((y_min, y_max)) = padded_bounds(
        close
            .iter()
            .chain(&upper)
            .chain(&lower)
            .map(|&(_, y)| y),
    ) else {
        f.render_widget(titled_block("Bollinger Bands"), area);
        return;
    };

    let chart = Chart::new(vec![
        line_dataset("Close Price", CLOSE_COLOR, &close),
        line_dataset("Upper Band", UPPER_COLOR, &upper),
        line_dataset("Lower Band", LOWER_COLOR, &lower),
    ])
    .block(titled_block("Bollinger Bands"))
    .x_axis(x_axis(series))
    .y_axis(
        Axis::default()
            .title("Price")
            .style(Style::default().fg(Color::Gray))
            .bounds([y_min, y_max])
            .labels(vec![
                format!("{y_min:.2}"),
                format!("{:.2}", (y_min + y_max) / 2.0),
                format!("{y_max:.2}"),
            ]),
    );

    f.render_widget(chart, area);
}

pub fn render_rsi(f: &mut Frame, area: Rect, series: &Series, overbought: f64, oversold: f64) {
    let rsi = derived_points(series, |d| d.rsi);
    let overbought_line = level_points(series.len(), overbought);
    let oversold_line = level_points(series.len(), oversold);
    let overbought_name = format!("Overbought ({overbought})");
    let oversold_name = format!("Oversold ({oversold})");

    let chart = Chart::new(vec![
        line_dataset("RSI", RSI_COLOR, &rsi),
        Dataset::default()
            .name(overbought_name)
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(UPPER_COLOR))
            .data(&overbought_line),
        Dataset::default()
            .name(oversold_name)
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(LOWER_COLOR))
            .data(&oversold_line),
    ])
    .block(titled_block("Relative Strength Index (RSI)"))
    .x_axis(x_axis(series))
    .y_axis(
        Axis::default()
            .title("RSI")
            .style(Style::default().fg(Color::Gray))
            .bounds([0.0, 100.0])
            .labels(vec!["0", "50", "100"]),
    );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::series_from_closes;
    use crate::indicator::{IndicatorParams, compute_indicators};
    use chrono::NaiveDate;

    #[test]
    fn padded_bounds_ignores_non_finite() {
        let (lo, hi) = padded_bounds([1.0, f64::NAN, 3.0].into_iter()).unwrap();
        assert!(lo < 1.0 && lo > 0.8);
        assert!(hi > 3.0 && hi < 3.2);
        assert_eq!(padded_bounds(std::iter::empty()), None);
    }

    #[test]
    fn padded_bounds_flat_values_not_degenerate() {
        let (lo, hi) = padded_bounds([5.0, 5.0].into_iter()).unwrap();
        assert!(hi > lo);
    }

    #[test]
    fn derived_points_skip_warm_up() {
        let closes: Vec<f64> = (0..22).map(|i| 100.0 + i as f64).collect();
        let series =
            compute_indicators(series_from_closes(&closes), &IndicatorParams::default()).unwrap();
        let upper = derived_points(&series, |d| d.upper_band);
        assert_eq!(upper.len(), 3);
        assert_eq!(upper[0].0, 19.0);
        assert_eq!(close_points(&series).len(), 22);
    }

    #[test]
    fn derived_points_skip_undefined_rsi() {
        let series =
            compute_indicators(series_from_closes(&[100.0; 20]), &IndicatorParams::default())
                .unwrap();
        assert!(derived_points(&series, |d| d.rsi).is_empty());
    }

    #[test]
    fn level_points_are_dashed() {
        let points = level_points(5, 70.0);
        assert_eq!(points, vec![(0.0, 70.0), (2.0, 70.0), (4.0, 70.0)]);
    }

    #[test]
    fn candle_chart_colors_by_direction() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = vec![
            Bar::new(date, 10.0, 12.0, 9.0, 11.0, 0),
            Bar::new(date.succ_opt().unwrap(), 11.0, 11.5, 8.0, 8.5, 0),
        ];
        let area = Rect::new(0, 0, 2, 10);
        let mut buf = Buffer::empty(area);
        CandleChart::new(&bars).render(area, &mut buf);

        let column = |x: u16| -> Vec<(String, Color)> {
            (0..10)
                .filter_map(|y| buf.cell((x, y)))
                .filter(|c| c.symbol() == "█")
                .map(|c| (c.symbol().to_owned(), c.fg))
                .collect()
        };
        let up = column(0);
        let down = column(1);
        assert!(!up.is_empty() && up.iter().all(|(_, fg)| *fg == Color::Green));
        assert!(!down.is_empty() && down.iter().all(|(_, fg)| *fg == Color::Red));
    }

    #[test]
    fn candle_chart_empty_is_noop() {
        let area = Rect::new(0, 0, 5, 5);
        let mut buf = Buffer::empty(area);
        CandleChart::new(&[]).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
