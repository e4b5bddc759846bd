use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Wrap};

use crate::dashboard::app::App;
use crate::dashboard::chart;
use crate::model::Series;
use crate::report;
use crate::screener::Outcome;

const TITLE: &str = "Advanced Stock Market Screener";
const SIDEBAR_WIDTH: u16 = 34;
const ABOUT_TEXT: &str = "This app allows you to analyze stock data with interactive charts \
for Bollinger Bands, RSI, and Candlestick patterns.";
const NO_DATA_TEXT: &str = "No data found for the ticker";
const FETCHING_TEXT: &str = "Fetching stock data...";

pub fn draw(f: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(f.area());

    draw_sidebar(f, columns[0], app);
    draw_main(f, columns[1], app);
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.input.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(
        Block::default()
            .title(" Stock Input ")
            .borders(Borders::ALL),
    );
    f.render_widget(input, rows[0]);

    let help = Paragraph::new(vec![
        Line::from("Enter stock symbol (e.g., AAPL)"),
        Line::from("Enter      fetch"),
        Line::from("Esc        clear / quit"),
        Line::from("Ctrl-C     quit"),
    ])
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, rows[1]);

    let about = Paragraph::new(ABOUT_TEXT)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(" About ").borders(Borders::ALL));
    f.render_widget(about, rows[2]);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        TITLE,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, rows[0]);
    f.render_widget(status_line(app), rows[1]);

    match &app.outcome {
        Outcome::Ready(series) if !app.fetching && !series.is_empty() => {
            draw_series(f, rows[2], app, series);
        }
        _ => {}
    }
}

pub fn status_line(app: &App) -> Paragraph<'static> {
    let (text, color) = if app.fetching {
        (FETCHING_TEXT.to_owned(), Color::Yellow)
    } else {
        match &app.outcome {
            Outcome::AwaitingInput => (
                "Type a ticker symbol in the sidebar and press Enter".to_owned(),
                Color::Gray,
            ),
            Outcome::NoData { symbol } => (format!("{NO_DATA_TEXT}: {symbol}"), Color::Red),
            Outcome::Failed { symbol, reason } => (
                format!("Could not load {symbol}: {reason}"),
                Color::Red,
            ),
            Outcome::Ready(series) => (ready_summary(series), Color::Green),
        }
    };
    Paragraph::new(Span::styled(text, Style::default().fg(color)))
}

fn ready_summary(series: &Series) -> String {
    match (series.bars.first(), series.bars.last()) {
        (Some(first), Some(last)) => format!(
            "{}: {} bars from {} to {}",
            series.symbol,
            series.len(),
            first.date,
            last.date
        ),
        _ => series.symbol.clone(),
    }
}

fn draw_series(f: &mut Frame, area: Rect, app: &App, series: &Series) {
    // header row + borders
    let table_height = (series.tail(app.tail_rows).len() + 3) as u16;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(table_height),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    f.render_widget(data_table(app, series), rows[0]);
    chart::render_candles(f, rows[1], series);
    chart::render_bollinger(f, rows[2], series);
    chart::render_rsi(f, rows[3], series, app.overbought, app.oversold);
}

fn data_table(app: &App, series: &Series) -> Table<'static> {
    let headers = report::headers(&app.params);
    let body: Vec<Vec<String>> = series
        .tail(app.tail_rows)
        .iter()
        .map(report::row_cells)
        .collect();

    let widths: Vec<Constraint> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let widest = body.iter().map(|r| r[i].len()).max().unwrap_or(0);
            Constraint::Length(widest.max(h.len()) as u16)
        })
        .collect();

    let header = Row::new(headers).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    Table::new(body.into_iter().map(Row::new), widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .title(format!(" Stock Data: {} ", series.symbol))
                .borders(Borders::ALL),
        )
}
