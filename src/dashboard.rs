//! Interactive terminal dashboard.
//!
//! One key press at a time: typing edits the ticker, Enter runs a full
//! fetch + indicator pass and the next frame shows the result.

pub mod app;
pub mod chart;
pub mod view;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use error_stack::{Report, ResultExt};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;

use crate::config::DisplayConfig;
use crate::error::DashboardError;
use crate::market_data::MarketData;
use crate::screener::{ScreenSettings, screen};
use app::{Action, App};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Take over the terminal until the user quits. The terminal is restored
/// even when the loop fails.
pub async fn run(
    source: &dyn MarketData,
    settings: ScreenSettings,
    display: &DisplayConfig,
    initial_symbol: Option<String>,
) -> Result<(), Report<DashboardError>> {
    let mut terminal = setup_terminal()?;

    let mut app = App::new(
        settings.params,
        display.tail_rows,
        display.overbought,
        display.oversold,
    );
    let result = event_loop(&mut terminal, &mut app, source, &settings, initial_symbol).await;

    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Term, Report<DashboardError>> {
    enable_raw_mode().change_context(DashboardError::Terminal)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).change_context(DashboardError::Terminal)?;
    Terminal::new(CrosstermBackend::new(stdout)).change_context(DashboardError::Terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<(), Report<DashboardError>> {
    disable_raw_mode().change_context(DashboardError::Terminal)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .change_context(DashboardError::Terminal)?;
    terminal
        .show_cursor()
        .change_context(DashboardError::Terminal)
}

async fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    source: &dyn MarketData,
    settings: &ScreenSettings,
    initial_symbol: Option<String>,
) -> Result<(), Report<DashboardError>> {
    if let Some(symbol) = initial_symbol {
        app.input = symbol.clone();
        submit(terminal, app, source, settings, &symbol).await?;
    }

    loop {
        draw(terminal, app)?;

        if !event::poll(POLL_INTERVAL).change_context(DashboardError::Event)? {
            continue;
        }
        let Event::Key(key) = event::read().change_context(DashboardError::Event)? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Action::None => {}
            Action::Submit(ticker) => submit(terminal, app, source, settings, &ticker).await?,
            Action::Quit => {
                info!("quit requested");
                return Ok(());
            }
        }
    }
}

/// Show the fetching state, run one request, and store its outcome.
async fn submit(
    terminal: &mut Term,
    app: &mut App,
    source: &dyn MarketData,
    settings: &ScreenSettings,
    ticker: &str,
) -> Result<(), Report<DashboardError>> {
    app.fetching = true;
    draw(terminal, app)?;
    app.outcome = screen(source, ticker, settings).await;
    app.fetching = false;
    Ok(())
}

fn draw(terminal: &mut Term, app: &App) -> Result<(), Report<DashboardError>> {
    terminal
        .draw(|f| view::draw(f, app))
        .change_context(DashboardError::Draw)?;
    Ok(())
}
