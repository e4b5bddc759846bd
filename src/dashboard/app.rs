use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::indicator::IndicatorParams;
use crate::screener::Outcome;

const MAX_SYMBOL_LEN: usize = 16;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(String),
    Quit,
}

/// Dashboard state. `outcome` is overwritten by every submit, so nothing from
/// a previous ticker survives.
pub struct App {
    pub input: String,
    pub outcome: Outcome,
    pub fetching: bool,
    pub params: IndicatorParams,
    pub tail_rows: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl App {
    pub fn new(params: IndicatorParams, tail_rows: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            input: String::new(),
            outcome: Outcome::AwaitingInput,
            fetching: false,
            params,
            tail_rows,
            overbought,
            oversold,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
                KeyCode::Char('u') => {
                    self.input.clear();
                    Action::None
                }
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Enter => Action::Submit(self.input.clone()),
            KeyCode::Esc if self.input.is_empty() => Action::Quit,
            KeyCode::Esc => {
                self.input.clear();
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) if is_symbol_char(c) && self.input.len() < MAX_SYMBOL_LEN => {
                self.input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }
}

/// Characters seen in exchange tickers: `AAPL`, `BRK-B`, `^GSPC`, `EURUSD=X`, `7203.T`.
fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '^' | '=')
}
