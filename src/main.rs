mod config;
mod dashboard;
mod error;
mod indicator;
mod market_data;
mod model;
mod report;
mod screener;

use std::fs::OpenOptions;
use std::io;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use market_data::MarketData;
use market_data::yahoo::YahooFinance;
use screener::{Outcome, ScreenSettings, screen};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("logging setup error")]
    Logging,
    #[display("market data error")]
    MarketData,
    #[display("dashboard error")]
    Dashboard,
    #[display("output error")]
    Output,
}

#[derive(Parser)]
#[command(
    name = "stock-screener",
    about = "Stock screener with candlestick, Bollinger Band and RSI charts"
)]
struct Cli {
    /// Path to the TOML configuration file (default: ./screener.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticker symbol to load on startup
    #[arg(short, long)]
    symbol: Option<String>,

    /// Print the data table for --symbol and exit instead of opening the dashboard
    #[arg(long, requires = "symbol")]
    print: bool,

    /// With --print, write the whole series with indicators as JSON
    #[arg(long, requires = "print")]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config =
        config::load_or_default(cli.config.as_deref()).change_context(AppError::Config)?;

    init_tracing(&config, cli.print)?;

    let source = build_source(&config)?;
    let settings = config.screen_settings();

    info!(
        provider = source.name(),
        period = %settings.period,
        interval = %settings.interval,
        "starting stock screener"
    );

    if cli.print {
        let symbol = cli.symbol.unwrap_or_default();
        return print_report(&source, &symbol, &settings, &config, cli.json).await;
    }

    dashboard::run(&source, settings, &config.display, cli.symbol)
        .await
        .change_context(AppError::Dashboard)
}

/// The dashboard owns the terminal, so it logs to a file; `--print` logs to stderr.
fn init_tracing(config: &AppConfig, headless: bool) -> Result<(), Report<AppError>> {
    let filter = EnvFilter::new(&config.general.log_level);
    let json = config.general.log_format == "json";

    if headless {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
        return Ok(());
    }

    let path = &config.general.log_file;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .change_context(AppError::Logging)
        .attach_with(|| format!("log_file: {path}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn build_source(config: &AppConfig) -> Result<YahooFinance, Report<AppError>> {
    let md = &config.market_data;
    YahooFinance::new(
        &md.base_url,
        Duration::from_secs(md.timeout_secs),
        NonZeroU32::new(md.requests_per_second).unwrap_or(NonZeroU32::MIN),
    )
    .change_context(AppError::MarketData)
}

async fn print_report(
    source: &dyn MarketData,
    symbol: &str,
    settings: &ScreenSettings,
    config: &AppConfig,
    json: bool,
) -> Result<(), Report<AppError>> {
    match screen(source, symbol, settings).await {
        Outcome::AwaitingInput => {
            eprintln!("No ticker symbol given");
            Ok(())
        }
        Outcome::NoData { symbol } => {
            eprintln!("No data found for the ticker: {symbol}");
            Ok(())
        }
        Outcome::Failed { symbol, reason } => Err(Report::new(AppError::MarketData)
            .attach(format!("symbol: {symbol}"))
            .attach(reason)),
        Outcome::Ready(series) => {
            let output = if json {
                report::render_json(&series).change_context(AppError::Output)?
            } else {
                report::render_table(&series, config.display.tail_rows, &settings.params)
            };
            println!("{output}");
            Ok(())
        }
    }
}
