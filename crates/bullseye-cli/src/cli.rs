use clap::{Args, Parser, Subcommand, ValueEnum};

/// Watchlist-driven swing-trade assistant.
#[derive(Debug, Parser)]
#[command(name = "bullseye", version, about = "Scrape signals, analyze momentum, record trades")]
pub struct Cli {
    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the watchlist.
    #[command(subcommand)]
    Watch(WatchCommand),

    /// Run one batch over the watchlist.
    Run(RunArgs),

    /// Print ledger tables.
    #[command(subcommand)]
    Show(ShowCommand),
}

#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    /// Add one or more symbols to the watchlist.
    Add {
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Remove a symbol and its analysis rows.
    Remove { symbol: String },

    /// List watched symbols.
    List,

    /// Remove every watched symbol.
    Clear,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Dollar amount targeted per buy order.
    #[arg(long, default_value_t = bullseye_core::decision::DEFAULT_NOTIONAL)]
    pub notional: f64,

    /// Stochastic oscillator lookback in trading days.
    #[arg(long, default_value_t = bullseye_core::oscillator::DEFAULT_PERIOD)]
    pub period: usize,

    /// Use coin-flip signals instead of scraping the signal site.
    #[arg(long)]
    pub simulate_signals: bool,

    /// Route orders to the paper brokerage.
    #[arg(long)]
    pub dry_run: bool,

    /// Minimum pause between symbols, in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    pub min_delay_ms: u64,

    /// Maximum pause between symbols, in milliseconds.
    #[arg(long, default_value_t = 6_000)]
    pub max_delay_ms: u64,
}

#[derive(Debug, Subcommand)]
pub enum ShowCommand {
    /// Trade-log rows, newest first.
    Trades {
        /// Only rows recorded on this MM/DD date.
        #[arg(long)]
        date: Option<String>,
    },

    /// Latest per-symbol oscillator analysis.
    Analysis,

    /// Latest per-symbol scraped signals.
    Signals,
}
