use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use bullseye_core::brokerage::PaperBrokerage;
use bullseye_core::decision::DecisionEngine;
use bullseye_core::fetch::{PageFetcher, Pacing};
use bullseye_core::http_client::ReqwestHttpClient;
use bullseye_core::pipeline::{BatchReport, BatchRunner};
use bullseye_core::session::SessionStore;
use bullseye_core::signal_source::{LiveSignalSource, SignalSource, SimulatedSignalSource};
use bullseye_core::Symbol;
use bullseye_ledger::Ledger;

use crate::cli::RunArgs;
use crate::commands::CommandResult;
use crate::error::CliError;

pub async fn run(args: &RunArgs) -> Result<CommandResult, CliError> {
    if !args.dry_run {
        return Err(CliError::Command(
            "live order routing is not configured, rerun with --dry-run".to_string(),
        ));
    }

    let ledger = Ledger::open_default()?;
    let watchlist = ledger.watchlist()?;
    if watchlist.is_empty() {
        tracing::warn!("watchlist is empty, nothing to run");
        return Ok(CommandResult::ok(json!({
            "analyzed": 0,
            "failed": 0,
            "outcomes": [],
        })));
    }

    let symbols = watchlist
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let engine = DecisionEngine::new(args.notional)?;
    let pacing = Pacing::new(
        Duration::from_millis(args.min_delay_ms),
        Duration::from_millis(args.max_delay_ms),
    )?;

    let report = if args.simulate_signals {
        tracing::info!(symbols = symbols.len(), "running batch with simulated signals");
        execute(
            SimulatedSignalSource,
            None,
            ledger,
            engine,
            pacing,
            args.period,
            &symbols,
        )
        .await
    } else {
        let store = SessionStore::default_location();
        let session = store.load();
        let fetcher = PageFetcher::new(Arc::new(ReqwestHttpClient::new()), session);
        tracing::info!(symbols = symbols.len(), "running batch with live signals");
        execute(
            LiveSignalSource::new(fetcher),
            Some(store),
            ledger,
            engine,
            pacing,
            args.period,
            &symbols,
        )
        .await
    };

    let summaries = report.summaries();
    Ok(CommandResult::ok(json!({
        "analyzed": report.analyzed_count(),
        "failed": report.failed_count(),
        "outcomes": summaries,
    })))
}

async fn execute<S: SignalSource>(
    source: S,
    session_store: Option<SessionStore>,
    ledger: Ledger,
    engine: DecisionEngine,
    pacing: Pacing,
    period: usize,
    symbols: &[Symbol],
) -> BatchReport {
    let mut runner = BatchRunner::new(source, PaperBrokerage::new(), ledger)
        .with_engine(engine)
        .with_pacing(pacing)
        .with_period(period);
    if let Some(store) = session_store {
        runner = runner.with_session_store(store);
    }
    runner.run(symbols).await
}
