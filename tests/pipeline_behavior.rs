//! Behavior tests for the batch pipeline and its supporting pieces.
//!
//! These verify WHAT a watchlist run produces, focusing on the report
//! and the ledger rows a user would inspect afterwards.

use std::future::Future;
use std::pin::Pin;

use bullseye_core::brokerage::{Brokerage, PaperBrokerage};
use bullseye_core::fetch::{FetchError, FetchErrorKind, Pacing};
use bullseye_core::oscillator::stochastic;
use bullseye_core::pipeline::{BatchRunner, SymbolOutcome};
use bullseye_core::session::{SessionState, SessionStore, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use bullseye_core::signal_source::SignalSource;
use bullseye_core::{SignalRecord, Symbol, TradeDate, NOT_AVAILABLE};
use bullseye_ledger::{Ledger, LedgerConfig};
use tempfile::tempdir;

struct ScriptedSignals {
    fail_for: Vec<&'static str>,
}

impl SignalSource for ScriptedSignals {
    fn latest_signal<'a>(
        &'a mut self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SignalRecord>, FetchError>> + Send + 'a>> {
        let fail = self.fail_for.contains(&symbol.as_str());
        Box::pin(async move {
            if fail {
                return Err(FetchError {
                    url: format!("https://example.test/{symbol}"),
                    kind: FetchErrorKind::Timeout,
                    message: "request timeout".to_string(),
                });
            }
            Ok(Some(SignalRecord {
                symbol: symbol.clone(),
                signal_date: TradeDate::today().display_md(),
                signal: "BUY".to_string(),
                price: NOT_AVAILABLE.to_string(),
                change_pct: NOT_AVAILABLE.to_string(),
                raw_value: NOT_AVAILABLE.to_string(),
            }))
        })
    }
}

fn open_temp_ledger(dir: &std::path::Path) -> Ledger {
    let bullseye_home = dir.join("bullseye-home");
    let db_path = bullseye_home.join("ledger.duckdb");
    Ledger::open(LedgerConfig {
        bullseye_home,
        db_path,
        max_idle_connections: 2,
    })
    .expect("ledger open")
}

fn symbols(texts: &[&str]) -> Vec<Symbol> {
    texts
        .iter()
        .map(|text| Symbol::parse(text).expect("valid symbol"))
        .collect()
}

#[tokio::test]
async fn a_failing_symbol_is_reported_without_stopping_the_batch() {
    // Given: a three-symbol watchlist where the middle fetch times out
    let temp = tempdir().expect("tempdir");
    let ledger = open_temp_ledger(temp.path());
    let source = ScriptedSignals {
        fail_for: vec!["MSFT"],
    };

    // When: one batch runs over the watchlist
    let mut runner =
        BatchRunner::new(source, PaperBrokerage::new(), ledger.clone()).with_pacing(Pacing::none());
    let report = runner.run(&symbols(&["AAPL", "MSFT", "NVDA"])).await;

    // Then: two successes and one tagged failure, in input order
    assert_eq!(report.analyzed_count(), 2);
    assert_eq!(report.failed_count(), 1);
    let order: Vec<&str> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.symbol().as_str())
        .collect();
    assert_eq!(order, vec!["AAPL", "MSFT", "NVDA"]);
    assert!(matches!(report.outcomes[1], SymbolOutcome::Failed { .. }));

    // And: only the successful symbols left analysis and signal rows
    let analyzed: Vec<String> = ledger
        .analysis_rows()
        .expect("analysis rows")
        .into_iter()
        .map(|row| row.symbol)
        .collect();
    assert_eq!(analyzed, vec!["AAPL", "NVDA"]);
    assert_eq!(ledger.signal_rows().expect("signal rows").len(), 2);
}

#[tokio::test]
async fn the_report_summarizes_every_symbol_for_display() {
    let temp = tempdir().expect("tempdir");
    let ledger = open_temp_ledger(temp.path());
    let source = ScriptedSignals {
        fail_for: vec!["MSFT"],
    };

    let mut runner =
        BatchRunner::new(source, PaperBrokerage::new(), ledger).with_pacing(Pacing::none());
    let report = runner.run(&symbols(&["AAPL", "MSFT"])).await;

    let summaries = report.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].status, "analyzed");
    assert!(summaries[0].action.is_some());
    assert_eq!(summaries[1].status, "failed");
    assert!(summaries[1].detail.contains("timeout"));
}

#[tokio::test]
async fn identical_price_series_always_score_identically() {
    // Deterministic market data must produce deterministic indicators.
    let brokerage = PaperBrokerage::new();
    let symbol = Symbol::parse("AAPL").expect("valid symbol");

    let first = brokerage.price_history(&symbol, 40).await.expect("history");
    let second = brokerage.price_history(&symbol, 40).await.expect("history");
    assert_eq!(first, second);

    let a = stochastic(&first, 14);
    let b = stochastic(&second, 14);
    assert_eq!(a.latest_k, b.latest_k);
    assert_eq!(a.latest_d, b.latest_d);
    assert!(a.latest_k.is_some(), "40 bars cover a 14-day window");
}

#[test]
fn session_state_survives_a_save_and_load_round_trip() {
    // Given: a session that picked up cookies during a batch
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("session.json");
    let mut state = SessionState::fresh();
    state
        .cookies
        .insert("ASP.NET_SessionId".to_string(), "abc123".to_string());

    // When: it is saved and loaded back
    let store = SessionStore::new(&path);
    store.save(&state).expect("save session");
    let restored = store.load();

    // Then: user agent, viewport, and cookies all survive
    assert_eq!(restored, state);
    assert!(VIEWPORT_WIDTH.contains(&restored.viewport.0));
    assert!(VIEWPORT_HEIGHT.contains(&restored.viewport.1));
}

#[test]
fn a_corrupt_session_file_falls_back_to_a_fresh_identity() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("session.json");
    std::fs::write(&path, "{not json").expect("write corrupt file");

    let restored = SessionStore::new(&path).load();
    assert!(!restored.user_agent.is_empty());
    assert!(restored.cookies.is_empty());
}
