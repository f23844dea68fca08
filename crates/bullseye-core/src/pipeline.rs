//! Sequential batch run over the watchlist.
//!
//! One browsing session, one symbol at a time, a jittered pause between
//! symbols. A failure for one symbol becomes a tagged outcome and the
//! batch moves on; outcomes come back in input order.

use serde::Serialize;
use thiserror::Error;

use bullseye_ledger::{AnalysisRow, Ledger, SignalInfoRow};

use crate::brokerage::{Brokerage, OrderError};
use crate::decision::DecisionEngine;
use crate::fetch::{FetchError, Pacing};
use crate::oscillator::{stochastic, DEFAULT_PERIOD};
use crate::session::SessionStore;
use crate::signal_source::SignalSource;
use crate::{CoreError, Symbol, TradeDate, TradeDecision};

const DEFAULT_HISTORY_DAYS: usize = 40;

/// Why one symbol's run failed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Brokerage(#[from] OrderError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("no price available for {symbol}")]
    MissingPrice { symbol: Symbol },
}

/// Result of processing one symbol.
#[derive(Debug)]
pub enum SymbolOutcome {
    Analyzed {
        symbol: Symbol,
        decision: TradeDecision,
    },
    Failed {
        symbol: Symbol,
        error: BatchError,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &Symbol {
        match self {
            SymbolOutcome::Analyzed { symbol, .. } | SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }
}

/// Outcomes for a whole batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    pub fn analyzed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SymbolOutcome::Analyzed { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.analyzed_count()
    }

    /// Flat summary rows for CLI output.
    pub fn summaries(&self) -> Vec<OutcomeSummary> {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                SymbolOutcome::Analyzed { symbol, decision } => OutcomeSummary {
                    symbol: symbol.to_string(),
                    status: "analyzed".to_string(),
                    action: Some(decision.action.to_string()),
                    executed: Some(decision.executed),
                    detail: format!(
                        "{} {:.6} @ {:.2}",
                        decision.action, decision.shares, decision.price
                    ),
                },
                SymbolOutcome::Failed { symbol, error } => OutcomeSummary {
                    symbol: symbol.to_string(),
                    status: "failed".to_string(),
                    action: None,
                    executed: None,
                    detail: error.to_string(),
                },
            })
            .collect()
    }
}

/// One line of a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub symbol: String,
    pub status: String,
    pub action: Option<String>,
    pub executed: Option<bool>,
    pub detail: String,
}

/// Drives one batch: signal, analysis, decision, ledger, per symbol.
pub struct BatchRunner<S: SignalSource, B: Brokerage> {
    signal_source: S,
    brokerage: B,
    ledger: Ledger,
    engine: DecisionEngine,
    pacing: Pacing,
    period: usize,
    history_days: usize,
    session_store: Option<SessionStore>,
}

impl<S: SignalSource, B: Brokerage> BatchRunner<S, B> {
    pub fn new(signal_source: S, brokerage: B, ledger: Ledger) -> Self {
        Self {
            signal_source,
            brokerage,
            ledger,
            engine: DecisionEngine::default(),
            pacing: Pacing::default(),
            period: DEFAULT_PERIOD,
            history_days: DEFAULT_HISTORY_DAYS,
            session_store: None,
        }
    }

    pub fn with_engine(mut self, engine: DecisionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self.history_days = self.history_days.max(period + 2);
        self
    }

    /// Persist the signal source's session here after the batch.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Run one batch over the watchlist.
    pub async fn run(&mut self, watchlist: &[Symbol]) -> BatchReport {
        let today = TradeDate::today();
        let mut report = BatchReport::default();

        for (index, symbol) in watchlist.iter().enumerate() {
            if index > 0 {
                self.pacing.pause().await;
            }

            match self.process_symbol(today, symbol).await {
                Ok(decision) => {
                    tracing::info!(symbol = %symbol, action = %decision.action, "symbol analyzed");
                    report.outcomes.push(SymbolOutcome::Analyzed {
                        symbol: symbol.clone(),
                        decision,
                    });
                }
                Err(error) => {
                    tracing::warn!(symbol = %symbol, %error, "symbol failed, continuing batch");
                    report.outcomes.push(SymbolOutcome::Failed {
                        symbol: symbol.clone(),
                        error,
                    });
                }
            }
        }

        if let (Some(store), Some(state)) = (&self.session_store, self.signal_source.session_state())
        {
            if let Err(error) = store.save(&state) {
                tracing::warn!(%error, "failed to persist session state");
            }
        }

        report
    }

    async fn process_symbol(
        &mut self,
        today: TradeDate,
        symbol: &Symbol,
    ) -> Result<TradeDecision, BatchError> {
        let signal = self.signal_source.latest_signal(symbol).await?;
        if let Some(record) = &signal {
            self.ledger
                .upsert_signal_info(&SignalInfoRow {
                    symbol: symbol.as_str().to_string(),
                    signal: record.signal.clone(),
                    signal_date: record.signal_date.clone(),
                    price: record.price.clone(),
                    change_pct: record.change_pct.clone(),
                    raw_value: record.raw_value.clone(),
                })
                .map_err(CoreError::from)?;
        }

        let history = self
            .brokerage
            .price_history(symbol, self.history_days)
            .await?;
        // A zero or negative close cannot size an order.
        let price = match history.latest_close().filter(|price| *price > 0.0) {
            Some(price) => price,
            None => {
                return Err(BatchError::MissingPrice {
                    symbol: symbol.clone(),
                })
            }
        };

        let oscillator = stochastic(&history, self.period);
        let zone = oscillator.zone();
        self.ledger
            .upsert_analysis(&AnalysisRow {
                symbol: symbol.as_str().to_string(),
                price,
                percent_k: oscillator.latest_k,
                percent_d: oscillator.latest_d,
                zone: zone.label().to_string(),
                decision: zone.advice().to_string(),
            })
            .map_err(CoreError::from)?;

        let decision = self
            .engine
            .decide(
                today,
                symbol,
                signal.as_ref(),
                oscillator,
                price,
                &self.brokerage,
                &self.ledger,
            )
            .await?;

        Ok(decision)
    }
}
