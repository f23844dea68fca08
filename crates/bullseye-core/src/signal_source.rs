//! Where daily trade signals come from.
//!
//! The live source scrapes the signal site; the simulated source rolls a
//! coin. Which one a batch uses is an explicit caller choice, so live and
//! simulated data can never mix silently within a run.

use std::future::Future;
use std::pin::Pin;

use crate::fetch::{FetchError, PageFetcher};
use crate::session::SessionState;
use crate::{extract, sites, SignalRecord, Symbol, TradeDate, NOT_AVAILABLE};

/// Supplier of the most recent signal for a symbol.
pub trait SignalSource: Send {
    fn latest_signal<'a>(
        &'a mut self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SignalRecord>, FetchError>> + Send + 'a>>;

    /// Session state to persist after a batch, if this source carries one.
    fn session_state(&self) -> Option<SessionState> {
        None
    }
}

/// Scrapes the per-symbol signal history page and returns its newest row.
pub struct LiveSignalSource {
    fetcher: PageFetcher,
}

impl LiveSignalSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

impl SignalSource for LiveSignalSource {
    fn latest_signal<'a>(
        &'a mut self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SignalRecord>, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let url = sites::signal_page_url(symbol);
            let html = self.fetcher.fetch_page(&url).await?;
            let rows = extract::extract_signal_history(&html);

            // History tables list the newest signal first.
            Ok(rows.into_iter().next().map(|row| SignalRecord {
                symbol: symbol.clone(),
                signal_date: row.date,
                signal: row.signal,
                price: row.price,
                change_pct: row.change_pct,
                raw_value: row.value,
            }))
        })
    }

    fn session_state(&self) -> Option<SessionState> {
        Some(self.fetcher.session().clone())
    }
}

/// Coin-flip BUY/SELL signal stamped with today's date.
#[derive(Debug, Default)]
pub struct SimulatedSignalSource;

impl SignalSource for SimulatedSignalSource {
    fn latest_signal<'a>(
        &'a mut self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SignalRecord>, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let signal = if fastrand::bool() { "BUY" } else { "SELL" };
            Ok(Some(SignalRecord {
                symbol: symbol.clone(),
                signal_date: TradeDate::today().display_md(),
                signal: signal.to_string(),
                price: NOT_AVAILABLE.to_string(),
                change_pct: NOT_AVAILABLE.to_string(),
                raw_value: NOT_AVAILABLE.to_string(),
            }))
        })
    }
}
