//! # Bullseye Core
//!
//! Signal scraping, stochastic analysis, and trade decisions for the
//! bullseye swing-trade assistant.
//!
//! ## Overview
//!
//! A batch run walks the watchlist one symbol at a time: scrape the
//! latest signal, pull a daily price history, compute the stochastic
//! oscillator, classify the zone, and apply the decision rule. Every
//! step records its outcome in the [`bullseye_ledger`] database.
//!
//! ### Modules
//!
//! - [`domain`] — validated symbols, dates, bars, signals, decisions
//! - [`http_client`] — transport trait with reqwest and no-op impls
//! - [`session`] — persisted browsing identity (UA, viewport, cookies)
//! - [`sites`] / [`extract`] — URL templates and HTML table extraction
//! - [`fetch`] — single-attempt page fetcher with jittered pacing
//! - [`oscillator`] — stochastic %K/%D over daily bars
//! - [`brokerage`] — price/position/order boundary with a paper impl
//! - [`signal_source`] — live (scraped) and simulated signal suppliers
//! - [`decision`] — the buy/sell/hold rule and trade-log writes
//! - [`pipeline`] — sequential batch runner with failure isolation

pub mod brokerage;
pub mod decision;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http_client;
pub mod oscillator;
pub mod pipeline;
pub mod session;
pub mod signal_source;
pub mod sites;

pub use domain::{
    DailyBar, OscillatorResult, PriceSeries, SignalRecord, Symbol, TradeAction, TradeDate,
    TradeDecision, Zone, NOT_AVAILABLE,
};
pub use error::{CoreError, ValidationError};
