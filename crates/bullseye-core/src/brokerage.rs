//! Brokerage boundary: prices, positions, and market orders.
//!
//! The trait is the contract; no real brokerage transport ships here.
//! `PaperBrokerage` produces deterministic per-symbol fake data so dry
//! runs and tests behave identically run to run.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use thiserror::Error;

use crate::{DailyBar, PriceSeries, Symbol, TradeDate};

/// Direction of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Failure talking to the brokerage or placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("brokerage error for {symbol}: {reason}")]
pub struct OrderError {
    pub symbol: Symbol,
    pub reason: String,
}

impl OrderError {
    pub fn new(symbol: Symbol, reason: impl Into<String>) -> Self {
        Self {
            symbol,
            reason: reason.into(),
        }
    }
}

/// A held position.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: Symbol,
    pub quantity: f64,
}

/// Brokerage contract used by the decision engine and pipeline.
pub trait Brokerage: Send + Sync {
    fn latest_price<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<f64, OrderError>> + Send + 'a>>;

    fn price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
        days: usize,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, OrderError>> + Send + 'a>>;

    fn holdings<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Holding>, OrderError>> + Send + 'a>>;

    fn place_market_order<'a>(
        &'a self,
        symbol: &'a Symbol,
        side: OrderSide,
        quantity: f64,
    ) -> Pin<Box<dyn Future<Output = Result<(), OrderError>> + Send + 'a>>;
}

/// In-memory brokerage with deterministic seeded market data.
///
/// Prices derive from a hash of the symbol text, so the same symbol
/// always sees the same price path.
#[derive(Debug, Default)]
pub struct PaperBrokerage {
    positions: Mutex<BTreeMap<Symbol, f64>>,
}

impl PaperBrokerage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a starting position, for tests and sell scenarios.
    pub fn with_position(self, symbol: Symbol, quantity: f64) -> Self {
        self.positions
            .lock()
            .expect("paper brokerage positions mutex poisoned")
            .insert(symbol, quantity);
        self
    }

    pub fn position(&self, symbol: &Symbol) -> f64 {
        self.positions
            .lock()
            .expect("paper brokerage positions mutex poisoned")
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }

    fn quote(symbol: &Symbol) -> f64 {
        let seed = symbol_seed(symbol);
        40.0 + (seed % 2_200) as f64 / 10.0
    }
}

impl Brokerage for PaperBrokerage {
    fn latest_price<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<f64, OrderError>> + Send + 'a>> {
        Box::pin(async move { Ok(Self::quote(symbol)) })
    }

    fn price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
        days: usize,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, OrderError>> + Send + 'a>> {
        Box::pin(async move {
            let seed = symbol_seed(symbol);
            let today = TradeDate::today();
            let mut bars = Vec::with_capacity(days);

            for index in 0..days {
                let date = today.days_before(days.saturating_sub(index + 1) as i64);
                let base = 40.0 + ((seed + index as u64 * 7) % 2_200) as f64 / 10.0;
                let bar = DailyBar::new(date, base, base + 1.20, (base - 0.80).max(0.0), base + 0.30)
                    .map_err(|error| OrderError::new(symbol.clone(), error.to_string()))?;
                bars.push(bar);
            }

            Ok(PriceSeries::new(symbol.clone(), bars))
        })
    }

    fn holdings<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Holding>, OrderError>> + Send + 'a>> {
        Box::pin(async move {
            let positions = self
                .positions
                .lock()
                .expect("paper brokerage positions mutex poisoned");
            Ok(positions
                .iter()
                .map(|(symbol, quantity)| Holding {
                    symbol: symbol.clone(),
                    quantity: *quantity,
                })
                .collect())
        })
    }

    fn place_market_order<'a>(
        &'a self,
        symbol: &'a Symbol,
        side: OrderSide,
        quantity: f64,
    ) -> Pin<Box<dyn Future<Output = Result<(), OrderError>> + Send + 'a>> {
        Box::pin(async move {
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err(OrderError::new(
                    symbol.clone(),
                    format!("order quantity must be positive, got {quantity}"),
                ));
            }

            let mut positions = self
                .positions
                .lock()
                .expect("paper brokerage positions mutex poisoned");
            let held = positions.get(symbol).copied().unwrap_or(0.0);
            match side {
                OrderSide::Buy => {
                    positions.insert(symbol.clone(), held + quantity);
                }
                OrderSide::Sell => {
                    if quantity > held {
                        return Err(OrderError::new(
                            symbol.clone(),
                            format!("cannot sell {quantity} with only {held} held"),
                        ));
                    }
                    positions.insert(symbol.clone(), held - quantity);
                }
            }
            Ok(())
        })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}
