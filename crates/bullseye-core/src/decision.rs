//! The trade decision rule.
//!
//! A trade happens only when three things line up on the same day: the
//! scraped signal is dated today, the signal direction matches, and the
//! oscillator zone agrees (BUY needs Oversold, SELL needs Overbought).
//! Everything else is a Hold. The rule also owns the trade-log write, so
//! replaying a day can never produce duplicate rows.

use bullseye_ledger::{Ledger, TradeLogRow};

use crate::brokerage::{Brokerage, OrderSide};
use crate::{
    CoreError, OscillatorResult, SignalRecord, Symbol, TradeAction, TradeDate, TradeDecision,
    ValidationError, Zone,
};

/// Dollar amount targeted per buy order.
pub const DEFAULT_NOTIONAL: f64 = 250.0;

const SHARE_PRECISION: f64 = 1e6;

/// Applies the decision rule and records the outcome.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    notional: f64,
}

impl DecisionEngine {
    pub fn new(notional: f64) -> Result<Self, ValidationError> {
        if !notional.is_finite() || notional <= 0.0 {
            return Err(ValidationError::InvalidNotional { value: notional });
        }
        Ok(Self { notional })
    }

    pub fn notional(&self) -> f64 {
        self.notional
    }

    /// Decide and record the action for one symbol on one day.
    ///
    /// Buy and Sell decisions write a trade-log row; a repeat decision for
    /// the same (day, action, symbol) updates that row in place with
    /// `executed = false` and places no order. Order failures are recorded
    /// the same way and never propagate.
    pub async fn decide(
        &self,
        today: TradeDate,
        symbol: &Symbol,
        signal: Option<&SignalRecord>,
        oscillator: OscillatorResult,
        price: f64,
        brokerage: &dyn Brokerage,
        ledger: &Ledger,
    ) -> Result<TradeDecision, CoreError> {
        let zone = oscillator.zone();
        let indicator_value = oscillator.latest_k;

        let action = match signal {
            Some(record) if record.is_for(today) => {
                if record.is_buy() && zone == Zone::Oversold {
                    TradeAction::Buy
                } else if record.is_sell() && zone == Zone::Overbought {
                    TradeAction::Sell
                } else {
                    TradeAction::Hold
                }
            }
            _ => TradeAction::Hold,
        };

        let mut decision = TradeDecision {
            date: today,
            action,
            symbol: symbol.clone(),
            price,
            shares: 0.0,
            zone,
            indicator_value,
            executed: false,
        };

        let side = match action {
            TradeAction::Buy => {
                if price.is_finite() && price > 0.0 {
                    decision.shares = round_shares(self.notional / price);
                }
                OrderSide::Buy
            }
            TradeAction::Sell => {
                let held = match brokerage.holdings().await {
                    Ok(holdings) => holdings
                        .into_iter()
                        .find(|holding| &holding.symbol == symbol)
                        .map(|holding| holding.quantity)
                        .unwrap_or(0.0),
                    Err(error) => {
                        tracing::warn!(symbol = %symbol, %error, "holdings lookup failed, assuming none held");
                        0.0
                    }
                };
                decision.shares = held;
                OrderSide::Sell
            }
            TradeAction::Hold => {
                tracing::debug!(symbol = %symbol, zone = %zone, "signal and zone do not line up, holding");
                return Ok(decision);
            }
        };

        let already_recorded =
            ledger.trade_exists(&today.display_md(), action.as_str(), symbol.as_str())?;

        if already_recorded {
            tracing::info!(symbol = %symbol, action = %action, "decision already recorded today, updating in place");
        } else if decision.shares <= 0.0 {
            tracing::warn!(symbol = %symbol, action = %action, "nothing to trade, recording unexecuted decision");
        } else {
            match brokerage
                .place_market_order(symbol, side, decision.shares)
                .await
            {
                Ok(()) => {
                    decision.executed = true;
                    tracing::info!(
                        symbol = %symbol,
                        action = %action,
                        shares = decision.shares,
                        price,
                        "order placed"
                    );
                }
                Err(error) => {
                    tracing::warn!(symbol = %symbol, %error, "order failed, recording unexecuted decision");
                }
            }
        }

        ledger.upsert_trade(&TradeLogRow {
            trade_date: today.display_md(),
            action: action.as_str().to_string(),
            symbol: symbol.as_str().to_string(),
            price,
            shares: decision.shares,
            zone: zone.label().to_string(),
            indicator_value,
            executed: decision.executed,
        })?;

        Ok(decision)
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            notional: DEFAULT_NOTIONAL,
        }
    }
}

/// Round a share quantity to six decimal places.
pub fn round_shares(value: f64) -> f64 {
    (value * SHARE_PRECISION).round() / SHARE_PRECISION
}
