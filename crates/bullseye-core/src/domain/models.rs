use serde::{Deserialize, Serialize};

use crate::{Symbol, TradeDate, ValidationError};

/// Sentinel for fields a scraped page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Daily OHLC bar used as oscillator input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: TradeDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DailyBar {
    pub fn new(
        date: TradeDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
        })
    }
}

/// Chronologically ordered daily bars for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub bars: Vec<DailyBar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, bars: Vec<DailyBar>) -> Self {
        Self { symbol, bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing price of the most recent bar.
    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }
}

/// A scraped trade signal, kept as the site published it.
///
/// Text fields are raw page text after whitespace normalization; absent
/// fields carry [`NOT_AVAILABLE`]. `signal_date` stays a string because
/// the site publishes `MM/DD` without a year and the engine compares it
/// textually against today's `MM/DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: Symbol,
    pub signal_date: String,
    pub signal: String,
    pub price: String,
    pub change_pct: String,
    pub raw_value: String,
}

impl SignalRecord {
    pub fn is_buy(&self) -> bool {
        self.signal.contains("BUY")
    }

    pub fn is_sell(&self) -> bool {
        self.signal.contains("SELL")
    }

    /// Whether the signal is dated `date` (textual `MM/DD` comparison).
    pub fn is_for(&self, date: TradeDate) -> bool {
        self.signal_date == date.display_md()
    }
}

/// Latest stochastic oscillator components.
///
/// Both components are `None` when the indicator is undefined for the
/// input series (too short, empty, or a degenerate flat window).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OscillatorResult {
    pub latest_k: Option<f64>,
    pub latest_d: Option<f64>,
}

impl OscillatorResult {
    /// Classify into a zone. Undefined components win over everything,
    /// then Overbought, then Oversold, then Neutral.
    pub fn zone(&self) -> Zone {
        let (Some(k), Some(d)) = (self.latest_k, self.latest_d) else {
            return Zone::Unknown;
        };
        if k > 80.0 || d > 80.0 {
            Zone::Overbought
        } else if k < 20.0 || d < 20.0 {
            Zone::Oversold
        } else {
            Zone::Neutral
        }
    }
}

/// Oscillator zone classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Overbought,
    Neutral,
    Oversold,
    Unknown,
}

impl Zone {
    /// Human-readable zone label, stored verbatim in the ledger.
    pub fn label(self) -> &'static str {
        match self {
            Zone::Overbought => "Red Zone: Overbought - Potential Sell Opportunity",
            Zone::Neutral => "Neutral Zone: Hold Phase",
            Zone::Oversold => "Green Zone: Oversold - Potential Buy Opportunity",
            Zone::Unknown => "Unknown",
        }
    }

    /// Advisory text recorded next to each analysis row.
    pub fn advice(self) -> &'static str {
        match self {
            Zone::Overbought => "Consider Selling",
            Zone::Oversold => "Consider Buying",
            Zone::Neutral | Zone::Unknown => "Hold",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Action the decision engine settled on for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running the decision rule for one symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeDecision {
    pub date: TradeDate,
    pub action: TradeAction,
    pub symbol: Symbol,
    pub price: f64,
    pub shares: f64,
    pub zone: Zone,
    pub indicator_value: Option<f64>,
    pub executed: bool,
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
