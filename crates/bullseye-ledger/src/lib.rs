//! # Bullseye Ledger
//!
//! DuckDB-based persistence for the bullseye swing-trade assistant.
//!
//! The ledger is the durable record the decision engine reads and writes:
//! every simulated order, the latest oscillator analysis per symbol, the
//! latest scraped signal per symbol, and the watchlist itself.
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `trade_log` | One row per (date, action, symbol) order decision |
//! | `stock_analysis` | Latest price/oscillator/zone snapshot per symbol |
//! | `signal_info` | Latest scraped signal per symbol |
//! | `watchlist` | Symbols included in each run |
//!
//! ## Security
//!
//! All user input is handled through parameterized queries; symbols and
//! signal text are never interpolated into SQL.

pub mod migrations;
pub mod pool;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use thiserror::Error;

pub use pool::{ConnectionManager, PooledConnection};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration for the ledger database.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Root directory for bullseye data.
    pub bullseye_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections to keep around.
    pub max_idle_connections: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let bullseye_home = resolve_bullseye_home();
        let db_path = bullseye_home.join("ledger.duckdb");
        Self {
            bullseye_home,
            db_path,
            max_idle_connections: 2,
        }
    }
}

/// A trade decision recorded in the log.
///
/// `trade_date` is a zero-padded `MM/DD` string so rows compare directly
/// against scraped signal dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeLogRow {
    pub trade_date: String,
    pub action: String,
    pub symbol: String,
    pub price: f64,
    pub shares: f64,
    pub zone: String,
    pub indicator_value: Option<f64>,
    pub executed: bool,
}

/// Latest analysis snapshot for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub symbol: String,
    pub price: f64,
    pub percent_k: Option<f64>,
    pub percent_d: Option<f64>,
    pub zone: String,
    pub decision: String,
}

/// Latest scraped signal for a symbol.
///
/// `price`, `change_pct`, and `raw_value` hold the site's text verbatim,
/// with `"N/A"` standing in for fields the page did not provide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalInfoRow {
    pub symbol: String,
    pub signal: String,
    pub signal_date: String,
    pub price: String,
    pub change_pct: String,
    pub raw_value: String,
}

/// The persistent store backing the decision engine.
#[derive(Clone)]
pub struct Ledger {
    manager: ConnectionManager,
}

impl Ledger {
    /// Open the ledger with default configuration.
    pub fn open_default() -> Result<Self, LedgerError> {
        Self::open(LedgerConfig::default())
    }

    /// Open the ledger with the specified configuration.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = ConnectionManager::new(config.db_path.clone(), config.max_idle_connections);
        let ledger = Self { manager };
        ledger.initialize()?;
        Ok(ledger)
    }

    /// Initialize the database schema.
    pub fn initialize(&self) -> Result<(), LedgerError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Check whether a trade has already been recorded for this
    /// (date, action, symbol) triple.
    pub fn trade_exists(
        &self,
        trade_date: &str,
        action: &str,
        symbol: &str,
    ) -> Result<bool, LedgerError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 3] = [&trade_date, &action, &symbol];
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM trade_log \
             WHERE trade_date = ? AND action = ? AND symbol = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert or replace a trade log row.
    ///
    /// Replaying the same (date, action, symbol) triple updates the row in
    /// place rather than appending a duplicate.
    pub fn upsert_trade(&self, row: &TradeLogRow) -> Result<(), LedgerError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 8] = [
            &row.trade_date,
            &row.action,
            &row.symbol,
            &row.price,
            &row.shares,
            &row.zone,
            &row.indicator_value,
            &row.executed,
        ];
        connection.execute(
            "INSERT OR REPLACE INTO trade_log \
             (trade_date, action, symbol, price, shares, zone, indicator_value, executed, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Insert or replace the analysis snapshot for a symbol.
    pub fn upsert_analysis(&self, row: &AnalysisRow) -> Result<(), LedgerError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 6] = [
            &row.symbol,
            &row.price,
            &row.percent_k,
            &row.percent_d,
            &row.zone,
            &row.decision,
        ];
        connection.execute(
            "INSERT OR REPLACE INTO stock_analysis \
             (symbol, price, percent_k, percent_d, zone, decision, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Insert or replace the latest scraped signal for a symbol.
    pub fn upsert_signal_info(&self, row: &SignalInfoRow) -> Result<(), LedgerError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 6] = [
            &row.symbol,
            &row.signal,
            &row.signal_date,
            &row.price,
            &row.change_pct,
            &row.raw_value,
        ];
        connection.execute(
            "INSERT OR REPLACE INTO signal_info \
             (symbol, signal, signal_date, price, change_pct, raw_value, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// List all recorded trades, newest update first.
    pub fn list_trades(&self) -> Result<Vec<TradeLogRow>, LedgerError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT trade_date, action, symbol, price, shares, zone, indicator_value, executed \
             FROM trade_log ORDER BY updated_at DESC, symbol ASC",
        )?;
        let rows = statement
            .query_map([], read_trade_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List trades recorded for a specific `MM/DD` date.
    pub fn trades_on(&self, trade_date: &str) -> Result<Vec<TradeLogRow>, LedgerError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT trade_date, action, symbol, price, shares, zone, indicator_value, executed \
             FROM trade_log WHERE trade_date = ? ORDER BY symbol ASC",
        )?;
        let params: [&dyn ToSql; 1] = [&trade_date];
        let rows = statement
            .query_map(params.as_slice(), read_trade_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List the latest analysis snapshot for every symbol.
    pub fn analysis_rows(&self) -> Result<Vec<AnalysisRow>, LedgerError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, price, percent_k, percent_d, zone, decision \
             FROM stock_analysis ORDER BY symbol ASC",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok(AnalysisRow {
                    symbol: row.get(0)?,
                    price: row.get(1)?,
                    percent_k: row.get(2)?,
                    percent_d: row.get(3)?,
                    zone: row.get(4)?,
                    decision: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List the latest scraped signal for every symbol.
    pub fn signal_rows(&self) -> Result<Vec<SignalInfoRow>, LedgerError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, signal, signal_date, price, change_pct, raw_value \
             FROM signal_info ORDER BY symbol ASC",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok(SignalInfoRow {
                    symbol: row.get(0)?,
                    signal: row.get(1)?,
                    signal_date: row.get(2)?,
                    price: row.get(3)?,
                    change_pct: row.get(4)?,
                    raw_value: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Add a symbol to the watchlist. Returns false if it was already present.
    pub fn add_watch(&self, symbol: &str) -> Result<bool, LedgerError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 1] = [&symbol];
        let inserted = connection.execute(
            "INSERT OR IGNORE INTO watchlist (symbol) VALUES (?)",
            params.as_slice(),
        )?;
        Ok(inserted > 0)
    }

    /// Remove a symbol from the watchlist, scrubbing its analysis and signal
    /// rows in the same transaction. Returns false if it was not watched.
    pub fn remove_watch(&self, symbol: &str) -> Result<bool, LedgerError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<bool, LedgerError> {
            let params: [&dyn ToSql; 1] = [&symbol];
            let removed = connection.execute(
                "DELETE FROM watchlist WHERE symbol = ?",
                params.as_slice(),
            )?;
            connection.execute(
                "DELETE FROM stock_analysis WHERE symbol = ?",
                params.as_slice(),
            )?;
            connection.execute(
                "DELETE FROM signal_info WHERE symbol = ?",
                params.as_slice(),
            )?;
            Ok(removed > 0)
        })();

        finalize_transaction(&connection, result)
    }

    /// List watched symbols in insertion order.
    pub fn watchlist(&self) -> Result<Vec<String>, LedgerError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection
            .prepare("SELECT symbol FROM watchlist ORDER BY added_at ASC, symbol ASC")?;
        let rows = statement
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Remove every watched symbol. Returns the number of symbols removed.
    pub fn clear_watchlist(&self) -> Result<usize, LedgerError> {
        let connection = self.manager.acquire()?;
        let removed = connection.execute("DELETE FROM watchlist", [])?;
        Ok(removed)
    }
}

fn read_trade_row(row: &::duckdb::Row<'_>) -> Result<TradeLogRow, ::duckdb::Error> {
    Ok(TradeLogRow {
        trade_date: row.get(0)?,
        action: row.get(1)?,
        symbol: row.get(2)?,
        price: row.get(3)?,
        shares: row.get(4)?,
        zone: row.get(5)?,
        indicator_value: row.get(6)?,
        executed: row.get(7)?,
    })
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the bullseye home directory from environment or default.
pub fn resolve_bullseye_home() -> PathBuf {
    if let Some(path) = env::var_os("BULLSEYE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".bullseye");
    }

    PathBuf::from(".bullseye")
}
