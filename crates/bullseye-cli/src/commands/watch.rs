use serde_json::json;

use bullseye_core::Symbol;
use bullseye_ledger::Ledger;

use crate::cli::WatchCommand;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn run(command: &WatchCommand) -> Result<CommandResult, CliError> {
    let ledger = Ledger::open_default()?;

    match command {
        WatchCommand::Add { symbols } => {
            let symbols = symbols
                .iter()
                .map(|raw| Symbol::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;

            let mut added = Vec::new();
            let mut already_watched = Vec::new();
            for symbol in &symbols {
                if ledger.add_watch(symbol.as_str())? {
                    added.push(symbol.to_string());
                } else {
                    already_watched.push(symbol.to_string());
                }
            }

            Ok(CommandResult::ok(json!({
                "added": added,
                "already_watched": already_watched,
            })))
        }
        WatchCommand::Remove { symbol } => {
            let symbol = Symbol::parse(symbol)?;
            let removed = ledger.remove_watch(symbol.as_str())?;
            if !removed {
                return Err(CliError::Command(format!("{symbol} is not on the watchlist")));
            }
            Ok(CommandResult::ok(json!({ "removed": symbol.to_string() })))
        }
        WatchCommand::List => {
            let symbols = ledger.watchlist()?;
            Ok(CommandResult::ok(json!({ "watchlist": symbols })))
        }
        WatchCommand::Clear => {
            let removed = ledger.clear_watchlist()?;
            Ok(CommandResult::ok(json!({ "removed": removed })))
        }
    }
}
