use serde_json::Value;

use bullseye_ledger::Ledger;

use crate::cli::ShowCommand;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn run(command: &ShowCommand) -> Result<CommandResult, CliError> {
    let ledger = Ledger::open_default()?;

    let data: Value = match command {
        ShowCommand::Trades { date: Some(date) } => serde_json::to_value(ledger.trades_on(date)?)?,
        ShowCommand::Trades { date: None } => serde_json::to_value(ledger.list_trades()?)?,
        ShowCommand::Analysis => serde_json::to_value(ledger.analysis_rows()?)?,
        ShowCommand::Signals => serde_json::to_value(ledger.signal_rows()?)?,
    };

    Ok(CommandResult::ok(data))
}
