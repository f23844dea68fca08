mod batch;
mod show;
mod watch;

use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Payload a command hands to the output layer.
#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self { data }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Watch(command) => watch::run(command),
        Command::Run(args) => batch::run(args).await,
        Command::Show(command) => show::run(command),
    }
}
