//! Completions command - Print a shell completion script for `vaultsync`

use std::io::Write;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use super::CliContext;

/// Completions command
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Target shell (bash, zsh, fish, elvish, powershell)
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub async fn execute(&self, _ctx: &CliContext) -> Result<()> {
        write_script(self.shell, &mut std::io::stdout().lock());
        Ok(())
    }
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = crate::Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
}
