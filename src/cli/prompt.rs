//! Terminal choice provider for interactive sync.

use dialoguer::Input;

use crate::cli::output;
use crate::errors::{KeeperError, Result};
use crate::resolver::{Choice, ChoiceProvider, ConflictView};

/// Shows the conflict and asks on the terminal, re-asking on bad input.
///
/// Only used when stdin is a terminal; piped input goes through the
/// strict `LineChoiceProvider` instead.
pub struct TerminalChoiceProvider;

impl ChoiceProvider for TerminalChoiceProvider {
    fn choose(&mut self, conflict: &ConflictView) -> Result<String> {
        output::print_conflict(conflict);

        Input::<String>::new()
            .with_prompt("Keep which version? [server/client]")
            .default("server".to_string())
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                Choice::parse(input)
                    .map(|_| ())
                    .map_err(|_| "type 'server' or 'client'".to_string())
            })
            .interact_text()
            .map_err(|e| KeeperError::CommandFailed(format!("choice prompt: {e}")))
    }
}
