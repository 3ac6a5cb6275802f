//! `keeper add-text` — store a text note in the local cache.

use std::io::{self, IsTerminal, Read};

use crate::cli::{store_secret, Cli};
use crate::errors::{KeeperError, Result};
use crate::secrets::Text;

/// Execute the `add-text` command.
pub fn execute(cli: &Cli, name: &str, content: Option<&str>, meta: Option<&str>) -> Result<()> {
    // Inline value, then piped stdin, then an interactive prompt.
    let content = if let Some(c) = content {
        c.to_string()
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end().to_string()
    } else {
        dialoguer::Input::<String>::new()
            .with_prompt(format!("Text for {name}"))
            .interact_text()
            .map_err(|e| KeeperError::CommandFailed(format!("input prompt: {e}")))?
    };

    store_secret(cli, name, Text { content }, meta)
}
