//! `keeper add-binary` — store a file's bytes in the local cache.

use std::path::Path;

use crate::cli::{store_secret, Cli};
use crate::errors::{KeeperError, Result};
use crate::secrets::Binary;

/// Largest file accepted, since the whole file travels in one request.
const MAX_BINARY_BYTES: u64 = 16 * 1024 * 1024;

/// Execute the `add-binary` command.
pub fn execute(cli: &Cli, name: &str, file: &Path, meta: Option<&str>) -> Result<()> {
    let size = std::fs::metadata(file)?.len();
    if size > MAX_BINARY_BYTES {
        return Err(KeeperError::CommandFailed(format!(
            "{} is {size} bytes; the limit is {MAX_BINARY_BYTES}",
            file.display()
        )));
    }

    let data = std::fs::read(file)?;
    store_secret(cli, name, Binary { data }, meta)
}
