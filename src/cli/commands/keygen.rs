//! `keeper keygen` — create the RSA key pair secrets are sealed with.

use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{gitignore, load_settings, project_dir, Cli};
use crate::crypto::keys::{write_key_pair, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use crate::errors::Result;

/// Execute the `keygen` command.
pub fn execute(cli: &Cli, out: Option<&Path>, bits: usize) -> Result<()> {
    let cwd = project_dir()?;
    let settings = load_settings(cli)?;

    let dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => settings
            .private_key_path(&cwd)
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf),
    };

    output::info(&format!("Generating a {bits}-bit RSA key pair…"));
    let (private_path, public_path) = write_key_pair(&dir, bits)?;

    output::success(&format!("Private key: {}", private_path.display()));
    output::success(&format!("Public key:  {}", public_path.display()));
    output::warning("Back up the private key. Server copies cannot be opened without it.");

    if private_path != settings.private_key_path(&cwd)
        || public_path != settings.public_key_path(&cwd)
    {
        output::tip(&format!(
            "Point `private_key` and `public_key` in .keeper.toml at {PRIVATE_KEY_FILE} and {PUBLIC_KEY_FILE} in {}",
            dir.display()
        ));
    }

    let cache_path = cli
        .cache
        .clone()
        .unwrap_or_else(|| settings.cache_path(&cwd));
    let entries: Vec<String> = [private_path, cache_path]
        .iter()
        .filter_map(|path| relative_to(path, &cwd))
        .collect();
    let entries: Vec<&str> = entries.iter().map(String::as_str).collect();
    for entry in gitignore::ignore_paths(&cwd, &entries) {
        output::info(&format!("Added '{entry}' to .gitignore"));
    }

    Ok(())
}

/// Path inside `root`, as a `.gitignore` entry.
fn relative_to(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(PathBuf::from)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}
