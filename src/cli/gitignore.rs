//! Keeps key material and the cache out of version control.
//!
//! `keygen` calls this with the private key and cache paths.

use std::fs;
use std::path::Path;

/// Append each missing entry to `<project_dir>/.gitignore`.
///
/// Creates the file if needed and returns the entries that were added.
/// Write failures yield an empty list; ignoring files is a convenience.
pub fn ignore_paths(project_dir: &Path, entries: &[&str]) -> Vec<String> {
    let gitignore_path = project_dir.join(".gitignore");
    let mut content = fs::read_to_string(&gitignore_path).unwrap_or_default();

    let mut added = Vec::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() || content.lines().any(|line| line.trim() == entry) {
            continue;
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(entry);
        content.push('\n');
        added.push(entry.to_string());
    }

    if added.is_empty() || fs::write(&gitignore_path, content).is_err() {
        return Vec::new();
    }
    added
}
