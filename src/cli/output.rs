//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::resolver::ConflictView;
use crate::secrets::SecretType;
use crate::sync::{PullReport, SyncReport};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One line of `keeper list`.
pub struct SecretRow {
    pub kind: SecretType,
    pub name: String,
    pub meta: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Print a table of cached secrets (Type, Name, Meta, Updated).
pub fn print_secrets_table(rows: &[SecretRow]) {
    if rows.is_empty() {
        info("No secrets in the local cache yet.");
        tip("Run `keeper add-text <NAME>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Name", "Meta", "Updated"]);

    for row in rows {
        table.add_row(vec![
            row.kind.to_string(),
            row.name.clone(),
            row.meta.clone().unwrap_or_default(),
            timestamp(&row.updated_at),
        ]);
    }

    println!("{table}");
}

/// Print labelled fields as a two-column table.
pub fn print_fields(fields: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in fields {
        table.add_row(vec![(*label).to_string(), value.clone()]);
    }
    println!("{table}");
}

/// Print both sides of a conflict next to each other.
pub fn print_conflict(conflict: &ConflictView) {
    println!(
        "{} {} '{}' changed on both sides",
        style("\u{26a0}").yellow().bold(),
        conflict.secret_type,
        style(&conflict.secret_name).bold()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "local (client)", "server"]);

    for ((label, local), (_, remote)) in conflict.local.fields.iter().zip(&conflict.remote.fields) {
        table.add_row(vec![(*label).to_string(), local.clone(), remote.clone()]);
    }
    table.add_row(vec![
        "meta".to_string(),
        conflict.local.meta.clone().unwrap_or_default(),
        conflict.remote.meta.clone().unwrap_or_default(),
    ]);
    table.add_row(vec![
        "updated".to_string(),
        timestamp(&conflict.local.updated_at),
        timestamp(&conflict.remote.updated_at),
    ]);

    println!("{table}");
}

/// Summarise one sync run.
pub fn print_sync_report(report: &SyncReport) {
    if report.pushed.is_empty() && report.skipped.is_empty() {
        info(&format!("{}: nothing cached", report.kind));
        return;
    }
    success(&format!(
        "{}: {} pushed, {} kept on server",
        report.kind,
        report.pushed.len(),
        report.skipped.len()
    ));
    for name in &report.pushed {
        println!("  {} {name}", style("\u{2191}").green());
    }
}

/// Summarise one pull run.
pub fn print_pull_report(report: &PullReport) {
    success(&format!(
        "{}: {} updated, {} already current",
        report.kind,
        report.merged.len(),
        report.unchanged.len()
    ));
    for name in &report.merged {
        println!("  {} {name}", style("\u{2193}").green());
    }
}
