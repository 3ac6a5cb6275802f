//! Local secret cache — one SQLite table per secret type.
//!
//! Every table is keyed by `(owner, secret_name)` and has one column
//! per payload field plus `meta` and `updated_at`.  Writes are upserts
//! ("insert, on key conflict overwrite all non-key columns"), so the
//! cache never holds two rows for the same secret.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::errors::{KeeperError, Result};
use crate::secrets::{
    BankCard, Binary, Credentials, SecretPayload, SecretRecord, SecretType, Text,
};

/// Columns shared by every table, in SELECT order.
const BASE_COLUMNS: &str = "owner, secret_name, meta, updated_at";

/// Number of shared columns preceding the payload columns.
const PAYLOAD_OFFSET: usize = 4;

/// SQLite-backed cache of one owner's secrets.
pub struct SecretCache {
    conn: Connection,
    owner: String,
}

impl SecretCache {
    /// Open (or create) the cache database at `path` for `owner`.
    ///
    /// Creates the parent directory and all four tables if needed.
    pub fn open(path: &Path, owner: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Set restrictive permissions on the cache database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Self::init(conn, owner)
    }

    /// Open a throwaway in-memory cache.
    pub fn open_in_memory(owner: &str) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, owner)
    }

    fn init(conn: Connection, owner: &str) -> Result<Self> {
        if owner.trim().is_empty() {
            return Err(KeeperError::ConfigError("owner cannot be empty".into()));
        }
        let cache = Self {
            conn,
            owner: owner.to_string(),
        };
        cache.create_table::<BankCard>()?;
        cache.create_table::<Text>()?;
        cache.create_table::<Binary>()?;
        cache.create_table::<Credentials>()?;
        Ok(cache)
    }

    fn create_table<P: SecretPayload>(&self) -> Result<()> {
        let payload_columns: Vec<String> = P::COLUMNS
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                owner       TEXT NOT NULL,
                secret_name TEXT NOT NULL,
                {payload},
                meta        TEXT,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (owner, secret_name)
            );",
            table = P::KIND.table(),
            payload = payload_columns.join(",\n                "),
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// The owner this cache is scoped to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Insert or fully replace a secret, stamping `updated_at` with now.
    ///
    /// Returns the timestamp that was written.
    pub fn upsert<P: SecretPayload>(&self, record: &SecretRecord<P>) -> Result<DateTime<Utc>> {
        self.check_owner(record)?;
        let now = Utc::now();
        self.write(record, now, false)?;
        debug!(kind = %P::KIND, name = %record.secret_name, "cached secret");
        Ok(now)
    }

    /// Store a version fetched from the server, keeping its timestamp.
    ///
    /// Only overwrites an existing row when the incoming `updated_at` is
    /// strictly newer, so the storage layer itself enforces
    /// last-writer-wins.  Returns `true` if the row was written.
    pub fn merge_remote<P: SecretPayload>(&self, record: &SecretRecord<P>) -> Result<bool> {
        self.check_owner(record)?;
        let written = self.write(record, record.updated_at, true)?;
        debug!(kind = %P::KIND, name = %record.secret_name, written, "merged remote secret");
        Ok(written)
    }

    /// Fetch one secret.  A missing secret is `Ok(None)`, never an error.
    pub fn get<P: SecretPayload>(&self, secret_name: &str) -> Result<Option<SecretRecord<P>>> {
        let sql = format!(
            "SELECT {BASE_COLUMNS}, {payload} FROM {table}
             WHERE owner = ?1 AND secret_name = ?2",
            payload = payload_column_list::<P>(),
            table = P::KIND.table(),
        );
        let record = self
            .conn
            .query_row(&sql, params![self.owner, secret_name], read_record::<P>)
            .optional()?;
        Ok(record)
    }

    /// All secrets of one type, ordered by name.
    pub fn list<P: SecretPayload>(&self) -> Result<Vec<SecretRecord<P>>> {
        let sql = format!(
            "SELECT {BASE_COLUMNS}, {payload} FROM {table}
             WHERE owner = ?1
             ORDER BY secret_name",
            payload = payload_column_list::<P>(),
            table = P::KIND.table(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![self.owner], read_record::<P>)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Remove a secret.  Deleting a missing name is a no-op.
    ///
    /// Returns `true` if a row was removed.
    pub fn delete(&self, kind: SecretType, secret_name: &str) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {table} WHERE owner = ?1 AND secret_name = ?2",
            table = kind.table()
        );
        let removed = self.conn.execute(&sql, params![self.owner, secret_name])?;
        Ok(removed > 0)
    }

    /// Number of secrets of one type.
    pub fn count(&self, kind: SecretType) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE owner = ?1",
            table = kind.table()
        );
        let count: i64 = self.conn.query_row(&sql, params![self.owner], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_owner<P>(&self, record: &SecretRecord<P>) -> Result<()> {
        if record.owner == self.owner {
            Ok(())
        } else {
            Err(KeeperError::CommandFailed(format!(
                "secret '{}' belongs to '{}', not to cache owner '{}'",
                record.secret_name, record.owner, self.owner
            )))
        }
    }

    fn write<P: SecretPayload>(
        &self,
        record: &SecretRecord<P>,
        updated_at: DateTime<Utc>,
        only_if_newer: bool,
    ) -> Result<bool> {
        let table = P::KIND.table();
        let names: Vec<&str> = P::COLUMNS.iter().map(|(name, _)| *name).collect();

        // owner, secret_name, payload..., meta, updated_at
        let placeholders: Vec<String> = (1..=names.len() + 4).map(|i| format!("?{i}")).collect();
        let assignments: Vec<String> = names
            .iter()
            .chain(["meta", "updated_at"].iter())
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();
        let guard = if only_if_newer {
            format!(" WHERE excluded.updated_at > {table}.updated_at")
        } else {
            String::new()
        };

        let sql = format!(
            "INSERT INTO {table} (owner, secret_name, {columns}, meta, updated_at)
             VALUES ({placeholders})
             ON CONFLICT(owner, secret_name) DO UPDATE SET {assignments}{guard}",
            columns = names.join(", "),
            placeholders = placeholders.join(", "),
            assignments = assignments.join(", "),
        );

        let mut values = Vec::with_capacity(names.len() + 4);
        values.push(Value::Text(self.owner.clone()));
        values.push(Value::Text(record.secret_name.clone()));
        values.extend(record.payload.to_columns());
        values.push(match &record.meta {
            Some(meta) => Value::Text(meta.clone()),
            None => Value::Null,
        });
        values.push(Value::Text(format_timestamp(updated_at)));

        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(changed > 0)
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn payload_column_list<P: SecretPayload>() -> String {
    P::COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_record<P: SecretPayload>(row: &Row<'_>) -> rusqlite::Result<SecretRecord<P>> {
    let ts: String = row.get(3)?;
    let updated_at = DateTime::parse_from_rfc3339(&ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(SecretRecord {
        owner: row.get(0)?,
        secret_name: row.get(1)?,
        meta: row.get(2)?,
        updated_at,
        payload: P::from_row(row, PAYLOAD_OFFSET)?,
    })
}
