// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-only numbered migrations.
//!
//! Each migration runs inside its own transaction; on failure the
//! transaction rolls back and no further migrations run. The one
//! exception is the ALTER-caveat: some SQLite builds commit `ALTER TABLE`
//! implicitly, so a migration whose SQL is an `ALTER TABLE ... ADD COLUMN`
//! that fails with "duplicate column name" is treated as already-applied
//! — the version is recorded outside the failed transaction and the
//! runner continues. Any other ALTER failure is fatal, like any other
//! migration failure.

use crate::error::StoreError;
use chrono::Utc;
use rusqlite::Connection;

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

/// The application's migration list, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema",
        sql: include_str!("migrations/0001_initial.sql"),
    },
    Migration {
        version: 2,
        description: "add duration_ms to sample_job_items",
        sql: "ALTER TABLE sample_job_items ADD COLUMN duration_ms INTEGER;",
    },
    Migration {
        version: 3,
        description: "index sample_job_items by job_id",
        sql: "CREATE INDEX IF NOT EXISTS idx_sample_job_items_job_id \
              ON sample_job_items(job_id);",
    },
];

fn is_duplicate_column_error(err: &rusqlite::Error) -> bool {
    err.to_string().to_lowercase().contains("duplicate column")
}

fn is_alter_table_add_column(sql: &str) -> bool {
    let normalized = sql.trim_start().to_uppercase();
    normalized.starts_with("ALTER TABLE")
}

/// Apply every migration in `migrations` that has not yet been recorded in
/// `schema_migrations`, in order. Idempotent: running twice against the
/// same database applies nothing the second time.
pub fn run(conn: &mut Connection, migrations: &[Migration]) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied TEXT NOT NULL
        );",
    )?;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                [migration.version],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if already_applied {
            continue;
        }

        tracing::debug!(version = migration.version, description = migration.description, "applying migration");

        let tx = conn.transaction().map_err(|source| StoreError::Migration {
            version: migration.version,
            source,
        })?;

        let exec_result = tx.execute_batch(migration.sql);

        match exec_result {
            Ok(()) => {
                tx.execute(
                    "INSERT INTO schema_migrations (version, applied) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, Utc::now().to_rfc3339()],
                )
                .map_err(|source| StoreError::Migration { version: migration.version, source })?;
                tx.commit().map_err(|source| StoreError::Migration {
                    version: migration.version,
                    source,
                })?;
            }
            Err(err) if is_alter_table_add_column(migration.sql) && is_duplicate_column_error(&err) => {
                // The ALTER already committed on a prior, interrupted run.
                // Drop this transaction (it never committed anything) and
                // record the version on the live connection instead.
                tracing::debug!(
                    version = migration.version,
                    "alter-and-record: column already present, recording version outside transaction"
                );
                drop(tx);
                conn.execute(
                    "INSERT INTO schema_migrations (version, applied) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, Utc::now().to_rfc3339()],
                )
                .map_err(|source| StoreError::Migration { version: migration.version, source })?;
            }
            Err(source) => {
                return Err(StoreError::Migration { version: migration.version, source });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;