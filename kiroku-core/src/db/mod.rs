pub mod models;
pub mod operations;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Connection, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open a pool for `config.database_url` and bring the schema up to date.
///
/// In-memory databases exist per connection, so they are pinned to a single
/// pooled connection.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let in_memory = config.database_url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| anyhow::anyhow!("Invalid DATABASE_URL {}: {}", config.database_url, e))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .synchronous(SqliteSynchronous::Normal);
    let options = if in_memory {
        options
    } else {
        options.journal_mode(SqliteJournalMode::Wal)
    };

    let max_connections = if in_memory { 1 } else { config.max_connections };
    debug!(
        "Connecting to {} with {} connection(s)",
        config.database_url, max_connections
    );

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        // Closing the only connection would drop the database.
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create DB pool: {}", e))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Fresh, migrated in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    connect(&Config::new("sqlite::memory:")).await
}

/// Open a write transaction.
///
/// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent writers
/// queue on `busy_timeout` instead of failing with `SQLITE_BUSY` when a read
/// snapshot is upgraded. Every operation that reads and then writes must
/// start here.
pub async fn begin_write(pool: &SqlitePool) -> crate::errors::Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

struct Migration {
    name: &'static str,
    up_sql: &'static str,
}

const MIGRATION_2026_10_16_090000_0000_SETUP_TABLES: &str =
    include_str!("../../../migrations/2026-10-16-090000-0000_setup_tables/up.sql");

const MIGRATIONS: &[Migration] = &[Migration {
    name: "2026-10-16-090000-0000_setup_tables",
    up_sql: MIGRATION_2026_10_16_090000_0000_SETUP_TABLES,
}];

async fn applied_migrations(conn: &mut SqliteConnection) -> Result<HashSet<String>> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT NOT NULL PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await?;

    let names = sqlx::query_scalar::<_, String>("SELECT name FROM _migrations")
        .fetch_all(&mut *conn)
        .await?;
    Ok(names.into_iter().collect())
}

/// Split a migration script into statements. Line comments are dropped
/// first, so a `;` inside a comment does not end a statement.
fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_comment = false;
    for (i, c) in sql.char_indices() {
        match c {
            '-' if !in_comment && sql[i..].starts_with("--") => in_comment = true,
            '\n' => in_comment = false,
            ';' if !in_comment => {
                statements.push(&sql[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    statements.push(&sql[start..]);

    statements
        .into_iter()
        .filter(|s| s.lines().any(|l| !l.trim().is_empty() && !l.trim_start().starts_with("--")))
        .map(str::trim)
        .collect()
}

/// Bring the schema up to date. Each pending migration is applied under the
/// write lock together with its `_migrations` row, and skipped if another
/// process got there first.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let mut conn = pool.acquire().await?;
    let applied = applied_migrations(&mut conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(m.name)) {
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;
        let raced = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _migrations WHERE name = ?1")
            .bind(migration.name)
            .fetch_one(&mut *tx)
            .await?;
        if raced > 0 {
            debug!("Migration {} applied concurrently, skipping", migration.name);
            continue;
        }

        info!("Applying migration {}", migration.name);
        for statement in split_statements(migration.up_sql) {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration {} failed at: {}", migration.name, statement))?;
        }
        sqlx::query("INSERT INTO _migrations (name, applied_at) VALUES (?1, ?2)")
            .bind(migration.name)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
