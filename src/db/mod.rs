mod models;
pub mod query;

pub use models::*;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(db_path: &Path, max_connections: u32) -> Result<DbPool> {
    info!("Initializing database at {}", db_path.display());

    // Pragmas set here apply to every pooled connection
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = connect(options, max_connections).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open an in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool is
/// limited to a single connection.
pub async fn init_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    connect(options, 1).await
}

async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options.foreign_keys(true))
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Employees and timesheets
    let has_employees_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='employees'",
    )
    .fetch_optional(pool)
    .await?;
    if has_employees_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;
    }

    Ok(())
}
