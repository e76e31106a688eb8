//! Schema setup and teardown
//!
//! Runs the SQL files under `migrations/` (ascending) or `cleanup/`
//! (descending). Every migration is idempotent so setup can be repeated.

use sqlx::PgPool;
use std::fs;
use std::path::Path;

/// Create the ledger types, tables, indexes and guard trigger
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use savings_core_postgres::repository::db_init::init_database;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// init_database(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn init_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    execute_sql_files_in_order(pool, &migrations_dir, true).await
}

/// Drop everything [`init_database`] created, dependents first
pub async fn cleanup_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    let cleanup_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("cleanup");
    execute_sql_files_in_order(pool, &cleanup_dir, false).await
}

async fn execute_sql_files_in_order(
    pool: &PgPool,
    dir: &Path,
    ascending: bool,
) -> Result<(), sqlx::Error> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .map_err(sqlx::Error::Io)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    files.sort();
    if !ascending {
        files.reverse();
    }

    for path in files {
        let sql = fs::read_to_string(&path).map_err(sqlx::Error::Io)?;
        tracing::debug!(file = %path.display(), "executing schema script");
        sqlx::raw_sql(&sql).execute(pool).await?;
    }

    Ok(())
}
