//! # Database Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in order on open.
//!
//! ```text
//! 001_order_meta.sql   order_meta(order_id, meta_key, meta_value, updated_at)
//! ```
//!
//! New schema goes in a new `NNN_description.sql` file; applied files are
//! never edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking migrations");
    MIGRATOR.run(pool).await?;
    info!("Order metadata schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_all_migrations_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (embedded, applied) = super::migration_status(db.pool()).await.unwrap();
        assert!(embedded >= 1);
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_rerun_is_a_no_op() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        super::run_migrations(db.pool()).await.unwrap();
        let (embedded, applied) = super::migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
    }
}
