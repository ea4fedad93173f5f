//! # Database State
//!
//! The order metadata store, opened only when a `labels` command runs.
//!
//! ```text
//! ConfigState::database_path()  ── SHIPLABEL_DB_PATH or the platform data dir
//!        │
//!        ▼
//! DbState::open ── Database::new (migrations applied) ── labels() per command
//! ```

use shiplabel_db::{Database, DbConfig, LabelMetaRepository};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::ConfigState;

#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    pub async fn open(config: &ConfigState) -> Result<Self, ApiError> {
        let path = config.database_path()?;
        info!(path = %path.display(), "Opening label store");
        Ok(DbState::new(Database::new(DbConfig::new(path)).await?))
    }

    /// Repository over the `order_meta` label entries.
    pub fn labels(&self) -> LabelMetaRepository {
        self.db.labels()
    }

    /// Flushes and closes the pool before the process exits.
    pub async fn close(self) {
        debug!("Closing label store");
        self.db.close().await;
    }
}
