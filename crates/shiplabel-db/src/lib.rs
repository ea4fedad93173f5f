//! # shiplabel-db: Order Metadata Store
//!
//! Stores purchased label records on orders, in SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shiplabel Data Flow                              │
//! │                                                                         │
//! │  CLI command (labels list / labels import)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shiplabel-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ LabelMetaRepository│  │ (embedded) │  │   │
//! │  │   └───────────────┘    └─────────┬──────────┘  └────────────┘  │   │
//! │  │                                  │ decode_label_meta            │   │
//! │  │                                  ▼                              │   │
//! │  │                          shiplabel-core::labels                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: order_meta(order_id, meta_key, meta_value, updated_at)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Label lists live under the `shipping_labels` meta key as JSON text. Reads go
//! through `decode_label_meta`, so rows written by older tools with extra
//! escaping still load.
//!
//! ```rust,ignore
//! use shiplabel_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shiplabel.db")).await?;
//! let labels = db.labels().get_labels(1042).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::labels::{LabelMetaRepository, LABELS_META_KEY};
