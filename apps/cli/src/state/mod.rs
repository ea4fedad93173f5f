//! # State Module
//!
//! Focused state types handed to commands. Each command takes only the
//! state it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌────────────────┐ ┌──────────────┐ ┌──────────────┐ │
//! │  │ ConfigState  │ │ LocationsState │ │FormStoreState│ │   DbState    │ │
//! │  │              │ │                │ │              │ │              │ │
//! │  │ env settings │ │ CountryCatalog │ │ Arc<Mutex<   │ │  Database    │ │
//! │  │ currency     │ │ StaticFlags    │ │   FormStore  │ │  (SQLite     │ │
//! │  │              │ │                │ │ >>           │ │   pool)      │ │
//! │  └──────────────┘ └────────────────┘ └──────────────┘ └──────────────┘ │
//! │                                                                         │
//! │  • ConfigState, LocationsState: read-only after startup                │
//! │  • FormStoreState: async Mutex around the snapshot and its cache       │
//! │  • DbState: opened only by the `labels` commands                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod form;
mod locations;

pub use config::ConfigState;
pub use db::DbState;
pub use form::{FormStore, FormStoreState};
pub use locations::LocationsState;
