//! # Locations State
//!
//! The country catalog the validators consult, plus the feature flags that
//! decide which countries are selectable.
//!
//! ```text
//! SHIPLABEL_COUNTRIES_PATH set?
//!     ├── yes ──► read that file ──────────┐
//!     └── no  ──► data/countries.json ─────┤ (compiled in)
//!                                          ▼
//!                                   CountryCatalog
//! ```

use std::path::Path;

use shiplabel_core::location::{
    selectable_destination_countries, selectable_origin_countries, CountryCatalog, StaticFlags,
};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::ConfigState;

/// Catalog shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../data/countries.json");

/// Country lookup and selection flags, read-only after startup.
#[derive(Debug, Clone)]
pub struct LocationsState {
    catalog: CountryCatalog,
    flags: StaticFlags,
}

impl LocationsState {
    pub fn new(catalog: CountryCatalog, flags: StaticFlags) -> Self {
        LocationsState { catalog, flags }
    }

    /// Loads the configured catalog, or the built-in one.
    pub fn load(config: &ConfigState) -> Result<Self, ApiError> {
        let catalog = match &config.countries_path {
            Some(path) => Self::read_catalog(path)?,
            None => Self::builtin_catalog()?,
        };
        debug!(countries = catalog.len(), "Country catalog loaded");
        Ok(LocationsState::new(catalog, config.flags()))
    }

    /// The catalog compiled into the binary.
    pub fn builtin_catalog() -> Result<CountryCatalog, ApiError> {
        serde_json::from_str(BUILTIN_CATALOG)
            .map_err(|e| ApiError::internal(format!("Built-in country catalog is invalid: {}", e)))
    }

    fn read_catalog(path: &Path) -> Result<CountryCatalog, ApiError> {
        info!(path = %path.display(), "Reading country catalog");
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::invalid_input(format!("{}: not a country catalog: {}", path.display(), e))
        })
    }

    pub fn catalog(&self) -> &CountryCatalog {
        &self.catalog
    }

    pub fn origin_countries(&self) -> Vec<String> {
        selectable_origin_countries(&self.flags, &self.catalog)
    }

    pub fn destination_countries(&self) -> Vec<String> {
        selectable_destination_countries(&self.flags, &self.catalog)
    }
}
