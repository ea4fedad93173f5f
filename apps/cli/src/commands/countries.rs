//! # Country Commands
//!
//! `shiplabel countries`: which countries the wizard lets a label ship
//! from and to under the current feature flags.

use serde::Serialize;
use shiplabel_core::location::Locations;
use tracing::debug;

use crate::state::LocationsState;

/// A selectable country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
}

/// Selectable origin and destination countries.
#[derive(Debug, Clone, Serialize)]
pub struct CountryOptions {
    pub origin: Vec<CountryOption>,
    pub destination: Vec<CountryOption>,
}

pub fn list_countries(locations: &LocationsState) -> CountryOptions {
    debug!("list_countries command");

    let named = |codes: Vec<String>| {
        codes
            .into_iter()
            .map(|code| CountryOption {
                name: locations.catalog().country_name(&code),
                code,
            })
            .collect()
    };

    CountryOptions {
        origin: named(locations.origin_countries()),
        destination: named(locations.destination_countries()),
    }
}
