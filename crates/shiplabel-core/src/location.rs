//! # Location & Feature Flags
//!
//! The collaborators the validators consult about the outside world:
//! which countries have states, what a country is called, and whether
//! international labels are switched on.
//!
//! Both are traits so the CLI can load a country catalog from JSON while
//! tests build one inline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::USPS_ORIGIN_COUNTRIES;

// =============================================================================
// Locations
// =============================================================================

/// A state or province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdivision {
    pub code: String,
    pub name: String,
}

/// Country lookup used by address validation and customs messages.
pub trait Locations {
    /// Whether addresses in `country` must name a state.
    fn has_states(&self, country: &str) -> bool;

    /// The states of `country`, empty when it has none or is unknown.
    fn states(&self, country: &str) -> Vec<Subdivision>;

    /// Display name of `country`; falls back to the code itself.
    fn country_name(&self, country: &str) -> String;

    /// Every known country code, sorted.
    fn country_codes(&self) -> Vec<String>;
}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryInfo {
    pub name: String,
    pub states: Vec<Subdivision>,
}

/// In-memory country catalog.
///
/// ## JSON Shape
/// ```json
/// { "US": { "name": "United States", "states": [{ "code": "CA", "name": "California" }] },
///   "GB": { "name": "United Kingdom" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCatalog {
    countries: BTreeMap<String, CountryInfo>,
}

impl CountryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a country (builder style).
    pub fn with_country(
        mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        states: &[(&str, &str)],
    ) -> Self {
        let states = states
            .iter()
            .map(|(code, name)| Subdivision {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect();
        self.countries.insert(
            code.into(),
            CountryInfo {
                name: name.into(),
                states,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl Locations for CountryCatalog {
    fn has_states(&self, country: &str) -> bool {
        self.countries
            .get(country)
            .is_some_and(|info| !info.states.is_empty())
    }

    fn states(&self, country: &str) -> Vec<Subdivision> {
        self.countries
            .get(country)
            .map(|info| info.states.clone())
            .unwrap_or_default()
    }

    fn country_name(&self, country: &str) -> String {
        self.countries
            .get(country)
            .map(|info| info.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(country)
            .to_string()
    }

    fn country_codes(&self) -> Vec<String> {
        self.countries.keys().cloned().collect()
    }
}

// =============================================================================
// Feature Flags
// =============================================================================

/// Feature switches that change which countries are selectable.
pub trait FeatureFlags {
    fn international_labels_enabled(&self) -> bool;
}

/// Flags fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticFlags {
    pub international_labels: bool,
}

impl FeatureFlags for StaticFlags {
    fn international_labels_enabled(&self) -> bool {
        self.international_labels
    }
}

/// Countries a label may ship from.
///
/// International labels open up every USPS origin territory the catalog
/// knows; otherwise only the United States.
pub fn selectable_origin_countries(
    flags: &dyn FeatureFlags,
    locations: &dyn Locations,
) -> Vec<String> {
    if !flags.international_labels_enabled() {
        return vec!["US".to_string()];
    }
    let known = locations.country_codes();
    USPS_ORIGIN_COUNTRIES
        .iter()
        .copied()
        .filter(|code| known.iter().any(|k| k.as_str() == *code))
        .map(|code| code.to_string())
        .collect()
}

/// Countries a label may ship to.
pub fn selectable_destination_countries(
    flags: &dyn FeatureFlags,
    locations: &dyn Locations,
) -> Vec<String> {
    if !flags.international_labels_enabled() {
        return vec!["US".to_string()];
    }
    locations.country_codes()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CountryCatalog {
        CountryCatalog::new()
            .with_country("US", "United States", &[("CA", "California"), ("NY", "New York")])
            .with_country("PR", "Puerto Rico", &[])
            .with_country("CA", "Canada", &[("ON", "Ontario")])
            .with_country("GB", "United Kingdom", &[])
    }

    #[test]
    fn test_has_states() {
        let catalog = catalog();
        assert!(catalog.has_states("US"));
        assert!(!catalog.has_states("GB"));
        assert!(!catalog.has_states("ZZ"));
        assert_eq!(catalog.states("CA")[0].code, "ON");
    }

    #[test]
    fn test_country_name_falls_back_to_code() {
        let catalog = catalog();
        assert_eq!(catalog.country_name("GB"), "United Kingdom");
        assert_eq!(catalog.country_name("ZZ"), "ZZ");
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog: CountryCatalog = serde_json::from_str(
            r#"{ "CU": { "name": "Cuba" }, "US": { "name": "United States", "states": [{ "code": "TX", "name": "Texas" }] } }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.has_states("US"));
        assert_eq!(catalog.country_name("CU"), "Cuba");
    }

    #[test]
    fn test_selectable_countries_domestic_only() {
        let flags = StaticFlags::default();
        assert_eq!(selectable_origin_countries(&flags, &catalog()), vec!["US"]);
        assert_eq!(selectable_destination_countries(&flags, &catalog()), vec!["US"]);
    }

    #[test]
    fn test_selectable_countries_international() {
        let flags = StaticFlags {
            international_labels: true,
        };
        assert_eq!(
            selectable_origin_countries(&flags, &catalog()),
            vec!["US", "PR"]
        );
        assert_eq!(
            selectable_destination_countries(&flags, &catalog()),
            vec!["CA", "GB", "PR", "US"]
        );
    }
}
