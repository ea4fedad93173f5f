//! # Derivation Cache
//!
//! Memoizes the derivations so that a keystroke in the destination form
//! does not re-run customs aggregation or price math.
//!
//! ## Keying
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  input subtree (+ scalar inputs)                                        │
//! │        │ serde_json::to_vec                                             │
//! │        ▼                                                                │
//! │  SHA-256 ──► 32-byte key ──► memo table for that derivation             │
//! │                                                                         │
//! │  memo table        depends on                                           │
//! │  ─────────────     ─────────────────────────────                        │
//! │  origin            Origin                                               │
//! │  destination       Destination                                          │
//! │  packages          Packages                                             │
//! │  customs           Packages, Customs, Destination                       │
//! │  rates / prices    Rates                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are content digests, so a stale entry can never be returned for
//! changed input. [`DerivationCache::invalidate`] exists to drop entries
//! that can no longer be hit once their subtree has been written.
//! If an input cannot be serialized the derivation runs uncached.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::customs::{compute_customs_errors, is_customs_form_required};
use crate::location::Locations;
use crate::pricing::{compute_total_price_breakdown, PriceBreakdown};
use crate::rates::compute_rates_errors;
use crate::report::{AddressErrors, CustomsErrors, FormErrors, PackageErrors, RatesErrors};
use crate::step::{phone_checks, DerivationOptions};
use crate::types::{Address, CustomsDeclaration, FormState, PackageSet, RateSelection};
use crate::validation::{validate_address, validate_packages, validate_sidebar, FieldsToValidate};

/// SHA-256 of an input subtree's JSON bytes.
pub type SubtreeDigest = [u8; 32];

/// A part of the form the store writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subtree {
    Origin,
    Destination,
    Packages,
    Customs,
    Rates,
}

impl Subtree {
    pub const ALL: [Subtree; 5] = [
        Subtree::Origin,
        Subtree::Destination,
        Subtree::Packages,
        Subtree::Customs,
        Subtree::Rates,
    ];
}

/// Digest of any serializable input. `None` when it cannot be serialized.
pub fn subtree_digest<T: Serialize + ?Sized>(value: &T) -> Option<SubtreeDigest> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let hash = Sha256::digest(&bytes);
            let mut digest = [0u8; 32];
            digest.copy_from_slice(&hash);
            Some(digest)
        }
        Err(err) => {
            warn!(error = %err, "Derivation input not serializable, skipping cache");
            None
        }
    }
}

// =============================================================================
// Memo Table
// =============================================================================

#[derive(Debug)]
struct Memo<T> {
    name: &'static str,
    depends_on: &'static [Subtree],
    entries: HashMap<SubtreeDigest, T>,
}

impl<T: Clone> Memo<T> {
    fn new(name: &'static str, depends_on: &'static [Subtree]) -> Self {
        Self {
            name,
            depends_on,
            entries: HashMap::new(),
        }
    }

    fn get_or_compute(
        &mut self,
        key: Option<SubtreeDigest>,
        stats: &mut CacheStats,
        compute: impl FnOnce() -> T,
    ) -> T {
        let Some(key) = key else {
            stats.misses += 1;
            return compute();
        };

        if let Some(hit) = self.entries.get(&key) {
            stats.hits += 1;
            trace!(table = self.name, "Derivation cache hit");
            return hit.clone();
        }

        stats.misses += 1;
        trace!(table = self.name, "Derivation cache miss");
        let value = compute();
        self.entries.insert(key, value.clone());
        value
    }

    fn evict_if_depends_on(&mut self, subtree: Subtree) {
        if self.depends_on.contains(&subtree) && !self.entries.is_empty() {
            debug!(table = self.name, evicted = self.entries.len(), ?subtree, "Evicting derivations");
            self.entries.clear();
        }
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

// =============================================================================
// Derivation Cache
// =============================================================================

/// Memoized versions of the derivations.
///
/// Every method returns exactly what the corresponding uncached function
/// returns for the same input.
///
/// ## Example
/// ```rust
/// use shiplabel_core::cache::{DerivationCache, Subtree};
/// use shiplabel_core::PackageSet;
///
/// let mut cache = DerivationCache::new();
/// let packages = PackageSet::new();
///
/// cache.package_errors(&packages);
/// cache.package_errors(&packages);
/// assert_eq!(cache.stats().hits, 1);
///
/// cache.invalidate(Subtree::Packages);
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct DerivationCache {
    origin: Memo<AddressErrors>,
    destination: Memo<AddressErrors>,
    packages: Memo<BTreeMap<String, PackageErrors>>,
    customs: Memo<CustomsErrors>,
    rates: Memo<RatesErrors>,
    prices: Memo<Option<PriceBreakdown>>,
    stats: CacheStats,
}

impl Default for DerivationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivationCache {
    pub fn new() -> Self {
        Self {
            origin: Memo::new("origin", &[Subtree::Origin]),
            destination: Memo::new("destination", &[Subtree::Destination]),
            packages: Memo::new("packages", &[Subtree::Packages]),
            customs: Memo::new(
                "customs",
                &[Subtree::Packages, Subtree::Customs, Subtree::Destination],
            ),
            rates: Memo::new("rates", &[Subtree::Rates]),
            prices: Memo::new("prices", &[Subtree::Rates]),
            stats: CacheStats::default(),
        }
    }

    pub fn origin_errors(
        &mut self,
        address: &Address,
        country_has_states: bool,
        fields: FieldsToValidate,
    ) -> AddressErrors {
        let key = subtree_digest(&(address, country_has_states, fields));
        self.origin.get_or_compute(key, &mut self.stats, || {
            validate_address(address, country_has_states, fields)
        })
    }

    pub fn destination_errors(
        &mut self,
        address: &Address,
        country_has_states: bool,
        fields: FieldsToValidate,
    ) -> AddressErrors {
        let key = subtree_digest(&(address, country_has_states, fields));
        self.destination.get_or_compute(key, &mut self.stats, || {
            validate_address(address, country_has_states, fields)
        })
    }

    pub fn package_errors(&mut self, packages: &PackageSet) -> BTreeMap<String, PackageErrors> {
        let key = subtree_digest(packages);
        self.packages
            .get_or_compute(key, &mut self.stats, || validate_packages(packages))
    }

    pub fn customs_errors(
        &mut self,
        packages: &PackageSet,
        customs: &CustomsDeclaration,
        destination_country_code: &str,
        destination_country_name: &str,
    ) -> CustomsErrors {
        let key = subtree_digest(&(
            packages,
            customs,
            destination_country_code,
            destination_country_name,
        ));
        self.customs.get_or_compute(key, &mut self.stats, || {
            compute_customs_errors(
                packages,
                customs,
                destination_country_code,
                destination_country_name,
            )
        })
    }

    pub fn rates_errors(&mut self, rates: &RateSelection) -> RatesErrors {
        let key = subtree_digest(rates);
        self.rates
            .get_or_compute(key, &mut self.stats, || compute_rates_errors(rates))
    }

    pub fn price_breakdown(&mut self, rates: &RateSelection) -> Option<PriceBreakdown> {
        let key = subtree_digest(rates);
        self.prices
            .get_or_compute(key, &mut self.stats, || compute_total_price_breakdown(rates))
    }

    /// Memoized [`crate::step::derive_form_errors`].
    pub fn derive_form_errors(
        &mut self,
        form: &FormState,
        locations: &dyn Locations,
        options: DerivationOptions,
    ) -> FormErrors {
        let (origin_fields, destination_fields) = phone_checks(form, options);

        let origin = self.origin_errors(
            &form.origin,
            locations.has_states(&form.origin.values.country),
            origin_fields,
        );
        let destination = self.destination_errors(
            &form.destination,
            locations.has_states(&form.destination.values.country),
            destination_fields,
        );

        let customs = if is_customs_form_required(&form.origin.values, &form.destination.values) {
            let code = &form.destination.values.country;
            self.customs_errors(&form.packages, &form.customs, code, &locations.country_name(code))
        } else {
            CustomsErrors::default()
        };

        FormErrors {
            origin,
            destination,
            packages: self.package_errors(&form.packages),
            customs,
            rates: self.rates_errors(&form.rates),
            sidebar: validate_sidebar(form.paper_size.as_deref()),
        }
    }

    /// Drops every entry derived from `subtree`.
    pub fn invalidate(&mut self, subtree: Subtree) {
        self.origin.evict_if_depends_on(subtree);
        self.destination.evict_if_depends_on(subtree);
        self.packages.evict_if_depends_on(subtree);
        self.customs.evict_if_depends_on(subtree);
        self.rates.evict_if_depends_on(subtree);
        self.prices.evict_if_depends_on(subtree);
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        for subtree in Subtree::ALL {
            self.invalidate(subtree);
        }
    }

    /// Number of memoized results across all tables.
    pub fn len(&self) -> usize {
        self.origin.entries.len()
            + self.destination.entries.len()
            + self.packages.entries.len()
            + self.customs.entries.len()
            + self.rates.entries.len()
            + self.prices.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::CountryCatalog;
    use crate::step::derive_form_errors;
    use crate::types::{AddressValues, BoxId, Package, PackageItem};

    fn international_form() -> FormState {
        let mut form = FormState::default();
        form.origin.values = AddressValues {
            name: "Jane".to_string(),
            country: "US".to_string(),
            postcode: "1234".to_string(),
            ..Default::default()
        };
        form.destination.values = AddressValues {
            company: "ACME".to_string(),
            country: "CU".to_string(),
            ..Default::default()
        };
        form.packages.insert(
            "p1".to_string(),
            Package {
                box_id: BoxId::Individual,
                items: vec![PackageItem {
                    product_id: "a".to_string(),
                    quantity: 3,
                    name: "A".to_string(),
                }],
                weight: f64::NAN,
                ..Default::default()
            },
        );
        form
    }

    fn catalog() -> CountryCatalog {
        CountryCatalog::new()
            .with_country("US", "United States", &[("IL", "Illinois")])
            .with_country("CU", "Cuba", &[])
    }

    #[test]
    fn test_cached_equals_uncached() {
        let form = international_form();
        let catalog = catalog();
        let options = DerivationOptions {
            require_destination_phone: true,
        };
        let mut cache = DerivationCache::new();

        let expected = derive_form_errors(&form, &catalog, options);
        assert_eq!(cache.derive_form_errors(&form, &catalog, options), expected);
        assert_eq!(cache.derive_form_errors(&form, &catalog, options), expected);

        let stats = cache.stats();
        assert_eq!(stats.misses, 5);
        assert_eq!(stats.hits, 5);
    }

    #[test]
    fn test_changed_input_misses() {
        let mut form = international_form();
        let mut cache = DerivationCache::new();

        let before = cache.package_errors(&form.packages);
        if let Some(p1) = form.packages.get_mut("p1") {
            p1.weight = 2.0;
        }
        let after = cache.package_errors(&form.packages);

        assert_ne!(before, after);
        assert_eq!(after, validate_packages(&form.packages));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_invalidate_evicts_dependents_only() {
        let form = international_form();
        let catalog = catalog();
        let mut cache = DerivationCache::new();
        cache.derive_form_errors(&form, &catalog, DerivationOptions::default());
        cache.price_breakdown(&form.rates);
        assert_eq!(cache.len(), 6);

        cache.invalidate(Subtree::Packages);
        assert_eq!(cache.packages.entries.len(), 0);
        assert_eq!(cache.customs.entries.len(), 0);
        assert_eq!(cache.origin.entries.len(), 1);
        assert_eq!(cache.len(), 4);

        cache.invalidate(Subtree::Rates);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_digest_is_content_based() {
        let a = international_form();
        let b = international_form();
        assert_eq!(subtree_digest(&a.packages), subtree_digest(&b.packages));
        assert_ne!(subtree_digest(&a.origin), subtree_digest(&a.destination));
    }
}
