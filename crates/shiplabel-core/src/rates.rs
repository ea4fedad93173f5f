//! # Rates Module
//!
//! Explains, per package, why no usable rate is selected yet.
//!
//! ```text
//! provider errors on the default quote? ──yes──► their messages
//!            │ no                                (or "couldn't get a rate")
//!            ▼
//! service selected? ──yes──► nothing to report
//!            │ no
//!            ▼
//! default rate list empty? ──yes──► "no rates available"
//!            │ no
//!            ▼
//! "please choose a rate"
//! ```

use crate::error::ValidationError;
use crate::report::RatesErrors;
use crate::types::RateSelection;

/// Computes the rate findings for every quoted package.
///
/// Packages missing from `available` have not been quoted yet and get no
/// entry. Every quoted package gets one, empty when it is fine.
///
/// ## Example
/// ```rust
/// use shiplabel_core::rates::compute_rates_errors;
/// use shiplabel_core::{PackageQuotes, RateSelection, ValidationError};
///
/// let mut rates = RateSelection::default();
/// rates.available.insert("p1".into(), PackageQuotes::default());
///
/// let errors = compute_rates_errors(&rates);
/// assert_eq!(errors["p1"], vec![ValidationError::NoRatesAvailable]);
/// ```
pub fn compute_rates_errors(rates: &RateSelection) -> RatesErrors {
    rates
        .available
        .iter()
        .map(|(package_id, quotes)| {
            let provider_errors = &quotes.default.errors;
            let selected = rates
                .values
                .get(package_id)
                .is_some_and(|selection| selection.is_selected());

            let errors = if !provider_errors.is_empty() {
                let messages: Vec<ValidationError> = provider_errors
                    .iter()
                    .filter_map(|error| error.display_message())
                    .map(|message| ValidationError::Server(message.to_string()))
                    .collect();
                if messages.is_empty() {
                    vec![ValidationError::RateUnavailable]
                } else {
                    messages
                }
            } else if selected {
                Vec::new()
            } else if quotes.default.rates.is_empty() {
                vec![ValidationError::NoRatesAvailable]
            } else {
                vec![ValidationError::RateNotSelected]
            };

            (package_id.clone(), errors)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
