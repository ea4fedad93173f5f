//! # Step Gate
//!
//! Composes every validator into one [`FormErrors`] report and decides
//! which wizard step the user has to fix first.
//!
//! ## State Machine
//! ```text
//! ┌────────┐  ok  ┌─────────────┐  ok  ┌──────────┐  ok  ┌─────────┐  ok  ┌───────┐  ok
//! │ origin │ ───► │ destination │ ───► │ packages │ ───► │ customs │ ───► │ rates │ ───► None
//! └────────┘      └─────────────┘      └──────────┘      └─────────┘      └───────┘   (ready)
//!                                                      skipped unless
//!                                                      customs required
//! ```
//!
//! The first failing step wins: a form with both an origin error and a
//! package error reports `origin`.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customs::{compute_customs_errors, is_customs_form_required, is_customs_step_reviewed};
use crate::location::Locations;
use crate::rates::compute_rates_errors;
use crate::report::{AddressErrors, CustomsErrors, FormErrors, HasErrors};
use crate::types::{Address, FormState};
use crate::validation::{validate_address, validate_packages, validate_sidebar, FieldsToValidate};

// =============================================================================
// Step
// =============================================================================

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Step {
    Origin,
    Destination,
    Packages,
    Customs,
    Rates,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Origin => "origin",
            Step::Destination => "destination",
            Step::Packages => "packages",
            Step::Customs => "customs",
            Step::Rates => "rates",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Form Derivation
// =============================================================================

/// Store-level settings that change which checks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivationOptions {
    /// The selected carrier needs to be able to call the recipient.
    pub require_destination_phone: bool,
}

/// Which phone checks apply to the origin and destination addresses.
pub fn phone_checks(form: &FormState, options: DerivationOptions) -> (FieldsToValidate, FieldsToValidate) {
    let customs_required = is_customs_form_required(&form.origin.values, &form.destination.values);
    let origin = FieldsToValidate {
        validate_origin_phone: customs_required,
        validate_destination_phone: false,
    };
    let destination = FieldsToValidate {
        validate_origin_phone: false,
        validate_destination_phone: customs_required && options.require_destination_phone,
    };
    (origin, destination)
}

/// Validates an address against its own country's rules.
pub fn address_errors(
    address: &Address,
    locations: &dyn Locations,
    fields: FieldsToValidate,
) -> AddressErrors {
    let has_states = locations.has_states(&address.values.country);
    validate_address(address, has_states, fields)
}

/// Customs findings, or an empty report when no declaration is needed.
pub fn customs_errors(form: &FormState, locations: &dyn Locations) -> CustomsErrors {
    if !is_customs_form_required(&form.origin.values, &form.destination.values) {
        return CustomsErrors::default();
    }
    let code = &form.destination.values.country;
    compute_customs_errors(&form.packages, &form.customs, code, &locations.country_name(code))
}

/// Runs every validator over one snapshot.
///
/// ## Phone Rules
/// - Origin phone: required and format-checked whenever customs is required
/// - Destination phone: required when customs is required and
///   `options.require_destination_phone` is set
pub fn derive_form_errors(
    form: &FormState,
    locations: &dyn Locations,
    options: DerivationOptions,
) -> FormErrors {
    let (origin_fields, destination_fields) = phone_checks(form, options);

    FormErrors {
        origin: address_errors(&form.origin, locations, origin_fields),
        destination: address_errors(&form.destination, locations, destination_fields),
        packages: validate_packages(&form.packages),
        customs: customs_errors(form, locations),
        rates: compute_rates_errors(&form.rates),
        sidebar: validate_sidebar(form.paper_size.as_deref()),
    }
}

// =============================================================================
// Gate
// =============================================================================

fn address_step_fails(address: &Address, errors: &AddressErrors) -> bool {
    !address.is_normalized || !address.matches_normalized() || errors.has_any()
}

/// The first step, in wizard order, that still has something wrong.
///
/// ## Checks
/// 1. origin: not normalized, edited since normalization, or has errors
/// 2. destination: same as origin
/// 3. packages: any package error
/// 4. customs (only when required): any customs error, or a used product
///    not yet reviewed
/// 5. rates: any rate error
///
/// Sidebar findings do not gate a step.
pub fn first_erroneous_step(form: &FormState, errors: &FormErrors) -> Option<Step> {
    if address_step_fails(&form.origin, &errors.origin) {
        return Some(Step::Origin);
    }
    if address_step_fails(&form.destination, &errors.destination) {
        return Some(Step::Destination);
    }
    if errors.packages.has_any() {
        return Some(Step::Packages);
    }
    if is_customs_form_required(&form.origin.values, &form.destination.values)
        && (errors.customs.has_any() || !is_customs_step_reviewed(&form.packages, &form.customs))
    {
        return Some(Step::Customs);
    }
    if errors.rates.has_any() {
        return Some(Step::Rates);
    }
    None
}

/// Whether the "Purchase" action is allowed.
///
/// Requires a form with no erroneous step, no address normalization or
/// rate retrieval in flight, and at least one quoted rate.
pub fn can_purchase(form: Option<&FormState>, errors: &FormErrors) -> bool {
    let Some(form) = form else {
        return false;
    };

    let has_quote = form
        .rates
        .available
        .values()
        .any(|quotes| !quotes.default.rates.is_empty());

    first_erroneous_step(form, errors).is_none()
        && !form.origin.normalization_in_progress
        && !form.destination.normalization_in_progress
        && !form.rates.retrieval_in_progress
        && has_quote
}

// =============================================================================
// Unit Tests
// =============================================================================
