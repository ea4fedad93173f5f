//! # Validation Module
//!
//! Address, package and sidebar validation for the label wizard.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Address Validation                                 │
//! │                                                                         │
//! │  (normalized || unverifiable) and no normalized form?                  │
//! │     ├── server sent fieldErrors ──► use them verbatim                  │
//! │     ├── normalized, nothing sent ──► "address not recognized"          │
//! │     └── otherwise ─────────────────┐                                   │
//! │                                    ▼                                   │
//! │  Local rules (all run, no early exit)                                  │
//! │  ├── 1. address, city, postcode, country required                      │
//! │  ├── 2. name or company required                                       │
//! │  ├── 3. ZIP format for USPS origin countries                           │
//! │  ├── 4. state required where the country has states                    │
//! │  └── 5. origin / destination phone                                     │
//! │                                    │                                   │
//! │                                    ▼                                   │
//! │  Drop every field listed in ignoreValidation                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators never fail: they always return a (possibly empty) report.
//!
//! ## Usage
//! ```rust
//! use shiplabel_core::report::HasErrors;
//! use shiplabel_core::types::Address;
//! use shiplabel_core::validation::{validate_address, FieldsToValidate};
//!
//! let address = Address::default();
//! let errors = validate_address(&address, false, FieldsToValidate::default());
//! assert!(errors.has_any());
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::report::{AddressErrors, PackageErrors, SidebarErrors};
use crate::types::{Address, AddressField, AddressValues, BoxId, PackageSet};
use crate::{PAPER_SIZES, USPS_ORIGIN_COUNTRIES};

static ZIP_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("valid regex"));

/// Which optional address checks apply.
///
/// The origin phone is needed whenever a customs form is; carriers that
/// contact the recipient also need the destination phone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldsToValidate {
    pub validate_origin_phone: bool,
    pub validate_destination_phone: bool,
}

// =============================================================================
// Address
// =============================================================================

/// Validates one address.
///
/// ## Arguments
/// * `address` - The address record, including its normalization state
/// * `country_has_states` - Whether the address's country requires a state
/// * `fields` - Optional phone checks to run
///
/// ## Example
/// ```rust
/// use shiplabel_core::types::{Address, AddressField};
/// use shiplabel_core::validation::{validate_address, FieldsToValidate};
///
/// let mut address = Address::default();
/// address.values.country = "US".to_string();
/// address.values.postcode = "9021".to_string();
///
/// let errors = validate_address(&address, true, FieldsToValidate::default());
/// assert!(errors.get(AddressField::Postcode).is_some());
/// assert!(errors.get(AddressField::State).is_some());
/// ```
pub fn validate_address(
    address: &Address,
    country_has_states: bool,
    fields: FieldsToValidate,
) -> AddressErrors {
    let server_decided =
        (address.is_normalized || address.is_unverifiable) && address.normalized.is_none();

    let mut errors = match (&address.field_errors, server_decided) {
        (Some(field_errors), true) => field_errors.clone(),
        (None, true) if address.is_normalized => {
            let mut errors = AddressErrors::default();
            errors.set(AddressField::Address, ValidationError::AddressNotRecognized);
            errors
        }
        _ => check_values(&address.values, country_has_states, fields),
    };

    for field in AddressField::ALL {
        if address.ignores(field) {
            errors.clear(field);
        }
    }

    errors
}

/// Runs the local rules against the address values.
fn check_values(
    values: &AddressValues,
    country_has_states: bool,
    fields: FieldsToValidate,
) -> AddressErrors {
    let mut errors = AddressErrors::default();

    for field in [
        AddressField::Address,
        AddressField::City,
        AddressField::Postcode,
        AddressField::Country,
    ] {
        if values.get(field).is_empty() {
            errors.set(field, ValidationError::Required);
        }
    }

    if values.name.is_empty() && values.company.is_empty() {
        errors.set(AddressField::Name, ValidationError::NameOrCompanyRequired);
        errors.set(AddressField::Company, ValidationError::NameOrCompanyRequired);
    }

    // Runs on an empty postcode too, replacing "required" for USPS countries
    if USPS_ORIGIN_COUNTRIES.contains(&values.country.as_str())
        && !ZIP_CODE.is_match(&values.postcode)
    {
        errors.set(AddressField::Postcode, ValidationError::InvalidZipCode);
    }

    if values.state.is_empty() && country_has_states {
        errors.set(AddressField::State, ValidationError::Required);
    }

    if fields.validate_origin_phone && values.phone.is_empty() {
        errors.set(AddressField::Phone, ValidationError::OriginPhoneRequired);
    } else if !values.phone.is_empty() && !is_valid_phone(&values.phone) {
        errors.set(AddressField::Phone, ValidationError::InvalidPhone);
    }

    if fields.validate_destination_phone && values.phone.is_empty() {
        errors.set(AddressField::Phone, ValidationError::DestinationPhoneRequired);
    }

    errors
}

/// A North American number: 10 digits once punctuation and a single
/// leading country code `1` are removed.
///
/// ## Example
/// ```rust
/// use shiplabel_core::validation::is_valid_phone;
///
/// assert!(is_valid_phone("(555) 555-5555"));
/// assert!(is_valid_phone("+1 555 555 5555"));
/// assert!(!is_valid_phone("555-5555"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let national = digits.strip_prefix('1').unwrap_or(&digits);
    national.len() == 10
}

// =============================================================================
// Packages
// =============================================================================

/// Validates every package's box choice and measurements.
///
/// ## Rules
/// - `box_id` must not be `not_selected`
/// - weight must be finite and > 0
/// - length, width and height must all be finite and > 0 (one shared finding)
///
/// Every package gets an entry, empty when it is valid.
pub fn validate_packages(packages: &PackageSet) -> BTreeMap<String, PackageErrors> {
    packages
        .iter()
        .map(|(id, package)| {
            let mut errors = PackageErrors::default();

            if package.box_id == BoxId::NotSelected {
                errors.box_id = Some(ValidationError::PackageNotSelected);
            }

            if is_invalid_dimension(package.weight) {
                errors.weight = Some(ValidationError::InvalidWeight);
            }

            if [package.length, package.width, package.height]
                .into_iter()
                .any(is_invalid_dimension)
            {
                errors.dimensions = Some(ValidationError::InvalidDimensions);
            }

            (id.clone(), errors)
        })
        .collect()
}

fn is_invalid_dimension(value: f64) -> bool {
    !value.is_finite() || value <= 0.0
}

// =============================================================================
// Sidebar
// =============================================================================

/// Validates the paper size picked in the purchase sidebar.
pub fn validate_sidebar(paper_size: Option<&str>) -> SidebarErrors {
    let paper_size = match paper_size.map(str::trim) {
        None | Some("") => {
            return SidebarErrors {
                paper_size: Some(ValidationError::Required),
            }
        }
        Some(size) => size,
    };

    if PAPER_SIZES.contains(&paper_size) {
        SidebarErrors::default()
    } else {
        SidebarErrors {
            paper_size: Some(ValidationError::UnsupportedPaperSize(paper_size.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
