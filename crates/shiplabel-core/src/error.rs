//! # Error Types
//!
//! Domain-specific error types for shiplabel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shiplabel-core errors (this file)                                     │
//! │  ├── ValidationError  - A finding on one form field (never fatal)      │
//! │  └── CoreError        - Conditions the core cannot derive through      │
//! │                                                                         │
//! │  shiplabel-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Findings vs Failures
//! Validators never return `Err`. A bad postcode or a missing rate is a
//! [`ValidationError`] stored in an error report next to the field it
//! belongs to. Only [`CoreError`] represents an actual failure, and the
//! only one the derivation pipeline can hit is unreadable label metadata.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A validation finding attached to one form field.
///
/// The `Display` text is the user-facing message. Reports serialize each
/// finding as that message string, and any string coming back from the
/// server (address `fieldErrors`, rate provider errors) deserializes into
/// [`ValidationError::Server`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    /// Neither `name` nor `company` was filled in.
    #[error("At least one of these fields is required")]
    NameOrCompanyRequired,

    #[error("Invalid ZIP code format")]
    InvalidZipCode,

    #[error("A phone number is required for this shipment")]
    OriginPhoneRequired,

    #[error("Please enter a valid phone number with 10 digits (for example: 555-555-5555)")]
    InvalidPhone,

    #[error("A destination address phone number is required for this shipment")]
    DestinationPhoneRequired,

    /// The address was normalized but the server returned nothing for it.
    #[error("This address is not recognized. Please try another.")]
    AddressNotRecognized,

    #[error("Please select a package")]
    PackageNotSelected,

    #[error("Invalid weight")]
    InvalidWeight,

    #[error("Package dimensions must be greater than zero")]
    InvalidDimensions,

    #[error("Please describe what kind of goods this package contains")]
    ContentsExplanationRequired,

    #[error("Please describe what kind of restrictions this package must have")]
    RestrictionCommentsRequired,

    #[error("Invalid ITN format")]
    InvalidItn,

    /// A tariff class in this package is declared above the ITN threshold.
    #[error(
        "International Transaction Number is required for shipments containing \
         tariff classification {tariff_number} with a total value above $2,500"
    )]
    ItnRequiredForTariff { tariff_number: String },

    #[error("International Transaction Number is required for shipments to {country}")]
    ItnRequiredForDestination { country: String },

    #[error("Description must be at least {min} characters")]
    DescriptionTooShort { min: usize },

    #[error("Weight must be greater than zero")]
    WeightNotPositive,

    #[error("Declared value must be greater than zero")]
    ValueNotPositive,

    #[error("The tariff number must be 6 digits long")]
    InvalidTariffNumber,

    /// The provider returned errors with no renderable text.
    #[error("We couldn't get a rate for this package, please try again")]
    RateUnavailable,

    #[error("No rates available, please double-check the package dimensions and weight")]
    NoRatesAvailable,

    #[error("Please choose a rate")]
    RateNotSelected,

    #[error("Unsupported paper size: {0}")]
    UnsupportedPaperSize(String),

    /// A message computed elsewhere (server-side validation, rate providers).
    #[error("{0}")]
    Server(String),
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValidationError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ValidationError::Server)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Failures the core cannot turn into a finding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stored label metadata could not be decoded at all.
    ///
    /// ## When This Occurs
    /// - The stored value is not JSON, even after unescaping
    /// - The JSON does not describe a list of label records
    #[error("Malformed label metadata: {reason}")]
    MalformedLabelMeta { reason: String },

    /// A value could not be serialized (digest input, metadata encoding).
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::ItnRequiredForDestination {
            country: "Cuba".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "International Transaction Number is required for shipments to Cuba"
        );

        let err = ValidationError::DescriptionTooShort { min: 3 };
        assert_eq!(err.to_string(), "Description must be at least 3 characters");
    }

    #[test]
    fn test_tariff_message_names_the_class() {
        let err = ValidationError::ItnRequiredForTariff {
            tariff_number: "123456".to_string(),
        };
        assert!(err.to_string().contains("123456"));
    }

    #[test]
    fn test_serializes_as_message() {
        let json = serde_json::to_string(&ValidationError::Required).unwrap();
        assert_eq!(json, "\"This field is required\"");
    }

    #[test]
    fn test_deserializes_server_message() {
        let err: ValidationError = serde_json::from_str("\"Street not found\"").unwrap();
        assert_eq!(err, ValidationError::Server("Street not found".to_string()));
        assert_eq!(err.to_string(), "Street not found");
    }

    #[test]
    fn test_serde_error_converts_to_core_error() {
        let serde_err = serde_json::from_str::<Vec<i32>>("nope").unwrap_err();
        let core_err: CoreError = serde_err.into();
        assert!(matches!(core_err, CoreError::Serialization(_)));
    }
}
