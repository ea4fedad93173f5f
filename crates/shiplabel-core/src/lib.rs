//! # shiplabel-core: Validation & Pricing for the Label Wizard
//!
//! This crate derives everything the shipping-label wizard needs to know
//! from one immutable form snapshot: which fields are wrong, which step the
//! user should be on, whether "Purchase" is allowed, and what the labels
//! will cost.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shiplabel Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      shiplabel-cli                              │   │
//! │  │    evaluate <form.json>  •  labels list / import               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shiplabel-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  FormState ──┬──► validation (addresses, packages, sidebar)    │   │
//! │  │              ├──► customs (value by tariff class, ITN)         │   │
//! │  │              ├──► rates (provider errors, selection)           │   │
//! │  │              │         │                                        │   │
//! │  │              │         ▼                                        │   │
//! │  │              │    step (first erroneous step, can purchase)    │   │
//! │  │              └──► pricing (lines, discount, total)             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shiplabel-db (Order Metadata)                   │   │
//! │  │              SQLite queries, migrations, label records          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The form snapshot (addresses, packages, customs, rates)
//! - [`report`] - Per-field error records and [`HasErrors`]
//! - [`validation`] - Address, package and sidebar rules
//! - [`customs`] - Customs requirement and customs findings
//! - [`rates`] - Rate findings per package
//! - [`step`] - Form-level derivation and the wizard step gate
//! - [`pricing`] - Price breakdown of the selected rates
//! - [`cache`] - Digest-keyed memoization of the derivations
//! - [`labels`] - Stored label records
//! - [`location`] - Country lookup and feature flags
//! - [`money`] - Integer-cent money
//! - [`error`] - Findings and failures
//!
//! ## Design Principles
//!
//! 1. **Findings, not failures**: validators always return a report
//! 2. **Pure functions**: same snapshot in, equal result out
//! 3. **Integer money**: quotes and declared values become cents once
//!
//! ## Example Usage
//!
//! ```rust
//! use shiplabel_core::location::CountryCatalog;
//! use shiplabel_core::step::{derive_form_errors, first_erroneous_step, DerivationOptions, Step};
//! use shiplabel_core::FormState;
//!
//! let form = FormState::default();
//! let catalog = CountryCatalog::new();
//! let errors = derive_form_errors(&form, &catalog, DerivationOptions::default());
//!
//! assert_eq!(first_erroneous_step(&form, &errors), Some(Step::Origin));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod customs;
pub mod error;
pub mod labels;
pub mod location;
pub mod money;
pub mod pricing;
pub mod rates;
pub mod report;
pub mod step;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use report::{FormErrors, HasErrors};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Countries USPS ships from. ZIP codes in these countries are checked
/// against the US format.
pub const USPS_ORIGIN_COUNTRIES: [&str; 9] = ["US", "PR", "VI", "GU", "AS", "UM", "MH", "FM", "MP"];

/// US military "states". A shipment touching one always needs customs.
pub const US_MILITARY_STATES: [&str; 3] = ["AA", "AE", "AP"];

/// Destinations that need an ITN regardless of declared value.
pub const ITN_REQUIRED_DESTINATIONS: [&str; 5] = ["IR", "SY", "KP", "CU", "SD"];

/// A tariff class declared above this value (strictly) needs an ITN.
pub const ITN_VALUE_THRESHOLD: Money = Money::from_cents(250_000);

pub const MIN_DESCRIPTION_LENGTH: usize = 3;

/// Harmonized-System codes are aggregated only when exactly this long.
pub const TARIFF_NUMBER_LENGTH: usize = 6;

/// Quote tier charged when a package requires a signature.
pub const SIGNATURE_REQUIRED_TIER: &str = "signature_required";

/// Paper sizes the label printer accepts.
pub const PAPER_SIZES: [&str; 4] = ["label", "legal", "letter", "a4"];
