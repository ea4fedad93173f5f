//! # Domain Types
//!
//! The form snapshot the wizard derives everything from.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           FormState                                     │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │ origin       │  │ destination  │  │ packages: id ─► Package      │  │
//! │  │  Address     │  │  Address     │  │   box_id, items, dims,       │  │
//! │  │  values      │  │  values      │  │   contents, restriction, itn │  │
//! │  │  normalized  │  │  normalized  │  └──────────────────────────────┘  │
//! │  └──────────────┘  └──────────────┘                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌──────────────────────────────┐    │
//! │  │ customs                      │  │ rates                        │    │
//! │  │  items: product ─► CustomsItem│  │  values: id ─► SelectedRate  │    │
//! │  │  ignore weight/value flags   │  │  available: id ─► quotes     │    │
//! │  └──────────────────────────────┘  └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Snapshots arrive as the admin UI's JSON. Field names follow that JSON
//! (a mix of camelCase and snake_case), so most structs carry serde
//! renames. Every map is a `BTreeMap` so that iteration order and the
//! serialized bytes fed to the derivation cache are deterministic.
//!
//! Validators only ever read these types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::report::AddressErrors;

// =============================================================================
// Form State
// =============================================================================

/// Immutable snapshot of the label purchase form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub origin: Address,
    pub destination: Address,
    pub packages: PackageSet,
    pub customs: CustomsDeclaration,
    pub rates: RateSelection,
    #[serde(alias = "paper_size")]
    pub paper_size: Option<String>,
}

// =============================================================================
// Address
// =============================================================================

/// The editable fields of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValues {
    pub name: String,
    pub company: String,
    pub address: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
}

impl AddressValues {
    /// Returns the value of one field.
    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::Name => &self.name,
            AddressField::Company => &self.company,
            AddressField::Address => &self.address,
            AddressField::Address2 => &self.address_2,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Postcode => &self.postcode,
            AddressField::Country => &self.country,
            AddressField::Phone => &self.phone,
        }
    }
}

/// Names an address field. Used as the key of `ignoreValidation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AddressField {
    Name,
    Company,
    Address,
    #[serde(rename = "address_2")]
    Address2,
    City,
    State,
    Postcode,
    Country,
    Phone,
}

impl AddressField {
    pub const ALL: [AddressField; 9] = [
        AddressField::Name,
        AddressField::Company,
        AddressField::Address,
        AddressField::Address2,
        AddressField::City,
        AddressField::State,
        AddressField::Postcode,
        AddressField::Country,
        AddressField::Phone,
    ];
}

/// An origin or destination address together with its verification state.
///
/// ## Normalization Lifecycle
/// ```text
/// values edited ──► normalization_in_progress ──► server answers
///                                                   │
///            ┌──────────────────────────────────────┼─────────────────┐
///            ▼                                      ▼                 ▼
///  is_normalized + normalized        is_normalized, no normalized   is_unverifiable
///  (verified, user picks one)        (+ field_errors, maybe)        (+ field_errors)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub values: AddressValues,
    pub is_normalized: bool,
    pub is_unverifiable: bool,
    /// Server-confirmed form of the address, if the server produced one.
    pub normalized: Option<AddressValues>,
    /// Fields whose errors the user or server chose to suppress.
    pub ignore_validation: BTreeMap<AddressField, bool>,
    /// Errors computed server-side for an address it could not normalize.
    pub field_errors: Option<AddressErrors>,
    pub normalization_in_progress: bool,
}

impl Address {
    /// Whether errors on `field` are suppressed.
    pub fn ignores(&self, field: AddressField) -> bool {
        self.ignore_validation.get(&field).copied().unwrap_or(false)
    }

    /// Whether the current values are exactly the server-confirmed ones.
    pub fn matches_normalized(&self) -> bool {
        self.normalized.as_ref() == Some(&self.values)
    }
}

// =============================================================================
// Packages
// =============================================================================

/// Package id ─► package.
pub type PackageSet = BTreeMap<String, Package>;

/// Which box a package ships in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum BoxId {
    /// The user has not picked a box yet.
    #[default]
    NotSelected,
    /// Ship the item in its own packaging.
    Individual,
    /// A box from the packaging catalog.
    Catalog(String),
}

impl BoxId {
    pub fn as_str(&self) -> &str {
        match self {
            BoxId::NotSelected => "not_selected",
            BoxId::Individual => "individual",
            BoxId::Catalog(id) => id,
        }
    }
}

impl From<String> for BoxId {
    fn from(value: String) -> Self {
        match value.as_str() {
            "not_selected" | "" => BoxId::NotSelected,
            "individual" => BoxId::Individual,
            _ => BoxId::Catalog(value),
        }
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BoxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BoxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(BoxId::from)
    }
}

/// One product line inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageItem {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub name: String,
}

fn default_quantity() -> i64 {
    1
}

/// A package in the shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Package {
    #[serde(rename = "box_id")]
    pub box_id: BoxId,
    pub items: Vec<PackageItem>,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub weight: f64,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub length: f64,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub width: f64,
    #[serde(deserialize_with = "deserialize_dimension")]
    pub height: f64,
    pub contents_type: String,
    pub contents_explanation: String,
    pub restriction_type: String,
    pub restriction_comments: String,
    /// International Transaction Number, when the user entered one.
    pub itn: Option<String>,
}

/// Dimensions arrive as numbers, numeric strings, or null. Anything that
/// does not parse becomes NaN, which the package validator rejects.
fn deserialize_dimension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let input = Option::<NumericInput>::deserialize(deserializer)?;
    Ok(input.and_then(|value| value.parse()).unwrap_or(f64::NAN))
}

// =============================================================================
// Customs
// =============================================================================

/// A number typed into a form: either a JSON number or the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

impl NumericInput {
    /// Parses the input the way a browser's `parseFloat` does: leading
    /// whitespace is skipped and the longest numeric prefix wins, so
    /// `"12.5 lbs"` reads as `12.5`. Returns `None` when nothing numeric
    /// is present.
    pub fn parse(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) if n.is_finite() => Some(*n),
            NumericInput::Number(_) => None,
            NumericInput::Text(text) => NUMERIC_PREFIX
                .find(text.trim_start())
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|n| n.is_finite()),
        }
    }

    /// Whether the user left the field empty.
    pub fn is_blank(&self) -> bool {
        match self {
            NumericInput::Number(_) => false,
            NumericInput::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

/// Customs data for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomsItem {
    pub description: String,
    pub weight: Option<NumericInput>,
    /// Declared value per unit.
    pub value: Option<NumericInput>,
    /// Harmonized-System code, 6 characters when present.
    pub tariff_number: String,
}

/// The customs declaration for the whole shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomsDeclaration {
    /// Product id ─► customs data.
    pub items: BTreeMap<String, CustomsItem>,
    pub ignore_weight_validation: BTreeMap<String, bool>,
    pub ignore_value_validation: BTreeMap<String, bool>,
}

impl CustomsDeclaration {
    pub fn ignores_weight(&self, product_id: &str) -> bool {
        self.ignore_weight_validation
            .get(product_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn ignores_value(&self, product_id: &str) -> bool {
        self.ignore_value_validation
            .get(product_id)
            .copied()
            .unwrap_or(false)
    }
}

// =============================================================================
// Rates
// =============================================================================

/// The user's rate pick for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectedRate {
    pub service_id: String,
    pub signature_required: bool,
}

impl SelectedRate {
    pub fn is_selected(&self) -> bool {
        !self.service_id.is_empty()
    }
}

/// A single carrier service quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub service_id: String,
    #[serde(default)]
    pub carrier_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub rate: f64,
    /// Price without the negotiated discount. Missing means no discount.
    #[serde(default)]
    pub retail_rate: Option<f64>,
}

/// An error returned by a rate provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateError {
    pub message: Option<String>,
    #[serde(alias = "user_message")]
    pub user_message: Option<String>,
}

impl RateError {
    /// The text to show the user: the friendly message if any, else the raw
    /// one. Blank strings count as absent.
    pub fn display_message(&self) -> Option<&str> {
        [self.user_message.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

/// Rates quoted for one package at one signature tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSet {
    pub rates: Vec<RateQuote>,
    pub errors: Vec<RateError>,
}

impl QuoteSet {
    pub fn find(&self, service_id: &str) -> Option<&RateQuote> {
        self.rates.iter().find(|r| r.service_id == service_id)
    }
}

/// All quotes for one package: the base tier plus any signature tiers
/// (`signature_required`, ...) keyed by tier name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageQuotes {
    #[serde(default)]
    pub default: QuoteSet,
    #[serde(flatten)]
    pub tiers: BTreeMap<String, QuoteSet>,
}

/// Rate picks and quotes for the shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateSelection {
    pub values: BTreeMap<String, SelectedRate>,
    pub available: BTreeMap<String, PackageQuotes>,
    pub retrieval_in_progress: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_box_id_from_wire() {
        assert_eq!(BoxId::from("not_selected".to_string()), BoxId::NotSelected);
        assert_eq!(BoxId::from("individual".to_string()), BoxId::Individual);
        assert_eq!(
            BoxId::from("small_flat_box".to_string()),
            BoxId::Catalog("small_flat_box".to_string())
        );
    }

    #[test]
    fn test_numeric_input_parse() {
        assert_eq!(NumericInput::from("12.5").parse(), Some(12.5));
        assert_eq!(NumericInput::from("  3 lbs").parse(), Some(3.0));
        assert_eq!(NumericInput::from(".5").parse(), Some(0.5));
        assert_eq!(NumericInput::from("abc").parse(), None);
        assert_eq!(NumericInput::from("").parse(), None);
        assert_eq!(NumericInput::from(4.0).parse(), Some(4.0));
        assert!(NumericInput::from("  ").is_blank());
        assert!(!NumericInput::from(0.0).is_blank());
    }

    #[test]
    fn test_package_from_json() {
        let package: Package = serde_json::from_value(json!({
            "box_id": "individual",
            "items": [{ "product_id": "42", "quantity": 2, "name": "Mug" }],
            "weight": "1.5",
            "length": 10,
            "width": null,
            "contentsType": "merchandise"
        }))
        .unwrap();

        assert_eq!(package.box_id, BoxId::Individual);
        assert_eq!(package.items[0].quantity, 2);
        assert_eq!(package.weight, 1.5);
        assert_eq!(package.length, 10.0);
        assert!(package.width.is_nan());
        assert_eq!(package.height, 0.0);
        assert_eq!(package.contents_type, "merchandise");
    }

    #[test]
    fn test_package_quotes_flatten_tiers() {
        let quotes: PackageQuotes = serde_json::from_value(json!({
            "default": { "rates": [{ "service_id": "pri", "rate": 5.0, "retail_rate": 6.0 }] },
            "signature_required": { "rates": [{ "service_id": "pri", "rate": 7.5 }] }
        }))
        .unwrap();

        assert_eq!(quotes.default.rates.len(), 1);
        assert_eq!(quotes.tiers["signature_required"].rates[0].rate, 7.5);
        assert!(quotes.default.errors.is_empty());
    }

    #[test]
    fn test_address_ignore_flags() {
        let address: Address = serde_json::from_value(json!({
            "values": { "country": "US" },
            "ignoreValidation": { "state": true, "phone": false }
        }))
        .unwrap();

        assert!(address.ignores(AddressField::State));
        assert!(!address.ignores(AddressField::Phone));
        assert!(!address.ignores(AddressField::City));
    }

    #[test]
    fn test_rate_error_display_message() {
        let err = RateError {
            message: Some("raw".to_string()),
            user_message: Some("  ".to_string()),
        };
        assert_eq!(err.display_message(), Some("raw"));
        assert_eq!(RateError::default().display_message(), None);
    }
}
