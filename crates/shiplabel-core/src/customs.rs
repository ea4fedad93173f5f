//! # Customs Module
//!
//! Whether a shipment needs a customs declaration, and what is wrong with
//! the one the user filled in.
//!
//! ## Value Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pass 1: value by product                                               │
//! │    package A: 2 × mug (750.00)  ─┐                                      │
//! │    package B: 1 × mug (750.00)  ─┴──► mug   = 2250.00                   │
//! │    package B: 1 × vase (500.00) ─────► vase  =  500.00                  │
//! │                                                                         │
//! │  Pass 2: value by tariff class (6-character codes only)                 │
//! │    mug  (691200) ─┐                                                     │
//! │    vase (691200) ─┴──► 691200 = 2750.00  > 2500.00  ──► ITN required    │
//! │                                                                         │
//! │  Every package carrying a 691200 product must then have an ITN.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The threshold applies to a tariff class across the whole shipment, so a
//! package holding a single cheap item can still need an ITN.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;
use crate::report::{CustomsErrors, CustomsItemErrors, CustomsPackageErrors};
use crate::types::{AddressValues, CustomsDeclaration, CustomsItem, NumericInput, Package, PackageSet};
use crate::{
    ITN_REQUIRED_DESTINATIONS, ITN_VALUE_THRESHOLD, MIN_DESCRIPTION_LENGTH, TARIFF_NUMBER_LENGTH,
    US_MILITARY_STATES,
};

/// `AES X` + 14 digits, or a `NOEEI 30.` exemption with optional
/// subsection notation such as `NOEEI 30.37(a)` or `NOEEI 30.36(f)(1)`.
static ITN_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:AES X\d{14}|NOEEI 30\.\d{1,2}(?:\([a-z]\)(?:\(\d\))?)?)$")
        .expect("valid regex")
});

const OTHER: &str = "other";

// =============================================================================
// Customs Requirement
// =============================================================================

/// Whether the shipment needs a customs declaration.
///
/// ## Rules
/// - A US military state (`AA`, `AE`, `AP`) on either side: always
/// - Otherwise: only when the countries differ
///
/// ## Example
/// ```rust
/// use shiplabel_core::customs::is_customs_form_required;
/// use shiplabel_core::AddressValues;
///
/// let guam = AddressValues { country: "GU".to_string(), ..Default::default() };
/// assert!(!is_customs_form_required(&guam, &guam));
///
/// let base = AddressValues { country: "US".to_string(), state: "AE".to_string(), ..Default::default() };
/// let home = AddressValues { country: "US".to_string(), state: "TX".to_string(), ..Default::default() };
/// assert!(is_customs_form_required(&home, &base));
/// ```
pub fn is_customs_form_required(origin: &AddressValues, destination: &AddressValues) -> bool {
    let is_military = |values: &AddressValues| {
        values.country == "US" && US_MILITARY_STATES.contains(&values.state.as_str())
    };

    is_military(origin) || is_military(destination) || origin.country != destination.country
}

// =============================================================================
// Aggregation
// =============================================================================

/// Distinct product ids referenced by any package, sorted.
pub fn used_product_ids(packages: &PackageSet) -> BTreeSet<String> {
    packages
        .values()
        .flat_map(|package| package.items.iter())
        .map(|item| item.product_id.clone())
        .collect()
}

/// Declared value of one unit. Missing or unparseable values count as zero.
fn unit_value(item: Option<&CustomsItem>) -> Money {
    item.and_then(|item| item.value.as_ref())
        .and_then(NumericInput::parse)
        .map(Money::from_decimal)
        .unwrap_or_default()
}

/// Pass 1: quantity × unit value, summed over every package.
fn value_by_product(packages: &PackageSet, customs: &CustomsDeclaration) -> BTreeMap<String, Money> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for item in packages.values().flat_map(|package| package.items.iter()) {
        let value = unit_value(customs.items.get(&item.product_id)).times(item.quantity);
        *totals.entry(item.product_id.clone()).or_default() += value;
    }
    totals
}

/// The product's tariff number, when it is one that aggregates.
fn aggregating_tariff<'a>(customs: &'a CustomsDeclaration, product_id: &str) -> Option<&'a str> {
    customs
        .items
        .get(product_id)
        .map(|item| item.tariff_number.as_str())
        .filter(|code| code.chars().count() == TARIFF_NUMBER_LENGTH)
}

/// Pass 2: product totals summed per 6-character tariff number.
///
/// ## Example
/// ```rust
/// use shiplabel_core::customs::value_by_tariff;
/// use shiplabel_core::{CustomsDeclaration, CustomsItem, Package, PackageItem, PackageSet};
///
/// let mut packages = PackageSet::new();
/// packages.insert("p1".into(), Package {
///     items: vec![PackageItem { product_id: "mug".into(), quantity: 2, name: "Mug".into() }],
///     ..Default::default()
/// });
///
/// let mut customs = CustomsDeclaration::default();
/// customs.items.insert("mug".into(), CustomsItem {
///     value: Some(12.5.into()),
///     tariff_number: "691200".into(),
///     ..Default::default()
/// });
///
/// assert_eq!(value_by_tariff(&packages, &customs)["691200"].cents(), 2500);
/// ```
pub fn value_by_tariff(packages: &PackageSet, customs: &CustomsDeclaration) -> BTreeMap<String, Money> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for (product_id, value) in value_by_product(packages, customs) {
        if let Some(code) = aggregating_tariff(customs, &product_id) {
            *totals.entry(code.to_string()).or_default() += value;
        }
    }
    totals
}

// =============================================================================
// Customs Errors
// =============================================================================

/// Computes the customs findings for every package and every used product.
///
/// ## Arguments
/// * `packages` - The shipment's packages
/// * `customs` - The customs declaration
/// * `destination_country_code` - ISO code, for the ITN destination checks
/// * `destination_country_name` - Display name used in the ITN message
///
/// Every package and every used product gets an entry, empty when fine.
pub fn compute_customs_errors(
    packages: &PackageSet,
    customs: &CustomsDeclaration,
    destination_country_code: &str,
    destination_country_name: &str,
) -> CustomsErrors {
    let tariff_totals = value_by_tariff(packages, customs);
    let destination = Destination {
        code: destination_country_code,
        name: destination_country_name,
    };

    let package_errors = packages
        .iter()
        .map(|(id, package)| {
            let errors = check_package(package, customs, &tariff_totals, &destination);
            (id.clone(), errors)
        })
        .collect();

    let item_errors = used_product_ids(packages)
        .into_iter()
        .map(|product_id| {
            let errors = check_item(&product_id, customs);
            (product_id, errors)
        })
        .collect();

    CustomsErrors {
        packages: package_errors,
        items: item_errors,
    }
}

struct Destination<'a> {
    code: &'a str,
    name: &'a str,
}

fn check_package(
    package: &Package,
    customs: &CustomsDeclaration,
    tariff_totals: &BTreeMap<String, Money>,
    destination: &Destination<'_>,
) -> CustomsPackageErrors {
    let mut errors = CustomsPackageErrors::default();

    if package.contents_type == OTHER && package.contents_explanation.is_empty() {
        errors.contents_explanation = Some(ValidationError::ContentsExplanationRequired);
    }

    if package.restriction_type == OTHER && package.restriction_comments.is_empty() {
        errors.restriction_comments = Some(ValidationError::RestrictionCommentsRequired);
    }

    // Sorted, so the message always names the same class
    let over_threshold: BTreeSet<&str> = package
        .items
        .iter()
        .filter_map(|item| aggregating_tariff(customs, &item.product_id))
        .filter(|code| {
            tariff_totals
                .get(*code)
                .is_some_and(|total| *total > ITN_VALUE_THRESHOLD)
        })
        .collect();

    let itn = package
        .itn
        .as_deref()
        .map(str::trim)
        .filter(|itn| !itn.is_empty());

    errors.itn = match itn {
        Some(itn) if !ITN_FORMAT.is_match(itn) => Some(ValidationError::InvalidItn),
        Some(_) => None,
        None if destination.code == "CA" => None,
        None => match over_threshold.first() {
            Some(code) => Some(ValidationError::ItnRequiredForTariff {
                tariff_number: code.to_string(),
            }),
            None if ITN_REQUIRED_DESTINATIONS.contains(&destination.code) => {
                Some(ValidationError::ItnRequiredForDestination {
                    country: destination.name.to_string(),
                })
            }
            None => None,
        },
    };

    errors
}

fn check_item(product_id: &str, customs: &CustomsDeclaration) -> CustomsItemErrors {
    let fallback = CustomsItem::default();
    let item = customs.items.get(product_id).unwrap_or(&fallback);
    let mut errors = CustomsItemErrors::default();

    let description = item.description.as_str();
    if description.is_empty() {
        errors.description = Some(ValidationError::Required);
    } else if description.chars().count() < MIN_DESCRIPTION_LENGTH {
        errors.description = Some(ValidationError::DescriptionTooShort {
            min: MIN_DESCRIPTION_LENGTH,
        });
    }

    if !customs.ignores_weight(product_id) {
        errors.weight = check_positive(item.weight.as_ref(), ValidationError::WeightNotPositive);
    }

    if !customs.ignores_value(product_id) {
        errors.value = check_positive(item.value.as_ref(), ValidationError::ValueNotPositive);
    }

    if !item.tariff_number.is_empty()
        && item.tariff_number.chars().count() != TARIFF_NUMBER_LENGTH
    {
        errors.tariff_number = Some(ValidationError::InvalidTariffNumber);
    }

    errors
}

fn check_positive(input: Option<&NumericInput>, not_positive: ValidationError) -> Option<ValidationError> {
    match input {
        None => Some(ValidationError::Required),
        Some(input) if input.is_blank() => Some(ValidationError::Required),
        Some(input) => match input.parse() {
            Some(value) if value > 0.0 => None,
            _ => Some(not_positive),
        },
    }
}

// =============================================================================
// Review State
// =============================================================================

/// Whether the user has gone through the customs fields of every used
/// product: each one has a tariff number or is explicitly marked as
/// ignoring weight or value validation.
pub fn is_customs_step_reviewed(packages: &PackageSet, customs: &CustomsDeclaration) -> bool {
    used_product_ids(packages).iter().all(|product_id| {
        customs
            .items
            .get(product_id)
            .is_some_and(|item| !item.tariff_number.is_empty())
            || customs.ignores_weight(product_id)
            || customs.ignores_value(product_id)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::HasErrors;
    use crate::types::PackageItem;

    fn item(product_id: &str, quantity: i64) -> PackageItem {
        PackageItem {
            product_id: product_id.to_string(),
            quantity,
            name: product_id.to_string(),
        }
    }

    fn package(items: Vec<PackageItem>) -> Package {
        Package {
            items,
            contents_type: "merchandise".to_string(),
            restriction_type: "none".to_string(),
            ..Default::default()
        }
    }

    fn declared(value: f64, tariff_number: &str) -> CustomsItem {
        CustomsItem {
            description: "Ceramic mug".to_string(),
            weight: Some(1.0.into()),
            value: Some(value.into()),
            tariff_number: tariff_number.to_string(),
        }
    }

    /// Two packages whose products share tariff class 123456: 1500 + 1200.
    fn over_threshold_shipment() -> (PackageSet, CustomsDeclaration) {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1)]));
        packages.insert("p2".to_string(), package(vec![item("b", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert("a".to_string(), declared(1500.0, "123456"));
        customs.items.insert("b".to_string(), declared(1200.0, "123456"));
        (packages, customs)
    }

    fn values(country: &str, state: &str) -> AddressValues {
        AddressValues {
            country: country.to_string(),
            state: state.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_customs_required_between_countries() {
        assert!(is_customs_form_required(&values("US", "CA"), &values("CA", "ON")));
        assert!(!is_customs_form_required(&values("US", "CA"), &values("US", "NY")));
    }

    #[test]
    fn test_customs_not_required_within_territory() {
        assert!(!is_customs_form_required(&values("GU", ""), &values("GU", "")));
    }

    #[test]
    fn test_customs_required_for_military_states() {
        assert!(is_customs_form_required(&values("US", "AA"), &values("US", "TX")));
        assert!(is_customs_form_required(&values("US", "TX"), &values("US", "AP")));
        // Only US military states count
        assert!(!is_customs_form_required(&values("PR", "AE"), &values("PR", "")));
    }

    #[test]
    fn test_itn_required_for_tariff_class_over_threshold() {
        let (packages, customs) = over_threshold_shipment();
        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");

        let expected = Some(ValidationError::ItnRequiredForTariff {
            tariff_number: "123456".to_string(),
        });
        assert_eq!(errors.packages["p1"].itn, expected);
        assert_eq!(errors.packages["p2"].itn, expected);
        assert!(errors.packages["p1"]
            .itn
            .as_ref()
            .is_some_and(|e| e.to_string().contains("123456")));
    }

    #[test]
    fn test_huge_declared_value_still_requires_itn() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 100)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert(
            "a".to_string(),
            CustomsItem {
                value: Some("1e17".into()),
                ..declared(0.0, "710812")
            },
        );

        assert_eq!(value_by_tariff(&packages, &customs)["710812"].cents(), i64::MAX);
        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert_eq!(
            errors.packages["p1"].itn,
            Some(ValidationError::ItnRequiredForTariff {
                tariff_number: "710812".to_string(),
            })
        );
    }

    #[test]
    fn test_description_length_counts_every_character() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert(
            "a".to_string(),
            CustomsItem {
                description: "ab ".to_string(),
                ..declared(10.0, "691200")
            },
        );

        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert_eq!(errors.items["a"].description, None);
    }

    #[test]
    fn test_itn_not_required_to_canada() {
        let (packages, customs) = over_threshold_shipment();
        let errors = compute_customs_errors(&packages, &customs, "CA", "Canada");
        assert!(!errors.has_any(), "{errors:?}");
    }

    #[test]
    fn test_threshold_is_strict() {
        let (packages, mut customs) = over_threshold_shipment();
        customs.items.insert("b".to_string(), declared(1000.0, "123456"));
        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert_eq!(errors.packages["p1"].itn, None);
    }

    #[test]
    fn test_quantity_multiplies_value() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 2)]));
        packages.insert("p2".to_string(), package(vec![item("a", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert("a".to_string(), declared(900.0, "123456"));

        assert_eq!(value_by_tariff(&packages, &customs)["123456"].cents(), 270_000);
    }

    #[test]
    fn test_short_tariff_numbers_do_not_aggregate() {
        let (packages, mut customs) = over_threshold_shipment();
        customs.items.insert("a".to_string(), declared(1500.0, "12345"));
        customs.items.insert("b".to_string(), declared(1200.0, "12345"));

        assert!(value_by_tariff(&packages, &customs).is_empty());
        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert_eq!(errors.packages["p1"].itn, None);
        assert_eq!(errors.items["a"].tariff_number, Some(ValidationError::InvalidTariffNumber));
    }

    #[test]
    fn test_lowest_tariff_class_is_named() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1), item("b", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert("a".to_string(), declared(3000.0, "900000"));
        customs.items.insert("b".to_string(), declared(3000.0, "100000"));

        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert_eq!(
            errors.packages["p1"].itn,
            Some(ValidationError::ItnRequiredForTariff {
                tariff_number: "100000".to_string()
            })
        );
    }

    #[test]
    fn test_itn_required_for_listed_destination() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1)]));
        let mut customs = CustomsDeclaration::default();
        customs.items.insert("a".to_string(), declared(10.0, "123456"));

        let errors = compute_customs_errors(&packages, &customs, "CU", "Cuba");
        assert_eq!(
            errors.packages["p1"].itn,
            Some(ValidationError::ItnRequiredForDestination {
                country: "Cuba".to_string()
            })
        );
    }

    #[test]
    fn test_itn_format() {
        let (mut packages, customs) = over_threshold_shipment();
        for (itn, valid) in [
            ("AES X20230101123456", true),
            ("NOEEI 30.37(a)", true),
            ("NOEEI 30.36(f)(1)", true),
            ("NOEEI 30.2", true),
            ("AES X123", false),
            ("NOEEI 30.37(A)", false),
            ("X20230101123456", false),
        ] {
            if let Some(p1) = packages.get_mut("p1") {
                p1.itn = Some(itn.to_string());
            }
            let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
            let expected = (!valid).then_some(ValidationError::InvalidItn);
            assert_eq!(errors.packages["p1"].itn, expected, "itn {itn:?}");
        }
    }

    #[test]
    fn test_blank_itn_counts_as_missing() {
        let (mut packages, customs) = over_threshold_shipment();
        if let Some(p1) = packages.get_mut("p1") {
            p1.itn = Some("  ".to_string());
        }
        let errors = compute_customs_errors(&packages, &customs, "GB", "United Kingdom");
        assert!(matches!(
            errors.packages["p1"].itn,
            Some(ValidationError::ItnRequiredForTariff { .. })
        ));
    }

    #[test]
    fn test_contents_and_restriction_explanations() {
        let mut p = package(vec![]);
        p.contents_type = "other".to_string();
        p.restriction_type = "other".to_string();
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), p);

        let errors = compute_customs_errors(&packages, &CustomsDeclaration::default(), "GB", "UK");
        assert_eq!(
            errors.packages["p1"].contents_explanation,
            Some(ValidationError::ContentsExplanationRequired)
        );
        assert_eq!(
            errors.packages["p1"].restriction_comments,
            Some(ValidationError::RestrictionCommentsRequired)
        );
    }

    #[test]
    fn test_item_checks() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1), item("b", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert(
            "a".to_string(),
            CustomsItem {
                description: "ab".to_string(),
                weight: Some("0".into()),
                value: Some("abc".into()),
                tariff_number: String::new(),
            },
        );

        let errors = compute_customs_errors(&packages, &customs, "GB", "UK");
        let a = &errors.items["a"];
        assert_eq!(a.description, Some(ValidationError::DescriptionTooShort { min: 3 }));
        assert_eq!(a.weight, Some(ValidationError::WeightNotPositive));
        assert_eq!(a.value, Some(ValidationError::ValueNotPositive));
        assert_eq!(a.tariff_number, None);

        // Not declared at all
        let b = &errors.items["b"];
        assert_eq!(b.description, Some(ValidationError::Required));
        assert_eq!(b.weight, Some(ValidationError::Required));
        assert_eq!(b.value, Some(ValidationError::Required));
    }

    #[test]
    fn test_ignore_flags_suppress_item_checks() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1)]));

        let mut customs = CustomsDeclaration::default();
        customs.items.insert(
            "a".to_string(),
            CustomsItem {
                description: "Ceramic mug".to_string(),
                ..Default::default()
            },
        );
        customs.ignore_weight_validation.insert("a".to_string(), true);
        customs.ignore_value_validation.insert("a".to_string(), true);

        let errors = compute_customs_errors(&packages, &customs, "GB", "UK");
        assert!(!errors.items["a"].has_any());
    }

    #[test]
    fn test_only_used_products_are_checked() {
        let mut packages = PackageSet::new();
        packages.insert("p1".to_string(), package(vec![item("a", 1)]));
        let mut customs = CustomsDeclaration::default();
        customs.items.insert("a".to_string(), declared(10.0, "123456"));
        customs.items.insert("unused".to_string(), CustomsItem::default());

        let errors = compute_customs_errors(&packages, &customs, "GB", "UK");
        assert_eq!(errors.items.len(), 1);
        assert!(!errors.has_any());
    }

    #[test]
    fn test_customs_step_reviewed() {
        let (packages, mut customs) = over_threshold_shipment();
        assert!(is_customs_step_reviewed(&packages, &customs));

        customs.items.insert("b".to_string(), declared(1200.0, ""));
        assert!(!is_customs_step_reviewed(&packages, &customs));

        customs.ignore_value_validation.insert("b".to_string(), true);
        assert!(is_customs_step_reviewed(&packages, &customs));
    }

    #[test]
    fn test_compute_customs_errors_is_idempotent() {
        let (packages, customs) = over_threshold_shipment();
        assert_eq!(
            compute_customs_errors(&packages, &customs, "SY", "Syria"),
            compute_customs_errors(&packages, &customs, "SY", "Syria")
        );
    }
}
