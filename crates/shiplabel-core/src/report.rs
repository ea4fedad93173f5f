//! # Error Reports
//!
//! The structured findings the validators produce and the UI renders.
//!
//! Each address, package and customs item gets a record with one optional
//! slot per field instead of a free-form map. A record with every slot
//! empty means "valid"; [`HasErrors::has_any`] answers that for records,
//! for maps of records, and for the per-package rate message lists.
//!
//! ```text
//! FormErrors
//! ├── origin / destination : AddressErrors
//! ├── packages             : package id ─► PackageErrors
//! ├── customs              : CustomsErrors { packages, items }
//! ├── rates                : package id ─► [ValidationError]
//! └── sidebar              : SidebarErrors
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::AddressField;

// =============================================================================
// Has Errors
// =============================================================================

/// Answers "does this report contain at least one finding?"
pub trait HasErrors {
    fn has_any(&self) -> bool;
}

impl<T: HasErrors> HasErrors for BTreeMap<String, T> {
    fn has_any(&self) -> bool {
        self.values().any(HasErrors::has_any)
    }
}

impl HasErrors for Vec<ValidationError> {
    fn has_any(&self) -> bool {
        !self.is_empty()
    }
}

// =============================================================================
// Address Errors
// =============================================================================

/// Findings for one address, one slot per field.
///
/// Also the shape of the server's `fieldErrors`, which deserialize into
/// [`ValidationError::Server`] messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct AddressErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub name: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub company: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub address: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub address_2: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub city: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub state: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub postcode: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub country: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub phone: Option<ValidationError>,
}

impl AddressErrors {
    fn slot_mut(&mut self, field: AddressField) -> &mut Option<ValidationError> {
        match field {
            AddressField::Name => &mut self.name,
            AddressField::Company => &mut self.company,
            AddressField::Address => &mut self.address,
            AddressField::Address2 => &mut self.address_2,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::Postcode => &mut self.postcode,
            AddressField::Country => &mut self.country,
            AddressField::Phone => &mut self.phone,
        }
    }

    pub fn get(&self, field: AddressField) -> Option<&ValidationError> {
        match field {
            AddressField::Name => self.name.as_ref(),
            AddressField::Company => self.company.as_ref(),
            AddressField::Address => self.address.as_ref(),
            AddressField::Address2 => self.address_2.as_ref(),
            AddressField::City => self.city.as_ref(),
            AddressField::State => self.state.as_ref(),
            AddressField::Postcode => self.postcode.as_ref(),
            AddressField::Country => self.country.as_ref(),
            AddressField::Phone => self.phone.as_ref(),
        }
    }

    /// Records a finding, replacing any earlier one on the same field.
    pub fn set(&mut self, field: AddressField, error: ValidationError) {
        *self.slot_mut(field) = Some(error);
    }

    /// Drops the finding on `field`, if any.
    pub fn clear(&mut self, field: AddressField) {
        *self.slot_mut(field) = None;
    }

    /// Fields that currently carry a finding, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = AddressField> + '_ {
        AddressField::ALL
            .into_iter()
            .filter(move |field| self.get(*field).is_some())
    }
}

impl HasErrors for AddressErrors {
    fn has_any(&self) -> bool {
        self.fields().next().is_some()
    }
}

// =============================================================================
// Package Errors
// =============================================================================

/// Findings for one package's box and measurements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct PackageErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub box_id: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub weight: Option<ValidationError>,
    /// Length, width and height share one finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub dimensions: Option<ValidationError>,
}

impl HasErrors for PackageErrors {
    fn has_any(&self) -> bool {
        self.box_id.is_some() || self.weight.is_some() || self.dimensions.is_some()
    }
}

// =============================================================================
// Customs Errors
// =============================================================================

/// Customs findings for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CustomsPackageErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub contents_explanation: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub restriction_comments: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub itn: Option<ValidationError>,
}

impl HasErrors for CustomsPackageErrors {
    fn has_any(&self) -> bool {
        self.contents_explanation.is_some()
            || self.restriction_comments.is_some()
            || self.itn.is_some()
    }
}

/// Customs findings for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CustomsItemErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub description: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub weight: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub value: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub tariff_number: Option<ValidationError>,
}

impl HasErrors for CustomsItemErrors {
    fn has_any(&self) -> bool {
        self.description.is_some()
            || self.weight.is_some()
            || self.value.is_some()
            || self.tariff_number.is_some()
    }
}

/// The customs step's findings: per package and per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct CustomsErrors {
    pub packages: BTreeMap<String, CustomsPackageErrors>,
    pub items: BTreeMap<String, CustomsItemErrors>,
}

impl HasErrors for CustomsErrors {
    fn has_any(&self) -> bool {
        self.packages.has_any() || self.items.has_any()
    }
}

// =============================================================================
// Rates & Sidebar
// =============================================================================

/// Package id ─► messages explaining why no usable rate is selected.
/// An empty list means the package is fine.
pub type RatesErrors = BTreeMap<String, Vec<ValidationError>>;

/// Findings for the purchase sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SidebarErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub paper_size: Option<ValidationError>,
}

impl HasErrors for SidebarErrors {
    fn has_any(&self) -> bool {
        self.paper_size.is_some()
    }
}

// =============================================================================
// Form Errors
// =============================================================================

/// Every finding for one form snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct FormErrors {
    pub origin: AddressErrors,
    pub destination: AddressErrors,
    pub packages: BTreeMap<String, PackageErrors>,
    pub customs: CustomsErrors,
    #[ts(as = "BTreeMap<String, Vec<String>>")]
    pub rates: RatesErrors,
    pub sidebar: SidebarErrors,
}

impl HasErrors for FormErrors {
    fn has_any(&self) -> bool {
        self.origin.has_any()
            || self.destination.has_any()
            || self.packages.has_any()
            || self.customs.has_any()
            || self.rates.has_any()
            || self.sidebar.has_any()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
