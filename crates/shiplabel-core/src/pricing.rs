//! # Pricing Module
//!
//! Totals the rates the user picked.
//!
//! ## Breakdown
//! ```text
//! for each package with a selection and a matching default quote:
//!
//!   base rate ───────────────────────────────► PriceLine.price
//!   signature tier rate - base rate ─────────► PriceAddon ("Signature required")
//!   charged = signature tier rate or base ───► total
//!   retail rate - base rate ─────────────────► discount
//! ```
//!
//! Quotes are converted to [`Money`] before any arithmetic, so the
//! discount on a 7.00 retail / 5.95 negotiated quote is exactly 1.05.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{RateQuote, RateSelection};
use crate::SIGNATURE_REQUIRED_TIER;

const SIGNATURE_ADDON_TITLE: &str = "Signature required";

/// Display names of the carriers we quote.
const CARRIER_TITLES: [(&str, &str); 4] = [
    ("usps", "USPS"),
    ("fedex", "FedEx"),
    ("ups", "UPS"),
    ("dhlexpress", "DHL Express"),
];

// =============================================================================
// Breakdown Types
// =============================================================================

/// An extra charge on top of a package's base rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceAddon {
    pub title: String,
    pub price: Money,
}

/// One package's charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceLine {
    /// The quoted service, e.g. "USPS - Priority Mail".
    pub title: String,
    pub carrier_title: String,
    /// Base rate, before add-ons.
    pub price: Money,
    pub addons: Vec<PriceAddon>,
}

/// What the selected labels cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    pub prices: Vec<PriceLine>,
    /// Savings against retail, summed over packages.
    pub discount: Money,
    /// Charged amount, add-ons included.
    pub total: Money,
}

// =============================================================================
// Computation
// =============================================================================

/// Computes the price breakdown of the selected rates.
///
/// Returns `None` when no package has both a selection and a matching
/// quote.
///
/// ## Example
/// ```rust
/// use shiplabel_core::pricing::compute_total_price_breakdown;
/// use shiplabel_core::RateSelection;
///
/// assert!(compute_total_price_breakdown(&RateSelection::default()).is_none());
/// ```
pub fn compute_total_price_breakdown(rates: &RateSelection) -> Option<PriceBreakdown> {
    let mut prices = Vec::new();
    let mut discount = Money::zero();
    let mut total = Money::zero();

    for (package_id, selection) in &rates.values {
        if !selection.is_selected() {
            continue;
        }
        let Some(quotes) = rates.available.get(package_id) else {
            continue;
        };
        let Some(base) = quotes.default.find(&selection.service_id) else {
            continue;
        };

        let base_rate = Money::from_decimal(base.rate);
        let mut charged = base_rate;
        let mut addons = Vec::new();

        if selection.signature_required {
            let signed = quotes
                .tiers
                .get(SIGNATURE_REQUIRED_TIER)
                .and_then(|tier| tier.find(&selection.service_id));
            if let Some(signed) = signed {
                let signed_rate = Money::from_decimal(signed.rate);
                addons.push(PriceAddon {
                    title: SIGNATURE_ADDON_TITLE.to_string(),
                    price: signed_rate - base_rate,
                });
                charged = signed_rate;
            }
        }

        if let Some(retail_rate) = base.retail_rate {
            discount += Money::from_decimal(retail_rate) - base_rate;
        }
        total += charged;

        prices.push(PriceLine {
            title: base.title.clone(),
            carrier_title: carrier_title(base),
            price: base_rate,
            addons,
        });
    }

    if prices.is_empty() {
        return None;
    }

    Some(PriceBreakdown {
        prices,
        discount,
        total,
    })
}

/// The carrier's display name: known carrier ids first, then the part of
/// the quote title before " - ".
fn carrier_title(quote: &RateQuote) -> String {
    let known = quote.carrier_id.as_deref().and_then(|carrier_id| {
        CARRIER_TITLES
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(carrier_id))
            .map(|(_, title)| *title)
    });

    match known {
        Some(title) => title.to_string(),
        None => quote
            .title
            .split_once(" - ")
            .map(|(carrier, _)| carrier)
            .unwrap_or(&quote.title)
            .to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
