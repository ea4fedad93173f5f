//! # Form Commands
//!
//! `shiplabel evaluate`: derives every finding for a form snapshot and
//! reports where the wizard should open.
//!
//! ## Report Shape
//! ```json
//! {
//!   "step": "rates",
//!   "canPurchase": false,
//!   "customsRequired": false,
//!   "errors": { "origin": {}, "rates": { "p1": ["Please choose a rate"] }, ... },
//!   "priceBreakdown": null,
//!   "formattedTotal": null
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use shiplabel_core::cache::Subtree;
use shiplabel_core::customs::is_customs_form_required;
use shiplabel_core::pricing::PriceBreakdown;
use shiplabel_core::step::{can_purchase, first_erroneous_step, Step};
use shiplabel_core::{FormErrors, FormState, SelectedRate};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, FormStoreState, LocationsState};

/// Arguments for the evaluate subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Form snapshot JSON file, or `-` for stdin.
    pub form: PathBuf,

    /// Override the paper size picked in the sidebar.
    #[arg(long)]
    pub paper_size: Option<String>,

    /// Pick a rate before evaluating: PACKAGE=SERVICE, or
    /// PACKAGE=SERVICE:signature to add signature confirmation.
    #[arg(long = "select", value_name = "PACKAGE=SERVICE", value_parser = parse_rate_choice)]
    pub selections: Vec<RateChoice>,
}

/// A rate pick given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateChoice {
    pub package_id: String,
    pub service_id: String,
    pub signature_required: bool,
}

/// Parses `PACKAGE=SERVICE[:signature]`.
pub fn parse_rate_choice(input: &str) -> Result<RateChoice, String> {
    let (package_id, service) = input
        .split_once('=')
        .ok_or_else(|| format!("expected PACKAGE=SERVICE, got '{}'", input))?;

    let (service_id, signature_required) = match service.rsplit_once(':') {
        Some((service_id, "signature")) => (service_id, true),
        Some((_, suffix)) => return Err(format!("unknown rate option '{}'", suffix)),
        None => (service, false),
    };

    if package_id.trim().is_empty() || service_id.trim().is_empty() {
        return Err(format!("expected PACKAGE=SERVICE, got '{}'", input));
    }

    Ok(RateChoice {
        package_id: package_id.trim().to_string(),
        service_id: service_id.trim().to_string(),
        signature_required,
    })
}

/// Everything the wizard needs to render a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReport {
    /// First step with something to fix. `None` means every step is valid.
    pub step: Option<Step>,
    pub can_purchase: bool,
    pub customs_required: bool,
    pub errors: FormErrors,
    pub price_breakdown: Option<PriceBreakdown>,
    pub formatted_total: Option<String>,
}

/// Loads the snapshot from `args.form`, applies the overrides, and
/// evaluates it.
pub async fn evaluate(
    args: &EvaluateArgs,
    store: &FormStoreState,
    locations: &LocationsState,
    config: &ConfigState,
) -> Result<FormReport, ApiError> {
    let form = read_form(&args.form)?;
    store.with_store_mut(|store| store.load(form)).await;

    if let Some(paper_size) = &args.paper_size {
        let paper_size = paper_size.clone();
        store
            .with_store_mut(|store| store.set_paper_size(Some(paper_size)))
            .await;
    }

    if !args.selections.is_empty() {
        let selections = args.selections.clone();
        store
            .with_store_mut(|store| {
                store.update(Subtree::Rates, |form| select_rates(form, selections))
            })
            .await;
    }

    evaluate_loaded(store, locations, config).await
}

/// Evaluates whatever snapshot the store holds.
pub async fn evaluate_loaded(
    store: &FormStoreState,
    locations: &LocationsState,
    config: &ConfigState,
) -> Result<FormReport, ApiError> {
    let options = config.derivation_options();

    let report = store
        .with_store_mut(|store| {
            let errors = store
                .errors(locations.catalog(), options)
                .ok_or_else(|| ApiError::invalid_input("No form loaded"))?;
            let price_breakdown = store.price_breakdown();
            let stats = store.cache_stats();
            debug!(hits = stats.hits, misses = stats.misses, "Derivation cache");

            let form = store
                .form()
                .ok_or_else(|| ApiError::invalid_input("No form loaded"))?;

            Ok::<_, ApiError>(FormReport {
                step: first_erroneous_step(form, &errors),
                can_purchase: can_purchase(Some(form), &errors),
                customs_required: is_customs_form_required(
                    &form.origin.values,
                    &form.destination.values,
                ),
                formatted_total: price_breakdown
                    .as_ref()
                    .map(|breakdown| config.format_currency(breakdown.total.cents())),
                price_breakdown,
                errors,
            })
        })
        .await?;

    info!(
        step = report.step.map(|s| s.as_str()).unwrap_or("none"),
        can_purchase = report.can_purchase,
        "Form evaluated"
    );
    Ok(report)
}

/// Reads a form snapshot from a file, or stdin for `-`.
pub fn read_form(path: &Path) -> Result<FormState, ApiError> {
    let text = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };

    serde_json::from_str(&text).map_err(|e| {
        ApiError::invalid_input(format!("{}: not a form snapshot: {}", path.display(), e))
    })
}

fn select_rates(form: &mut FormState, selections: Vec<RateChoice>) {
    for choice in selections {
        form.rates.values.insert(
            choice.package_id,
            SelectedRate {
                service_id: choice.service_id,
                signature_required: choice.signature_required,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiplabel_core::HasErrors;

    const DOMESTIC_FORM: &str = r#"{
        "origin": {
            "values": { "name": "Jane Doe", "address": "1 Main St", "city": "Springfield",
                        "state": "IL", "postcode": "62701", "country": "US", "phone": "217-555-0100" },
            "normalized": { "name": "Jane Doe", "address": "1 Main St", "city": "Springfield",
                            "state": "IL", "postcode": "62701", "country": "US", "phone": "217-555-0100" },
            "isNormalized": true
        },
        "destination": {
            "values": { "name": "John Roe", "address": "9 Elm St", "city": "Albany",
                        "state": "NY", "postcode": "12207", "country": "US" },
            "normalized": { "name": "John Roe", "address": "9 Elm St", "city": "Albany",
                            "state": "NY", "postcode": "12207", "country": "US" },
            "isNormalized": true
        },
        "packages": {
            "p1": { "box_id": "individual", "weight": 1.5, "length": 6, "width": 4, "height": "3",
                    "items": [{ "product_id": "mug", "quantity": 2, "name": "Mug" }] }
        },
        "rates": {
            "available": {
                "p1": {
                    "default": { "rates": [
                        { "service_id": "priority", "carrier_id": "usps",
                          "title": "USPS - Priority Mail", "rate": 5.95, "retail_rate": 7.0 }
                    ] },
                    "signature_required": { "rates": [
                        { "service_id": "priority", "carrier_id": "usps",
                          "title": "USPS - Priority Mail", "rate": 8.2 }
                    ] }
                }
            }
        },
        "paperSize": "label"
    }"#;

    fn locations() -> LocationsState {
        LocationsState::load(&ConfigState::default()).unwrap()
    }

    async fn evaluate_json(json: &str, selections: Vec<RateChoice>) -> FormReport {
        let mut form: FormState = serde_json::from_str(json).unwrap();
        select_rates(&mut form, selections);

        let store = FormStoreState::new();
        store.with_store_mut(|store| store.load(form)).await;
        evaluate_loaded(&store, &locations(), &ConfigState::default())
            .await
            .unwrap()
    }

    fn priority(signature_required: bool) -> RateChoice {
        RateChoice {
            package_id: "p1".to_string(),
            service_id: "priority".to_string(),
            signature_required,
        }
    }

    #[test]
    fn test_parse_rate_choice() {
        assert_eq!(parse_rate_choice("p1=priority").unwrap(), priority(false));
        assert_eq!(
            parse_rate_choice("p1=priority:signature").unwrap(),
            priority(true)
        );
        assert!(parse_rate_choice("p1").is_err());
        assert!(parse_rate_choice("=priority").is_err());
        assert!(parse_rate_choice("p1=priority:adult").is_err());
    }

    #[tokio::test]
    async fn test_unselected_rate_stops_at_rates() {
        let report = evaluate_json(DOMESTIC_FORM, vec![]).await;

        assert_eq!(report.step, Some(Step::Rates));
        assert!(!report.can_purchase);
        assert!(!report.customs_required);
        assert!(!report.errors.origin.has_any());
        assert!(report.price_breakdown.is_none());
        assert!(report.formatted_total.is_none());
    }

    #[tokio::test]
    async fn test_selected_rate_is_purchasable() {
        let report = evaluate_json(DOMESTIC_FORM, vec![priority(false)]).await;

        assert_eq!(report.step, None);
        assert!(report.can_purchase);
        let breakdown = report.price_breakdown.unwrap();
        assert_eq!(breakdown.total.cents(), 595);
        assert_eq!(breakdown.discount.cents(), 105);
        assert_eq!(report.formatted_total.as_deref(), Some("$5.95"));
    }

    #[tokio::test]
    async fn test_signature_adds_to_total() {
        let report = evaluate_json(DOMESTIC_FORM, vec![priority(true)]).await;

        let breakdown = report.price_breakdown.unwrap();
        assert_eq!(breakdown.prices[0].addons[0].price.cents(), 225);
        assert_eq!(report.formatted_total.as_deref(), Some("$8.20"));
    }

    #[tokio::test]
    async fn test_international_destination_needs_customs() {
        let json = DOMESTIC_FORM.replace(
            r#""state": "NY", "postcode": "12207", "country": "US""#,
            r#""state": "", "postcode": "SW1A 2AA", "country": "GB""#,
        );
        let report = evaluate_json(&json, vec![priority(false)]).await;

        assert!(report.customs_required);
        assert_eq!(report.step, Some(Step::Customs));
        assert!(report.errors.customs.items.contains_key("mug"));
        assert!(!report.can_purchase);
    }

    #[tokio::test]
    async fn test_no_form_loaded() {
        let err = evaluate_loaded(&FormStoreState::new(), &locations(), &ConfigState::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_evaluate_reads_file_and_applies_overrides() {
        let path = std::env::temp_dir().join(format!("shiplabel-form-{}.json", std::process::id()));
        std::fs::write(&path, DOMESTIC_FORM).unwrap();

        let args = EvaluateArgs {
            form: path.clone(),
            paper_size: Some("napkin".to_string()),
            selections: vec![priority(false)],
        };
        let report = evaluate(&args, &FormStoreState::new(), &locations(), &ConfigState::default())
            .await
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(report.errors.sidebar.paper_size.is_some());
        assert_eq!(report.step, None);
        assert!(report.can_purchase);
    }

    #[test]
    fn test_read_form_rejects_garbage() {
        let path = std::env::temp_dir().join(format!("shiplabel-bad-{}.json", std::process::id()));
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = read_form(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }
}
