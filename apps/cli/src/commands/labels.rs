//! # Label Commands
//!
//! `shiplabel labels ...`: inspect and maintain the purchased labels stored
//! on orders.
//!
//! ```text
//! labels list 1042             → [LabelSummary, ...]
//! labels import 1042 new.json  → merge (same id replaced, new ones first)
//! labels import 1042 all.json --replace
//! labels clear 1042
//! ```
//!
//! Import files may hold a plain JSON list of label records or the escaped
//! string forms older writers stored.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use shiplabel_core::labels::{decode_label_meta, LabelRecord};
use shiplabel_core::Money;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Arguments for the labels subcommand.
#[derive(Args, Debug)]
pub struct LabelsArgs {
    #[command(subcommand)]
    pub command: LabelsCommand,
}

#[derive(Subcommand, Debug)]
pub enum LabelsCommand {
    /// List the labels stored on an order.
    List { order_id: i64 },

    /// Merge labels from a JSON file into an order.
    Import {
        order_id: i64,
        file: PathBuf,

        /// Overwrite the stored list instead of merging into it.
        #[arg(long)]
        replace: bool,
    },

    /// Remove every label stored on an order.
    Clear { order_id: i64 },
}

/// A stored label, formatted for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    pub label_id: i64,
    pub tracking: String,
    pub carrier_id: String,
    pub service_name: String,
    pub package_name: String,
    pub product_names: Vec<String>,
    pub refundable: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl LabelSummary {
    fn new(label: &LabelRecord, config: &ConfigState) -> Self {
        LabelSummary {
            label_id: label.label_id,
            tracking: label.tracking.clone(),
            carrier_id: label.carrier_id.clone(),
            service_name: label.service_name.clone(),
            package_name: label.package_name.clone(),
            product_names: label.product_names.clone(),
            refundable: config
                .format_currency(Money::from_decimal(label.refundable_amount).cents()),
            created_at: label.created_at(),
        }
    }
}

/// Result of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub order_id: i64,
    pub imported: usize,
    pub total: usize,
}

/// Result of a clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub order_id: i64,
    pub removed: bool,
}

/// Lists the labels stored on `order_id`.
pub async fn list_labels(
    db: &DbState,
    config: &ConfigState,
    order_id: i64,
) -> Result<Vec<LabelSummary>, ApiError> {
    debug!(order_id, "list_labels command");

    let labels = db.labels().get_labels(order_id).await?;
    Ok(labels
        .iter()
        .map(|label| LabelSummary::new(label, config))
        .collect())
}

/// Imports the labels in `file` into `order_id`.
pub async fn import_labels(
    db: &DbState,
    order_id: i64,
    file: &Path,
    replace: bool,
) -> Result<ImportOutcome, ApiError> {
    debug!(order_id, file = %file.display(), replace, "import_labels command");

    let text = std::fs::read_to_string(file)?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        ApiError::invalid_input(format!("{}: not JSON: {}", file.display(), e))
    })?;
    let labels = decode_label_meta(Some(&value))?;
    let imported = labels.len();

    let repo = db.labels();
    let total = if replace {
        repo.save_labels(order_id, &labels).await?;
        imported
    } else {
        repo.upsert_labels(order_id, labels).await?.len()
    };

    info!(order_id, imported, total, "Labels imported");
    Ok(ImportOutcome {
        order_id,
        imported,
        total,
    })
}

/// Removes the labels stored on `order_id`.
pub async fn clear_labels(db: &DbState, order_id: i64) -> Result<ClearOutcome, ApiError> {
    debug!(order_id, "clear_labels command");

    let removed = db.labels().delete_labels(order_id).await?;
    if removed {
        info!(order_id, "Labels cleared");
    }
    Ok(ClearOutcome { order_id, removed })
}
