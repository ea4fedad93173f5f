//! # Label Records
//!
//! Purchased labels are stored on the order as a JSON list. Depending on
//! which code path wrote it, the stored value may be the list itself or
//! that list serialized into a string, sometimes twice.
//!
//! ```text
//! [ {...} ]                         ─┐
//! "[ {\"label_id\": 1, ...} ]"       ─┼──► decode_label_meta ──► Vec<LabelRecord>
//! "\"[ {\\\"label_id\\\": 1 } ]\""   ─┤
//! null / "" / absent                ─┘                           (empty)
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// How many string layers are peeled off before giving up.
pub const MAX_ESCAPE_LAYERS: usize = 3;

/// One purchased label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabelRecord {
    pub label_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracking: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refundable_amount: f64,
    /// Purchase time, epoch milliseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub carrier_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_names: Vec<String>,
}

impl LabelRecord {
    /// Purchase time, if `created` is a representable timestamp.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Decoding
// =============================================================================

fn malformed(reason: impl Into<String>) -> CoreError {
    CoreError::MalformedLabelMeta {
        reason: reason.into(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Decodes stored label metadata.
///
/// ## Accepted Shapes
/// - absent, `null` or a blank string: no labels
/// - a list of records
/// - a string holding any of the above, up to [`MAX_ESCAPE_LAYERS`] deep
///
/// ## Errors
/// [`CoreError::MalformedLabelMeta`] when the value is not JSON after
/// unescaping or does not describe a list of records.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use shiplabel_core::labels::decode_label_meta;
///
/// let plain = json!([{ "label_id": 7, "tracking": "9400" }]);
/// let escaped = json!(plain.to_string());
///
/// assert_eq!(
///     decode_label_meta(Some(&plain)).unwrap(),
///     decode_label_meta(Some(&escaped)).unwrap()
/// );
/// assert!(decode_label_meta(None).unwrap().is_empty());
/// ```
pub fn decode_label_meta(value: Option<&Value>) -> CoreResult<Vec<LabelRecord>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let mut current = value.clone();
    for layer in 0..=MAX_ESCAPE_LAYERS {
        match current {
            Value::Null => return Ok(Vec::new()),
            Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
            Value::String(_) if layer == MAX_ESCAPE_LAYERS => break,
            Value::String(text) => {
                debug!(layer, "Unescaping label metadata");
                current = serde_json::from_str(&text)
                    .map_err(|err| malformed(format!("not JSON at layer {layer}: {err}")))?;
            }
            Value::Array(_) => {
                return serde_json::from_value(current)
                    .map_err(|err| malformed(format!("invalid label record: {err}")));
            }
            other => {
                return Err(malformed(format!(
                    "expected a list of labels, found {}",
                    kind_of(&other)
                )));
            }
        }
    }

    Err(malformed(format!(
        "more than {MAX_ESCAPE_LAYERS} layers of escaping"
    )))
}

/// Decodes the raw text of a stored metadata value.
pub fn decode_label_meta_str(raw: Option<&str>) -> CoreResult<Vec<LabelRecord>> {
    decode_label_meta(raw.map(|text| Value::String(text.to_string())).as_ref())
}

/// Encodes labels the way they are stored: a plain JSON list.
pub fn encode_label_meta(labels: &[LabelRecord]) -> CoreResult<String> {
    Ok(serde_json::to_string(labels)?)
}

// =============================================================================
// Merging
// =============================================================================

/// Applies `updates` to `existing`.
///
/// A record whose `label_id` already exists replaces it in place; new
/// records go in front, newest first, in the order given.
pub fn merge_labels(existing: Vec<LabelRecord>, updates: Vec<LabelRecord>) -> Vec<LabelRecord> {
    let known: HashSet<i64> = existing.iter().map(|label| label.label_id).collect();
    let (replacements, mut merged): (Vec<_>, Vec<_>) = updates
        .into_iter()
        .partition(|label| known.contains(&label.label_id));

    merged.extend(existing.into_iter().map(|label| {
        replacements
            .iter()
            .rev()
            .find(|update| update.label_id == label.label_id)
            .cloned()
            .unwrap_or(label)
    }));
    merged
}

// =============================================================================
// Unit Tests
// =============================================================================
