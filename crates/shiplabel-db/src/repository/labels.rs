//! # Label Metadata Repository
//!
//! Reads and writes the purchased-label list stored on an order.
//!
//! ## Storage
//! ```text
//! order_meta
//! ┌──────────┬──────────────────┬───────────────────────────────┬────────────┐
//! │ order_id │ meta_key         │ meta_value                    │ updated_at │
//! ├──────────┼──────────────────┼───────────────────────────────┼────────────┤
//! │ 1042     │ shipping_labels  │ [{"label_id":7,...}]          │ 2026-...   │
//! │ 1043     │ shipping_labels  │ "[{\"label_id\":9,...}]"      │ 2026-...   │ ← escaped by
//! └──────────┴──────────────────┴───────────────────────────────┴────────────┘   an older writer
//! ```
//!
//! Reads accept every shape `decode_label_meta` accepts; writes always
//! store a plain JSON list.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use shiplabel_core::labels::{decode_label_meta_str, encode_label_meta, merge_labels, LabelRecord};

/// Metadata key the label list is stored under.
pub const LABELS_META_KEY: &str = "shipping_labels";

/// Repository for order metadata.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.labels();
/// repo.upsert_labels(1042, vec![record]).await?;
/// let labels = repo.get_labels(1042).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LabelMetaRepository {
    pool: SqlitePool,
}

impl LabelMetaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LabelMetaRepository { pool }
    }

    /// Raw stored text for `(order_id, meta_key)`, if any.
    pub async fn get_raw(&self, order_id: i64, meta_key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT meta_value FROM order_meta WHERE order_id = ?1 AND meta_key = ?2",
        )
        .bind(order_id)
        .bind(meta_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Stores raw text, replacing any previous value.
    pub async fn put_raw(&self, order_id: i64, meta_key: &str, meta_value: &str) -> DbResult<()> {
        debug!(order_id, meta_key, bytes = meta_value.len(), "Writing order meta");

        sqlx::query(
            r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (order_id, meta_key) DO UPDATE SET
                meta_value = excluded.meta_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(order_id)
        .bind(meta_key)
        .bind(meta_value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The order's labels. An order with nothing stored has none.
    ///
    /// ## Errors
    /// [`DbError::InvalidMeta`] when the stored value cannot be decoded.
    pub async fn get_labels(&self, order_id: i64) -> DbResult<Vec<LabelRecord>> {
        let raw = self.get_raw(order_id, LABELS_META_KEY).await?;
        let labels = decode_label_meta_str(raw.as_deref())
            .map_err(|err| DbError::invalid_meta(order_id, err))?;

        debug!(order_id, count = labels.len(), "Loaded labels");
        Ok(labels)
    }

    /// Replaces the order's labels.
    pub async fn save_labels(&self, order_id: i64, labels: &[LabelRecord]) -> DbResult<()> {
        let encoded = encode_label_meta(labels)?;
        self.put_raw(order_id, LABELS_META_KEY, &encoded).await
    }

    /// Merges `updates` into the stored labels (same `label_id` replaced,
    /// new ones first) and returns the result. Runs in one transaction.
    pub async fn upsert_labels(
        &self,
        order_id: i64,
        updates: Vec<LabelRecord>,
    ) -> DbResult<Vec<LabelRecord>> {
        let mut tx = self.pool.begin().await?;

        let raw: Option<String> = sqlx::query_scalar(
            "SELECT meta_value FROM order_meta WHERE order_id = ?1 AND meta_key = ?2",
        )
        .bind(order_id)
        .bind(LABELS_META_KEY)
        .fetch_optional(&mut *tx)
        .await?;

        let existing = decode_label_meta_str(raw.as_deref())
            .map_err(|err| DbError::invalid_meta(order_id, err))?;
        let update_count = updates.len();
        let merged = merge_labels(existing, updates);
        let encoded = encode_label_meta(&merged)?;

        sqlx::query(
            r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (order_id, meta_key) DO UPDATE SET
                meta_value = excluded.meta_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(order_id)
        .bind(LABELS_META_KEY)
        .bind(&encoded)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id,
            updates = update_count,
            total = merged.len(),
            "Labels upserted"
        );
        Ok(merged)
    }

    /// Removes the order's labels. Returns whether anything was stored.
    pub async fn delete_labels(&self, order_id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM order_meta WHERE order_id = ?1 AND meta_key = ?2")
            .bind(order_id)
            .bind(LABELS_META_KEY)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::{json, Value};

    async fn repo() -> LabelMetaRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().labels()
    }

    fn label(label_id: i64, tracking: &str) -> LabelRecord {
        LabelRecord {
            label_id,
            tracking: tracking.to_string(),
            refundable_amount: 7.5,
            created: 1_700_000_000_000,
            carrier_id: "usps".to_string(),
            service_name: "Priority Mail".to_string(),
            package_name: "Medium Box".to_string(),
            product_names: vec!["Lamp".to_string()],
        }
    }

    #[tokio::test]
    async fn test_missing_order_has_no_labels() {
        let repo = repo().await;
        assert!(repo.get_labels(1).await.unwrap().is_empty());
        assert!(repo.get_raw(1, LABELS_META_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = repo().await;
        let labels = vec![label(1, "a"), label(2, "b")];
        repo.save_labels(10, &labels).await.unwrap();

        assert_eq!(repo.get_labels(10).await.unwrap(), labels);
        assert!(repo.get_labels(11).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_escaped_legacy_value_is_read() {
        let repo = repo().await;
        let plain = json!([{ "label_id": 5, "tracking": "9400" }]);
        let escaped = Value::String(plain.to_string()).to_string();
        repo.put_raw(20, LABELS_META_KEY, &escaped).await.unwrap();

        let labels = repo.get_labels(20).await.unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].tracking, "9400");
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() {
        let repo = repo().await;
        repo.put_raw(30, LABELS_META_KEY, "{oops").await.unwrap();

        let err = repo.get_labels(30).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidMeta { order_id: 30, .. }));
    }

    #[tokio::test]
    async fn test_upsert_merges() {
        let repo = repo().await;
        repo.save_labels(40, &[label(1, "old")]).await.unwrap();

        let merged = repo
            .upsert_labels(40, vec![label(2, "new"), label(1, "refreshed")])
            .await
            .unwrap();

        let ids: Vec<i64> = merged.iter().map(|l| l.label_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(merged[1].tracking, "refreshed");
        assert_eq!(repo.get_labels(40).await.unwrap(), merged);
    }

    #[tokio::test]
    async fn test_put_raw_overwrites() {
        let repo = repo().await;
        repo.put_raw(50, "note", "first").await.unwrap();
        repo.put_raw(50, "note", "second").await.unwrap();
        assert_eq!(
            repo.get_raw(50, "note").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_delete_labels() {
        let repo = repo().await;
        repo.save_labels(60, &[label(1, "a")]).await.unwrap();

        assert!(repo.delete_labels(60).await.unwrap());
        assert!(!repo.delete_labels(60).await.unwrap());
        assert!(repo.get_labels(60).await.unwrap().is_empty());
    }
}
