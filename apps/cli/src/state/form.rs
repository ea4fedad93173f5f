//! # Form State
//!
//! The label form being evaluated, plus the derivation cache that serves
//! its findings.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Form State Operations                                │
//! │                                                                         │
//! │  load(form)  ─────────────────► replace snapshot, cache.clear()        │
//! │                                                                         │
//! │  update(Subtree::Rates, |f| …) ► edit snapshot, cache.invalidate(Rates)│
//! │                                                                         │
//! │  errors() / price_breakdown() ─► cache.derive_* (hit when unchanged)   │
//! │                                                                         │
//! │  All access goes through one async Mutex.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use shiplabel_core::cache::{CacheStats, DerivationCache, Subtree};
use shiplabel_core::location::Locations;
use shiplabel_core::pricing::PriceBreakdown;
use shiplabel_core::step::DerivationOptions;
use shiplabel_core::{FormErrors, FormState};
use tokio::sync::Mutex;
use tracing::debug;

/// The current form snapshot and its memoized findings.
#[derive(Debug, Default)]
pub struct FormStore {
    form: Option<FormState>,
    cache: DerivationCache,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded snapshot, if any.
    pub fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    /// Replaces the snapshot. Every cached finding is dropped.
    pub fn load(&mut self, form: FormState) {
        self.form = Some(form);
        self.cache.clear();
        debug!("Form loaded");
    }

    /// Edits one subtree of the snapshot and drops the findings derived
    /// from it. Returns `false` when no form is loaded.
    pub fn update<F>(&mut self, subtree: Subtree, edit: F) -> bool
    where
        F: FnOnce(&mut FormState),
    {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        edit(form);
        self.cache.invalidate(subtree);
        debug!(?subtree, "Form updated");
        true
    }

    /// Sets the sidebar paper size. Paper size findings are never cached.
    pub fn set_paper_size(&mut self, paper_size: Option<String>) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        form.paper_size = paper_size;
        true
    }

    /// Findings for the loaded snapshot.
    pub fn errors(
        &mut self,
        locations: &dyn Locations,
        options: DerivationOptions,
    ) -> Option<FormErrors> {
        let form = self.form.as_ref()?;
        Some(self.cache.derive_form_errors(form, locations, options))
    }

    /// Price breakdown of the selected rates, if every package has one.
    pub fn price_breakdown(&mut self) -> Option<PriceBreakdown> {
        let form = self.form.as_ref()?;
        self.cache.price_breakdown(&form.rates)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Shared handle to the form store.
#[derive(Debug, Clone, Default)]
pub struct FormStoreState {
    store: Arc<Mutex<FormStore>>,
}

impl FormStoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the store.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let loaded = state.with_store(|store| store.form().is_some()).await;
    /// ```
    pub async fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FormStore) -> R,
    {
        let store = self.store.lock().await;
        f(&store)
    }

    /// Executes a function with write access to the store. Deriving
    /// findings needs this, since it fills the cache.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let errors = state.with_store_mut(|store| store.errors(&catalog, options)).await;
    /// ```
    pub async fn with_store_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FormStore) -> R,
    {
        let mut store = self.store.lock().await;
        f(&mut store)
    }
}
