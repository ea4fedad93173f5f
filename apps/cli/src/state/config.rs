//! # Configuration State
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SHIPLABEL_*`)
//! 2. Defaults (this file)
//!
//! ## Environment Variables
//! ```text
//! SHIPLABEL_DB_PATH                    database file (default: platform data dir)
//! SHIPLABEL_COUNTRIES_PATH             country catalog JSON (default: built in)
//! SHIPLABEL_INTERNATIONAL              international labels switched on
//! SHIPLABEL_REQUIRE_DESTINATION_PHONE  destination phone required with customs
//! SHIPLABEL_CURRENCY_SYMBOL            symbol used in formatted totals
//! ```
//!
//! Read-only after initialization.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;
use shiplabel_core::location::StaticFlags;
use shiplabel_core::step::DerivationOptions;
use tracing::warn;

use crate::error::ApiError;

/// Application configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Database file override. `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Country catalog override. `None` uses the built-in catalog.
    pub countries_path: Option<PathBuf>,

    /// Whether labels may ship from or to countries other than the US.
    pub international_labels: bool,

    /// Whether shipments that need a customs form also require a
    /// destination phone. Domestic shipments never do.
    pub require_destination_phone: bool,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for ConfigState {
    /// Domestic-only, USD, platform database path.
    fn default() -> Self {
        ConfigState {
            db_path: None,
            countries_path: None,
            international_labels: false,
            require_destination_phone: false,
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    ///
    /// Unparseable flag values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("SHIPLABEL_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("SHIPLABEL_COUNTRIES_PATH").filter(|p| !p.trim().is_empty()) {
            config.countries_path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("SHIPLABEL_INTERNATIONAL") {
            match parse_flag(&flag) {
                Some(enabled) => config.international_labels = enabled,
                None => warn!(value = %flag, "Ignoring SHIPLABEL_INTERNATIONAL"),
            }
        }

        if let Some(flag) = lookup("SHIPLABEL_REQUIRE_DESTINATION_PHONE") {
            match parse_flag(&flag) {
                Some(required) => config.require_destination_phone = required,
                None => warn!(value = %flag, "Ignoring SHIPLABEL_REQUIRE_DESTINATION_PHONE"),
            }
        }

        if let Some(symbol) = lookup("SHIPLABEL_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Feature flags for country selection.
    pub fn flags(&self) -> StaticFlags {
        StaticFlags {
            international_labels: self.international_labels,
        }
    }

    /// Options for deriving form errors.
    pub fn derivation_options(&self) -> DerivationOptions {
        DerivationOptions {
            require_destination_phone: self.require_destination_phone,
        }
    }

    /// Resolves the database file path.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.shiplabel.shiplabel/shiplabel.db`
    /// - **Windows**: `%APPDATA%\shiplabel\shiplabel\data\shiplabel.db`
    /// - **Linux**: `~/.local/share/shiplabel/shiplabel.db`
    ///
    /// The data directory is created if missing.
    pub fn database_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("com", "shiplabel", "shiplabel")
            .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("shiplabel.db"))
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ConfigState {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigState::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(100), "$1.00");
        assert_eq!(config.format_currency(1), "$0.01");
        assert_eq!(config.format_currency(0), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(-1234), "-$12.34");
        assert_eq!(config.format_currency(-5), "-$0.05");
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert!(config.db_path.is_none());
        assert!(!config.international_labels);
        assert!(!config.derivation_options().require_destination_phone);
    }

    #[test]
    fn test_environment_overrides() {
        let config = config_from(&[
            ("SHIPLABEL_DB_PATH", "/tmp/labels.db"),
            ("SHIPLABEL_INTERNATIONAL", "true"),
            ("SHIPLABEL_REQUIRE_DESTINATION_PHONE", "1"),
            ("SHIPLABEL_CURRENCY_SYMBOL", "US$"),
        ]);

        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/labels.db"));
        assert!(config.flags().international_labels);
        assert!(config.derivation_options().require_destination_phone);
        assert_eq!(config.format_currency(595), "US$5.95");
    }

    #[test]
    fn test_unparseable_flag_is_ignored() {
        let config = config_from(&[("SHIPLABEL_INTERNATIONAL", "maybe")]);
        assert!(!config.international_labels);
    }

    #[test]
    fn test_blank_path_is_ignored() {
        let config = config_from(&[("SHIPLABEL_COUNTRIES_PATH", "  ")]);
        assert!(config.countries_path.is_none());
    }
}
