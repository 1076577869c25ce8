// App configuration - defaults, optional JSON file, environment overrides
//
// Only the shells read configuration. The ledger core takes everything it
// needs as arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "EXPENSE_ANALYZER_CONFIG";
pub const DATA_FILE_VAR: &str = "EXPENSE_ANALYZER_DATA";
pub const SERVER_ADDR_VAR: &str = "EXPENSE_ANALYZER_ADDR";
pub const CURRENCY_VAR: &str = "EXPENSE_ANALYZER_CURRENCY";
pub const LOG_LEVEL_VAR: &str = "EXPENSE_ANALYZER_LOG";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "expense-analyzer.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// CSV file loaded at startup and written by "save"
    #[serde(default = "AppConfig::default_data_file")]
    pub data_file: PathBuf,

    /// Display-only unit for amounts (chart axis, tables)
    #[serde(default = "AppConfig::default_currency_label")]
    pub currency_label: String,

    #[serde(default = "AppConfig::default_server_addr")]
    pub server_addr: String,

    /// Default tracing level for this crate when RUST_LOG is unset
    #[serde(default = "AppConfig::default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: Self::default_data_file(),
            currency_label: Self::default_currency_label(),
            server_addr: Self::default_server_addr(),
            log_level: Self::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn default_data_file() -> PathBuf {
        PathBuf::from("expenses.csv")
    }

    pub fn default_currency_label() -> String {
        "USD".into()
    }

    pub fn default_server_addr() -> String {
        "0.0.0.0:3000".into()
    }

    pub fn default_log_level() -> String {
        "info".into()
    }

    /// Defaults, then the config file (if any), then environment variables.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::from_file_or_default(&path)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Read a JSON config file; a missing file means defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// `load`). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(data_file) = get(DATA_FILE_VAR) {
            self.data_file = PathBuf::from(data_file);
        }
        if let Some(addr) = get(SERVER_ADDR_VAR) {
            self.server_addr = addr;
        }
        if let Some(currency) = get(CURRENCY_VAR) {
            self.currency_label = currency;
        }
        if let Some(level) = get(LOG_LEVEL_VAR) {
            self.log_level = level;
        }
    }

    /// Log file used by the TUI, next to the data file
    pub fn log_file(&self) -> PathBuf {
        self.data_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join("expense-analyzer.log"))
            .unwrap_or_else(|| PathBuf::from("expense-analyzer.log"))
    }

    /// Axis label for the distribution chart
    pub fn amount_label(&self) -> String {
        format!("Amount [{}]", self.currency_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_file, PathBuf::from("expenses.csv"));
        assert_eq!(config.currency_label, "USD");
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.amount_label(), "Amount [USD]");
        assert_eq!(config.log_file(), PathBuf::from("expense-analyzer.log"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::from_file_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expense-analyzer.json");
        fs::write(&path, r#"{ "currency_label": "EUR", "data_file": "/tmp/x/ledger.csv" }"#)
            .unwrap();

        let config = AppConfig::from_file_or_default(&path).unwrap();

        assert_eq!(config.currency_label, "EUR");
        assert_eq!(config.data_file, PathBuf::from("/tmp/x/ledger.csv"));
        assert_eq!(config.server_addr, AppConfig::default_server_addr());
        assert_eq!(config.log_file(), PathBuf::from("/tmp/x/expense-analyzer.log"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(AppConfig::from_file_or_default(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DATA_FILE_VAR, "other.csv"),
            (CURRENCY_VAR, "PLN"),
            (SERVER_ADDR_VAR, "   "),
        ]);

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_file, PathBuf::from("other.csv"));
        assert_eq!(config.currency_label, "PLN");
        assert_eq!(config.server_addr, AppConfig::default_server_addr());
        assert_eq!(config.log_level, "info");
    }
}
