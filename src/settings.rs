use std::collections::HashMap;
use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// One column name, or an ordered list of columns concatenated with a space
/// (empty parts skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptionColumns {
    Single(String),
    Joined(Vec<String>),
}

/// Maps a bank export's CSV columns onto the internal transaction shape.
/// Amount resolution is either a single column, or a currency→column map
/// tried in `currency_priority` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSchema {
    pub date_column: String,
    pub description_column: DescriptionColumns,
    #[serde(default)]
    pub amount_column: Option<String>,
    #[serde(default)]
    pub currency_columns: Option<HashMap<String, String>>,
    #[serde(default)]
    pub currency_priority: Option<Vec<String>>,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default = "default_true")]
    pub expenses_are_positive: bool,
}

fn default_currency() -> String {
    "CAD".to_string()
}

fn default_true() -> bool {
    true
}

impl ImportSchema {
    pub fn validate(&self) -> Result<()> {
        if self.date_column.trim().is_empty() {
            return Err(TallyError::Config(
                "import_schema.date_column must not be empty".to_string(),
            ));
        }
        let has_columns = match &self.description_column {
            DescriptionColumns::Single(col) => !col.trim().is_empty(),
            DescriptionColumns::Joined(cols) => !cols.is_empty(),
        };
        if !has_columns {
            return Err(TallyError::Config(
                "import_schema.description_column must name at least one column".to_string(),
            ));
        }
        match (&self.amount_column, &self.currency_columns, &self.currency_priority) {
            (Some(_), _, _) => Ok(()),
            (None, Some(cols), Some(priority)) if !cols.is_empty() && !priority.is_empty() => {
                Ok(())
            }
            _ => Err(TallyError::Config(
                "import_schema needs either amount_column, or currency_columns plus \
                 currency_priority"
                    .to_string(),
            )),
        }
    }

    /// Amount resolution order as (currency, column) pairs. Single-column mode
    /// is treated as a one-entry lookup under the default currency.
    pub fn amount_lookup(&self) -> Vec<(String, String)> {
        if let Some(column) = &self.amount_column {
            return vec![(self.default_currency.clone(), column.clone())];
        }
        let columns = self.currency_columns.clone().unwrap_or_default();
        let priority = self.currency_priority.clone().unwrap_or_default();
        priority
            .iter()
            .filter_map(|currency| match columns.get(currency) {
                Some(column) => Some((currency.clone(), column.clone())),
                None => {
                    warn!("currency '{currency}' in priority list has no column mapping; skipping");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoragePaths {
    #[serde(default = "default_ledger_file")]
    pub transaction_file: String,
    #[serde(default = "default_inbox_file")]
    pub new_transaction_file: String,
}

fn default_ledger_file() -> String {
    "transactions.csv".to_string()
}

fn default_inbox_file() -> String {
    "new_transactions.csv".to_string()
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self {
            transaction_file: default_ledger_file(),
            new_transaction_file: default_inbox_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default)]
    pub storage: StoragePaths,
    /// Required before importing; `tally init` leaves it null on purpose so
    /// the user fills in their bank's column layout.
    #[serde(default)]
    pub import_schema: Option<ImportSchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            storage: StoragePaths::default(),
            import_schema: None,
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(expand_home(&self.data_dir))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.transaction_file)
    }

    pub fn inbox_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.new_transaction_file)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.data_dir().join("mappings.json")
    }

    pub fn import_schema(&self) -> Result<&ImportSchema> {
        self.import_schema.as_ref().ok_or_else(|| {
            TallyError::Config(format!(
                "no import_schema configured; edit {} to describe your bank's CSV columns",
                config_path().display()
            ))
        })
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tally")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn default_data_dir_string() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("tally")
        .to_string_lossy()
        .to_string()
}

pub fn expand_home(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

pub fn config_file_exists() -> bool {
    config_path().exists()
}

pub fn load_config() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Err(TallyError::Config(format!(
            "no configuration found at {}; run `tally init` first",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| TallyError::Config(format!("could not parse {}: {e}", path.display())))
}

pub fn save_config(config: &Config) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| TallyError::Config(e.to_string()))?;
    std::fs::write(config_path(), format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_column_schema() -> ImportSchema {
        serde_json::from_str(
            r#"{
                "date_column": "Date",
                "description_column": "Description",
                "amount_column": "Amount"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_schema_defaults() {
        let schema = single_column_schema();
        assert_eq!(schema.default_currency, "CAD");
        assert!(schema.expenses_are_positive);
        schema.validate().unwrap();
    }

    #[test]
    fn test_description_column_accepts_string_or_list() {
        let schema = single_column_schema();
        assert!(matches!(
            schema.description_column,
            DescriptionColumns::Single(_)
        ));

        let joined: ImportSchema = serde_json::from_str(
            r#"{
                "date_column": "Date",
                "description_column": ["Type", "Merchant"],
                "amount_column": "Amount"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            joined.description_column,
            DescriptionColumns::Joined(ref cols) if cols.len() == 2
        ));
    }

    #[test]
    fn test_schema_without_amount_source_is_rejected() {
        let schema: ImportSchema = serde_json::from_str(
            r#"{"date_column": "Date", "description_column": "Description"}"#,
        )
        .unwrap();
        assert!(matches!(schema.validate(), Err(TallyError::Config(_))));
    }

    #[test]
    fn test_multi_currency_lookup_follows_priority_order() {
        let schema: ImportSchema = serde_json::from_str(
            r#"{
                "date_column": "Date",
                "description_column": "Description",
                "currency_columns": {"CAD": "CAD$", "USD": "USD$"},
                "currency_priority": ["USD", "CAD"]
            }"#,
        )
        .unwrap();
        schema.validate().unwrap();
        let lookup = schema.amount_lookup();
        assert_eq!(lookup[0], ("USD".to_string(), "USD$".to_string()));
        assert_eq!(lookup[1], ("CAD".to_string(), "CAD$".to_string()));
    }

    #[test]
    fn test_priority_currency_without_column_is_skipped() {
        let schema: ImportSchema = serde_json::from_str(
            r#"{
                "date_column": "Date",
                "description_column": "Description",
                "currency_columns": {"CAD": "CAD$"},
                "currency_priority": ["EUR", "CAD"]
            }"#,
        )
        .unwrap();
        let lookup = schema.amount_lookup();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup[0].0, "CAD");
    }

    #[test]
    fn test_single_column_lookup_uses_default_currency() {
        let schema = single_column_schema();
        let lookup = schema.amount_lookup();
        assert_eq!(lookup, vec![("CAD".to_string(), "Amount".to_string())]);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            data_dir: "/tmp/tally-test".to_string(),
            storage: StoragePaths::default(),
            import_schema: Some(single_column_schema()),
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/tally-test");
        assert_eq!(loaded.storage.transaction_file, "transactions.csv");
        assert!(loaded.import_schema.is_some());
    }

    #[test]
    fn test_missing_schema_is_a_config_error() {
        let config = Config::default();
        assert!(matches!(
            config.import_schema(),
            Err(TallyError::Config(_))
        ));
    }
}
