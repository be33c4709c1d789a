//! Ledger directory layout and tunables.
//!
//! The ledger directory is resolved from the command line first, then from
//! [`DIR_ENV`] and finally [`LEGACY_DIR_ENV`]. An optional [`CONFIG_FILE`]
//! inside that directory overrides file names and formatting defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

pub const DIR_ENV: &str = "BEAN_COMPOSE_DIR";
pub const LEGACY_DIR_ENV: &str = "BEANCOUNT_TRANSACTION_DIR";
pub const CACHE_ENV: &str = "BEAN_COMPOSE_CACHE";
pub const CONFIG_FILE: &str = "bean-compose.json";

const CACHE_DIR_NAME: &str = "bean-compose";
const MONTHLY_FILE_FORMAT: &str = "%Y-%m";
const BACKUP_SUFFIX: &str = "backup";

/// How transactions are spread over files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Every transaction lives in one file.
    #[default]
    Single,
    /// One `YYYY-MM.beancount` file per month.
    Monthly,
}

/// Day/month order for ambiguous numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    #[default]
    Dmy,
    Mdy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub main_file: String,
    pub transactions_file: String,
    pub layout: Layout,
    pub monthly_dir: String,
    pub templates_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_width: Option<usize>,
    pub indent_width: usize,
    pub match_limit: usize,
    pub match_threshold: f64,
    pub date_order: DateOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,
    pub history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_file: "main.beancount".into(),
            transactions_file: "transactions.beancount".into(),
            layout: Layout::Single,
            monthly_dir: "transactions".into(),
            templates_file: "templates.yaml".into(),
            currency_column: Some(90),
            prefix_width: Some(4),
            num_width: None,
            indent_width: 4,
            match_limit: 5,
            match_threshold: 0.6,
            date_order: DateOrder::Dmy,
            default_currency: None,
            history: true,
        }
    }
}

impl Config {
    /// Loads `bean-compose.json` from `dir`, falling back to defaults when absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.match_limit == 0 {
            return Err(LedgerError::Config("match_limit must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(LedgerError::Config(
                "match_threshold must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Picks the ledger directory from the flag, then the environment fallbacks.
pub fn resolve_ledger_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    let dir = flag
        .or_else(|| env::var_os(DIR_ENV).map(PathBuf::from))
        .or_else(|| env::var_os(LEGACY_DIR_ENV).map(PathBuf::from))
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| {
            LedgerError::Config(format!(
                "--directory or environment variable {DIR_ENV} (or {LEGACY_DIR_ENV}) must be set"
            ))
        })?;
    if !dir.is_dir() {
        return Err(LedgerError::Config(format!(
            "ledger directory `{}` does not exist",
            dir.display()
        )));
    }
    Ok(dir)
}

/// Directory holding per-field prompt history files.
pub fn history_dir() -> PathBuf {
    if let Some(custom) = env::var_os(CACHE_ENV) {
        return PathBuf::from(custom);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

/// Resolves the file paths of a ledger directory under a [`Config`].
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    root: PathBuf,
    config: Config,
}

impl LedgerPaths {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn main_file(&self) -> PathBuf {
        self.root.join(&self.config.main_file)
    }

    pub fn templates_file(&self) -> PathBuf {
        self.root.join(&self.config.templates_file)
    }

    pub fn monthly_dir(&self) -> PathBuf {
        self.root.join(&self.config.monthly_dir)
    }

    /// File that should hold an entry dated `date`, whether or not it exists yet.
    pub fn target_for(&self, date: NaiveDate) -> PathBuf {
        match self.config.layout {
            Layout::Single => self.root.join(&self.config.transactions_file),
            Layout::Monthly => self
                .monthly_dir()
                .join(format!("{}.beancount", date.format(MONTHLY_FILE_FORMAT))),
        }
    }

    /// Every existing transaction file, monthly files in name (and so date) order.
    pub fn transaction_files(&self) -> Result<Vec<PathBuf>> {
        match self.config.layout {
            Layout::Single => {
                let path = self.root.join(&self.config.transactions_file);
                Ok(if path.exists() { vec![path] } else { Vec::new() })
            }
            Layout::Monthly => {
                let dir = self.monthly_dir();
                if !dir.exists() {
                    return Ok(Vec::new());
                }
                let mut files = Vec::new();
                for entry in fs::read_dir(&dir)? {
                    let path = entry?.path();
                    if month_of_file(&path).is_some() {
                        files.push(path);
                    }
                }
                files.sort();
                Ok(files)
            }
        }
    }

    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }
}

/// `(year, month)` encoded in a monthly file name such as `2024-03.beancount`.
pub fn month_of_file(path: &Path) -> Option<(i32, u32)> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("beancount") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let first = NaiveDate::parse_from_str(&format!("{stem}-01"), "%Y-%m-%d").ok()?;
    Some((first.year(), first.month()))
}
