use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{DuebookError, Result},
    ledger::Money,
    utils::{
        ensure_dir,
        persistence::{backup_file_name, list_backup_names, read_json, write_json_atomic},
        PathResolver,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency_symbol: String,
    /// Overrides the data directory resolved from `DUEBOOK_HOME` or the home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub backup_retention: usize,
    /// Publish balance changes to the ledger feed.
    pub ledger_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_business: Option<Uuid>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-IN".into(),
            currency_symbol: "₹".into(),
            data_dir: None,
            backup_retention: 5,
            ledger_sync: true,
            last_opened_business: None,
        }
    }
}

impl Config {
    /// Formats with the locale's digit grouping: lakh style (`1,50,000`) for Indian
    /// locales, thousands (`150,000`) otherwise.
    pub fn format_money(&self, amount: Money) -> String {
        let digits = group_digits(&amount.unsigned_abs().to_string(), self.uses_lakh_grouping());
        if amount < 0 {
            format!("-{}{}", self.currency_symbol, digits)
        } else {
            format!("{}{}", self.currency_symbol, digits)
        }
    }

    fn uses_lakh_grouping(&self) -> bool {
        self.locale
            .rsplit(['-', '_'])
            .next()
            .is_some_and(|region| region.eq_ignore_ascii_case("IN"))
    }

    /// Applies a `key value` setting from the shell.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "locale" => self.locale = value.to_string(),
            "currency" | "currency_symbol" => self.currency_symbol = value.to_string(),
            "data_dir" => {
                self.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "backup_retention" => {
                let retention: usize = value.parse().map_err(|_| {
                    DuebookError::ConfigError(format!("`{value}` is not a valid retention count"))
                })?;
                if retention == 0 {
                    return Err(DuebookError::ConfigError(
                        "backup_retention must be at least 1".into(),
                    ));
                }
                self.backup_retention = retention;
            }
            "ledger_sync" => {
                self.ledger_sync = parse_bool(value).ok_or_else(|| {
                    DuebookError::ConfigError(format!("`{value}` is not on/off"))
                })?;
            }
            other => {
                return Err(DuebookError::ConfigError(format!(
                    "unknown setting `{other}`"
                )))
            }
        }
        Ok(())
    }
}

fn group_digits(digits: &str, lakh: bool) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        let boundary = match (lakh, count) {
            (_, 0) => false,
            (true, count) => count == 3 || (count > 3 && (count - 3) % 2 == 0),
            (false, count) => count % 3 == 0,
        };
        if boundary {
            grouped.insert(0, ',');
        }
        grouped.insert(0, ch);
    }
    grouped
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::resolve_base(None))
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            read_json(&self.path).map_err(|err| DuebookError::ConfigError(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        write_json_atomic(&self.path, config)
    }

    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String> {
        ensure_dir(&self.backups_dir)?;
        let name = backup_file_name("config", chrono::Utc::now(), note);
        write_json_atomic(&self.backups_dir.join(&name), config)?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<Config> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(DuebookError::StorageError(format!(
                "configuration backup `{}` not found",
                backup_name
            )));
        }
        let config: Config = read_json(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    pub fn list_backups(&self) -> Result<Vec<String>> {
        list_backup_names(&self.backups_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = manager.load().unwrap();
        assert_eq!(config, Config::default());

        config.set("ledger_sync", "off").unwrap();
        config.set("currency", "Rs.").unwrap();
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert!(!loaded.ledger_sync);
        assert_eq!(loaded.format_money(-250), "-Rs.250");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("backup_retention", "0").is_err());
        assert!(config.set("backup_retention", "many").is_err());
        assert!(config.set("theme", "dark").is_err());
        config.set("backup_retention", "8").unwrap();
        assert_eq!(config.backup_retention, 8);
    }

    #[test]
    fn backups_restore_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let original = Config::default();
        let name = manager.backup(&original, Some("initial")).unwrap();
        assert_eq!(manager.list_backups().unwrap(), vec![name.clone()]);

        let mut changed = original.clone();
        changed.locale = "hi-IN".into();
        manager.save(&changed).unwrap();
        let restored = manager.restore(&name).unwrap();
        assert_eq!(restored.locale, "en-IN");
        assert_eq!(manager.load().unwrap().locale, "en-IN");
    }

    #[test]
    fn money_follows_locale_grouping() {
        let mut config = Config::default();
        assert_eq!(config.format_money(999), "₹999");
        assert_eq!(config.format_money(1500), "₹1,500");
        assert_eq!(config.format_money(150_000), "₹1,50,000");
        assert_eq!(config.format_money(-12_345_678), "-₹1,23,45,678");

        config.set("locale", "en-US").unwrap();
        assert_eq!(config.format_money(150_000), "₹150,000");
        assert_eq!(config.format_money(1_234_567), "₹1,234,567");
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config = serde_json::from_str(r#"{"currency_symbol":"$"}"#).unwrap();
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.backup_retention, 5);
        assert!(config.ledger_sync);
    }
}
