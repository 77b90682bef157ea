pub mod persistence;

use std::{
    env,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;

use crate::errors::Result;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIR_NAME: &str = ".duebook";
const HOME_ENV: &str = "DUEBOOK_HOME";
const BUSINESSES_FILE: &str = "businesses.json";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";
const CONFIG_BACKUP_DIR: &str = "config_backups";
const LEDGER_FEED_FILE: &str = "ledger_feed.json";
const EXPORT_DIR: &str = "exports";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "duebook_core=info".parse() {
            filter = filter.add_directive(directive);
        }

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

/// Application data directory: `$DUEBOOK_HOME` when set, else `~/.duebook`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// File layout under a data directory.
pub struct PathResolver;

impl PathResolver {
    pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
        custom.unwrap_or_else(app_data_dir)
    }

    pub fn businesses_file_in(base: &Path) -> PathBuf {
        base.join(BUSINESSES_FILE)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    pub fn config_backup_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_BACKUP_DIR)
    }

    pub fn ledger_feed_file_in(base: &Path) -> PathBuf {
        base.join(LEDGER_FEED_FILE)
    }

    pub fn export_dir_in(base: &Path) -> PathBuf {
        base.join(EXPORT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_lays_files_under_base() {
        let base = PathBuf::from("/tmp/duebook-test");
        assert_eq!(
            PathResolver::businesses_file_in(&base),
            base.join("businesses.json")
        );
        assert_eq!(
            PathResolver::resolve_base(Some(base.clone())),
            base
        );
    }
}
