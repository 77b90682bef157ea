//! JSON export and import of whole businesses.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::{DuebookError, Result},
    ledger::Business,
    utils::{ensure_dir, persistence::write_json_atomic},
};

pub const FULL_EXPORT_FILE: &str = "bahi_khata_backup.json";
const EXPORT_PREFIX: &str = "bahi_khata_";

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Many(Vec<Business>),
    One(Box<Business>),
}

pub fn export_all(businesses: &[Business], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    write_json_atomic(path, businesses)?;
    tracing::info!(path = %path.display(), count = businesses.len(), "exported businesses");
    Ok(())
}

/// Writes one business into `dir` and returns the file path.
pub fn export_business(business: &Business, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(export_file_name(business));
    write_json_atomic(&path, business)?;
    tracing::info!(path = %path.display(), business = %business.id, "exported business");
    Ok(path)
}

/// `bahi_khata_<name>.json` with whitespace runs replaced by underscores.
pub fn export_file_name(business: &Business) -> String {
    let name = business.name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{EXPORT_PREFIX}{name}.json")
}

/// Reads an export holding either one business or an array of them. Imported
/// businesses get fresh ids and are flagged as new so they never collide with
/// the originals.
pub fn import_from_path(path: &Path) -> Result<Vec<Business>> {
    let data = std::fs::read_to_string(path)?;
    let payload: ImportPayload = serde_json::from_str(&data).map_err(|err| {
        DuebookError::InvalidInput(format!(
            "{} is not a business export: {}",
            path.display(),
            err
        ))
    })?;
    let mut businesses = match payload {
        ImportPayload::Many(list) => list,
        ImportPayload::One(business) => vec![*business],
    };
    for business in &mut businesses {
        business.id = Uuid::new_v4();
        business.is_new = true;
    }
    tracing::info!(path = %path.display(), count = businesses.len(), "imported businesses");
    Ok(businesses)
}
