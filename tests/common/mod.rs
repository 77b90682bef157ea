#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use duebook_core::{config::ConfigManager, core::FixedClock, storage::JsonStorage};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated storage and config managers backed by a unique directory.
pub fn setup_test_env() -> (JsonStorage, ConfigManager, PathBuf) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.join("data")), Some(3)).expect("create json storage");
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (storage, config_manager, base)
}

pub fn clock_at(year: i32, month: u32, day: u32) -> FixedClock {
    FixedClock(
        Utc.with_ymd_and_hms(year, month, day, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
    )
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}
