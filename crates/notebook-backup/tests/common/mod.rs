//! # common
//!

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use notebook_backup::{BackupEngine, Clock, Config};
use tempfile::TempDir;

/// A clock that only moves when told to.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(time: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(time)))
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.0.lock().unwrap() = time;
    }

    pub fn advance(&self, seconds: i64) {
        let mut time = self.0.lock().unwrap();
        *time += TimeDelta::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// 2026-02-06T14:30:15Z
pub fn save_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 6, 14, 30, 15).unwrap()
}

/// A document root with a notebook at `<root>/notes/a.ipynb`.
pub struct Workspace {
    pub directory: TempDir,
    pub root: PathBuf,
    pub notebook: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        shared::test::init_test_logger();

        let directory = tempfile::tempdir().unwrap();
        let root = directory.path().join("root");
        let notebook = root.join("notes").join("a.ipynb");
        fs::create_dir_all(notebook.parent().unwrap()).unwrap();
        fs::write(&notebook, r#"{"cells": []}"#).unwrap();

        Self {
            directory,
            root,
            notebook,
        }
    }

    /// The directory a relative `.backup` resolves to for the notebook.
    pub fn relative_backup_directory(&self) -> PathBuf {
        self.root.join("notes").join(".backup")
    }
}

pub fn engine(config: Config, clock: &Arc<FixedClock>) -> BackupEngine<Arc<FixedClock>> {
    BackupEngine::with_clock(config, Arc::clone(clock))
}

/// The file names in a directory, sorted.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(directory) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
