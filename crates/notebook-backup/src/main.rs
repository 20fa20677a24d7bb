//! # notebook-backup
//! Run one backup for a saved document. Intended to be called from a host's post-save hook.
//!
//! * `notebook-backup init` writes a default `config.toml`.
//! * `notebook-backup <document> [root]` backs up `document`, `root` defaults to the
//!   current directory.
//!

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{env, fs, path::PathBuf};

use mimalloc::MiMalloc;
use notebook_backup::{BackupEngine, BackupOutcome, Config, Document, DocumentKind};
use shared::{Failure, failure_message, init_logger};
use tracing::{error, info};

fn main() {
    let _logger = init_logger(&PathBuf::from("./logs")).or_log_and_panic("Could not start logger");

    let mut args = env::args().skip(1);

    let Some(first) = args.next() else {
        error!("Usage: notebook-backup init | notebook-backup <document> [root]");
        return;
    };

    // Initialize config if args include 'init'.
    if first == "init" {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write("config.toml", contents).or_log_and_panic("Could not create config file");
        return;
    }

    // Load config
    let config = match Config::load_toml(PathBuf::from("./config.toml")) {
        Ok(config) => config,
        Err(error) => {
            error!("{}", failure_message(&error, "Could not load config"));
            return;
        }
    };

    let document = std::path::absolute(&first).or_log_and_panic("Could not resolve document path");
    let root = match args.next() {
        Some(root) => std::path::absolute(root).or_log_and_panic("Could not resolve root path"),
        None => env::current_dir().or_log_and_panic("Could not get current directory"),
    };

    let engine = BackupEngine::new(config);
    let kind = DocumentKind::from_path(&document);

    match engine.on_save(&Document::new(&document, &root, kind)) {
        BackupOutcome::Created { snapshot, pruned }
        | BackupOutcome::Overwritten { snapshot, pruned } => {
            info!(
                "Saved {snapshot:?}, pruned {} old backups ({} failed)",
                pruned.deleted.len(),
                pruned.failed.len()
            );
        }
        BackupOutcome::Disabled => info!("Backups are disabled"),
        BackupOutcome::Skipped => info!("{document:?} is not a notebook"),
        // Already logged by the engine.
        BackupOutcome::Failed(_) => {}
    }
}
