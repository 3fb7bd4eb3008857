//! Initialize the cbt content database.
//!
//! cbt keeps one **global database** at `~/.cbt/data/content.db` (or the
//! `--db` / `CBT_DB` path). Themes are never initialized: any directory
//! with a `style.css` can be imported from and exported to.

use crate::config::{global_cbt_dir, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    reinitialized: bool,
}

/// Execute the init command.
///
/// Creates the database file and applies the schema. With `force`, an
/// existing database is removed first.
///
/// # Errors
///
/// Returns an error if the database already exists (without `force`) or
/// cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine the cbt data directory".to_string()))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if existed {
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let mut side = db_path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(PathBuf::from(side));
        }
    }

    SqliteStorage::open(&db_path)?;

    // Keep the global directory out of version control if someone adds it.
    if let Some(base_dir) = global_cbt_dir().filter(|dir| db_path.starts_with(dir)) {
        let gitignore_path = base_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, "# Everything in the global cbt directory is local-only\n*\n")?;
        }
    }

    if json {
        let output = InitOutput {
            database: db_path,
            reinitialized: existed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized cbt database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: run 'cbt import' inside a theme directory.");
    }

    Ok(())
}
