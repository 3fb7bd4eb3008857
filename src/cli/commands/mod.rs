//! Command implementations.

pub mod completions;
pub mod export;
pub mod import;
pub mod init;
pub mod patterns;
pub mod post;
pub mod rewrite_refs;
pub mod status;
pub mod transform;
pub mod version;

use std::path::{Path, PathBuf};

use crate::config::{default_actor, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;

/// Open the content database, failing if `cbt init` has not been run.
pub(crate) fn open_storage(db_path: Option<&PathBuf>, actor: Option<&str>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    let actor = actor.map_or_else(default_actor, ToString::to_string);
    Ok(SqliteStorage::open(&db_path)?.with_actor(actor))
}

/// Theme directory override as a path reference.
pub(crate) fn theme_dir(theme: Option<&PathBuf>) -> Option<&Path> {
    theme.map(PathBuf::as_path)
}
