//! Status command implementation.

use crate::cli::commands::{open_storage, theme_dir};
use crate::config::resolve_theme;
use crate::error::Result;
use crate::sync::{ThemeStatus, get_theme_status, print_status};
use serde::Serialize;
use std::path::PathBuf;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    theme: ThemeInfo,
    #[serde(flatten)]
    status: ThemeStatus,
}

#[derive(Serialize)]
struct ThemeInfo {
    root: PathBuf,
    slug: String,
    name: Option<String>,
    parent: Option<PathBuf>,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the theme cannot be found, the database is not
/// initialized, or the status cannot be computed.
pub fn execute(db_path: Option<&PathBuf>, theme: Option<&PathBuf>, json: bool) -> Result<()> {
    let config = resolve_theme(theme_dir(theme))?;
    let storage = open_storage(db_path, None)?;
    let status = get_theme_status(&storage, &config.file_store())?;

    if json {
        let output = StatusOutput {
            theme: ThemeInfo {
                slug: config.slug(),
                root: config.root,
                name: config.name,
                parent: config.parent,
            },
            status,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "Theme: {} ({})",
            config.name.as_deref().unwrap_or("unnamed"),
            config.root.display()
        );
        if let Some(parent) = &config.parent {
            println!("Parent: {}", parent.display());
        }
        println!();
        print_status(&status);
    }

    Ok(())
}
