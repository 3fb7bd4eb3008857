//! Reference rewrite command implementation.

use crate::cli::commands::{open_storage, theme_dir};
use crate::config::resolve_theme;
use crate::error::{Error, Result};
use crate::sync::{RewriteStats, rewrite_theme_references};
use crate::validate::is_valid_slug;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct RewriteOutput<'a> {
    id: i64,
    slug: &'a str,
    #[serde(flatten)]
    stats: &'a RewriteStats,
}

/// Replace `{"ref":<id>}` references with `{"slug":"<slug>"}` across the
/// theme's templates, template parts and patterns, then clear template
/// customizations.
///
/// # Errors
///
/// Returns an error if the slug is malformed, or the theme or database
/// cannot be opened.
pub fn execute(
    id: i64,
    slug: &str,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if !is_valid_slug(slug) {
        return Err(Error::InvalidSlug(slug.to_string()));
    }

    let config = resolve_theme(theme_dir(theme))?;
    let files = config.file_store();
    let mut storage = open_storage(db_path, actor)?;

    let stats = rewrite_theme_references(&files, &mut storage, &config.slug(), id, slug)?;

    if json {
        let output = RewriteOutput {
            id,
            slug,
            stats: &stats,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Scanned {} file(s)", stats.scanned);
        for path in &stats.changed {
            println!("  rewrote {}", path.display());
        }
        for failure in &stats.failures {
            println!("  failed {}: {}", failure.item, failure.message);
        }
        println!("Cleared {} template customization(s)", stats.customizations_cleared);
    }

    Ok(())
}
