//! Sync status display.
//!
//! Compares the theme's pattern files with the content store: which synced
//! patterns still need importing, which stored patterns have no file yet,
//! and how many template customizations an export would clear.

use std::collections::HashSet;

use colored::Colorize;
use serde::Serialize;

use crate::model::PostType;
use crate::storage::ContentStore;
use crate::sync::file::{FileStore, file_size};
use crate::sync::import::discover_patterns;
use crate::sync::references::REFERENCE_DIRS;
use crate::sync::types::SyncResult;
use crate::validate::sanitize_title;

/// File count and size of one theme directory.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeDirInfo {
    pub name: String,
    pub files: usize,
    pub size: u64,
}

/// Snapshot of the theme against the content store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThemeStatus {
    /// Pattern files providing a slug (active theme and parent).
    pub theme_patterns: usize,
    pub synced_patterns: usize,
    /// Pattern files with `Inserter: no`.
    pub hidden_patterns: usize,
    pub shadowed: usize,
    pub missing_slug: usize,

    pub stored_synced: usize,
    pub stored_unsynced: usize,
    pub template_customizations: usize,

    /// Synced theme patterns with no backing row yet (run import).
    pub needs_import: Vec<String>,
    /// Stored patterns with no theme file yet (run export).
    pub needs_export: Vec<String>,

    pub dirs: Vec<ThemeDirInfo>,
}

/// Compute the status of the theme against the store.
///
/// # Errors
///
/// Returns an error if the theme cannot be listed or the store queried.
pub fn get_theme_status(store: &dyn ContentStore, files: &dyn FileStore) -> SyncResult<ThemeStatus> {
    let discovery = discover_patterns(files)?;
    let mut status = ThemeStatus {
        theme_patterns: discovery.items.len(),
        shadowed: discovery.shadowed,
        missing_slug: discovery.skipped_no_slug,
        ..ThemeStatus::default()
    };

    let stored = store.list_posts(PostType::Block)?;
    let stored_names: HashSet<&str> = stored.iter().map(|p| p.name.as_str()).collect();
    let theme_names: HashSet<String> = discovery
        .items
        .iter()
        .map(|i| sanitize_title(&i.slug))
        .collect();

    for item in &discovery.items {
        if !item.inserter_visible() {
            status.hidden_patterns += 1;
        }
        if item.is_synced() {
            status.synced_patterns += 1;
            if !stored_names.contains(sanitize_title(&item.slug).as_str()) {
                status.needs_import.push(item.slug.clone());
            }
        }
    }

    for post in &stored {
        if post.is_unsynced() {
            status.stored_unsynced += 1;
            status.needs_export.push(post.title.clone());
        } else {
            status.stored_synced += 1;
            if !theme_names.contains(&post.name) {
                status.needs_export.push(post.title.clone());
            }
        }
    }

    status.template_customizations =
        store.list_posts(PostType::Template)?.len() + store.list_posts(PostType::TemplatePart)?.len();

    for (dir, ext) in REFERENCE_DIRS {
        let listed = files.list_files(dir, ext, false)?;
        if listed.is_empty() {
            continue;
        }
        status.dirs.push(ThemeDirInfo {
            name: (*dir).to_string(),
            files: listed.len(),
            size: listed.iter().map(|p| file_size(p)).sum(),
        });
    }

    Ok(status)
}

/// Print theme status to stdout in a human-readable format.
pub fn print_status(status: &ThemeStatus) {
    println!("{}", "Theme Status".bold().underline());
    println!();

    println!("{}", "Theme Patterns:".blue().bold());
    println!("  Patterns:      {}", status.theme_patterns);
    if status.synced_patterns > 0 {
        println!("  Synced:        {}", status.synced_patterns);
    }
    if status.hidden_patterns > 0 {
        println!("  Hidden:        {}", status.hidden_patterns);
    }
    if status.shadowed > 0 {
        println!("  Shadowed:      {}", status.shadowed);
    }
    if status.missing_slug > 0 {
        println!("  {} {}", "No slug:".yellow(), status.missing_slug);
    }
    println!();

    println!("{}", "Content Store:".blue().bold());
    println!("  Synced:        {}", status.stored_synced);
    println!("  Unsynced:      {}", status.stored_unsynced);
    println!("  Customizations: {}", status.template_customizations);
    println!();

    if !status.needs_import.is_empty() {
        println!("{}", "Pending Import:".yellow().bold());
        for slug in &status.needs_import {
            println!("  {slug}");
        }
        println!("{}", "Run 'cbt import' to create their rows.".dimmed());
        println!();
    }

    if status.needs_export.is_empty() {
        println!("{}", "No patterns waiting for export.".green());
    } else {
        println!("{}", "Pending Export:".yellow().bold());
        for title in &status.needs_export {
            println!("  {title}");
        }
        println!("{}", "Run 'cbt export' to write them into the theme.".dimmed());
    }
    println!();

    if status.dirs.is_empty() {
        println!("{}", "No theme files found.".dimmed());
    } else {
        println!("{}", "Theme Files:".blue().bold());
        for dir in &status.dirs {
            println!("  {} ({} files, {})", dir.name, dir.files, format_size(dir.size));
        }
    }
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
