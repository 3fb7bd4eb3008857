//! Import command implementation.

use crate::cli::ImportArgs;
use crate::cli::commands::{open_storage, theme_dir};
use crate::config::resolve_theme;
use crate::error::Result;
use crate::registry::{PatternRegistry, RegisteredPattern};
use crate::sync::{ImportOptions, ImportStats, Importer, ReimportPolicy};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ImportOutput<'a> {
    theme: &'a str,
    #[serde(flatten)]
    stats: &'a ImportStats,
    registered_patterns: Vec<RegisteredEntry<'a>>,
}

#[derive(Serialize)]
struct RegisteredEntry<'a> {
    slug: &'a str,
    #[serde(flatten)]
    pattern: &'a RegisteredPattern,
}

/// Execute the import command.
///
/// Synced pattern files get a content-store row; every pattern is then
/// registered in a fresh registry, which is reported.
///
/// # Errors
///
/// Returns an error if the theme or database cannot be opened, or the
/// theme's patterns cannot be listed. Per-file failures are reported.
pub fn execute(
    args: &ImportArgs,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = resolve_theme(theme_dir(theme))?;
    let files = config.file_store();
    let mut storage = open_storage(db_path, actor)?;
    let mut registry = PatternRegistry::new();

    let options = ImportOptions {
        policy: if args.prefer_file {
            ReimportPolicy::PreferFile
        } else {
            ReimportPolicy::PreferStore
        },
        force_register: args.force_register,
        hide_unsynced: !args.show_unsynced,
    };

    let stats = Importer::new(&mut storage, &files, &mut registry, options).import()?;

    if json {
        let theme_slug = config.slug();
        let output = ImportOutput {
            theme: &theme_slug,
            stats: &stats,
            registered_patterns: registry
                .iter()
                .map(|(slug, pattern)| RegisteredEntry { slug, pattern })
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Imported from {}", config.root.display());
    println!("  Pattern files:   {}", stats.discovered);
    println!("  Rows created:    {}", stats.created);
    println!("  Rows reused:     {}", stats.reused);
    if stats.updated > 0 {
        println!("  Rows updated:    {}", stats.updated);
    }
    println!("  Registered:      {}", stats.registered);
    if stats.shadowed > 0 {
        println!("  Shadowed:        {}", stats.shadowed);
    }
    if stats.skipped_no_slug > 0 {
        println!("  {} {}", "No slug:".yellow(), stats.skipped_no_slug);
    }

    if !registry.is_empty() {
        println!();
        for (slug, pattern) in registry.iter() {
            let marker = if pattern.inserter { "+" } else { "-" };
            println!("  {marker} {slug}  {}", pattern.title.dimmed());
        }
    }

    if stats.has_failures() {
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &stats.failures {
            println!("  {}: {}", failure.item, failure.message);
        }
    }

    Ok(())
}
