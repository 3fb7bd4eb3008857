//! Export command implementation.

use crate::cli::ExportArgs;
use crate::cli::commands::{open_storage, theme_dir};
use crate::config::resolve_theme;
use crate::error::{Error, Result};
use crate::sync::{
    ExportOptions, ExportReport, Exporter, HttpFetcher, ItemAction, ItemOutcome, MediaFetcher,
    UploadsFetcher,
};
use colored::Colorize;
use std::path::PathBuf;

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the theme or database cannot be opened, or if any
/// item, media copy or reference rewrite failed. Items that succeeded stay
/// written either way.
pub fn execute(
    args: &ExportArgs,
    db_path: Option<&PathBuf>,
    theme: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = resolve_theme(theme_dir(theme))?;
    let files = config.file_store();
    let mut storage = open_storage(db_path, actor)?;

    let options = ExportOptions {
        theme_slug: config.slug(),
        text_domain: config.text_domain(),
        localize_text: args.localize_text,
        remove_nav_refs: !args.keep_nav_refs,
        localize_images: !args.no_localize_images,
        include_templates: args.templates,
        dry_run: args.dry_run,
    };

    let fetcher = media_fetcher(args)?;
    let mut exporter = Exporter::new(&mut storage, &files, options);
    if let Some(fetcher) = fetcher.as_deref() {
        exporter = exporter.with_fetcher(fetcher);
    }
    let report = exporter.export()?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_failures() {
        return Err(Error::Other(format!(
            "export finished with {} failed item(s)",
            failure_count(&report)
        )));
    }
    Ok(())
}

/// Pick the media source: a local uploads directory when given, otherwise
/// HTTP. Nothing is needed when media stays remote or nothing is written.
fn media_fetcher(args: &ExportArgs) -> Result<Option<Box<dyn MediaFetcher>>> {
    if args.no_localize_images || args.dry_run {
        return Ok(None);
    }
    if let (Some(dir), Some(site_url)) = (&args.uploads_dir, &args.site_url) {
        return Ok(Some(Box::new(UploadsFetcher::new(site_url.clone(), dir.clone()))));
    }
    Ok(Some(Box::new(HttpFetcher::new()?)))
}

fn failure_count(report: &ExportReport) -> usize {
    report.failed().count()
        + report
            .items
            .iter()
            .filter(|i| matches!(i.action, ItemAction::Failed(_)))
            .count()
        + report.media_written.failures.len()
        + report.rewrites.failures.len()
}

fn print_report(report: &ExportReport) {
    if report.dry_run {
        println!("{}", "Dry run: nothing was written".yellow().bold());
        println!();
    }

    for item in &report.items {
        let status = match &item.outcome {
            ItemOutcome::Written => "written".green(),
            ItemOutcome::Unchanged => "unchanged".dimmed(),
            ItemOutcome::Planned => "planned".cyan(),
            ItemOutcome::Failed(_) => "failed".red(),
        };
        let action = match item.action {
            ItemAction::Renamed => " (row renamed)",
            ItemAction::Deleted => " (row deleted)",
            ItemAction::None | ItemAction::Failed(_) => "",
        };
        println!("  [{status}] {} -> {}{action}", item.slug, item.path.display());
        if let ItemOutcome::Failed(message) = &item.outcome {
            println!("    {}", message.red());
        }
        if let ItemAction::Failed(message) = &item.action {
            println!("    {}", message.red());
        }
    }

    if !report.media.is_empty() {
        println!();
        println!("{}", "Media:".blue().bold());
        for (url, path) in &report.media {
            println!("  {url} -> {}", path.display());
        }
        if !report.dry_run {
            println!(
                "  {} copied, {} unchanged",
                report.media_written.written, report.media_written.unchanged
            );
        }
        for failure in &report.media_written.failures {
            println!("  {} {}: {}", "failed".red(), failure.item, failure.message);
        }
    }

    if !report.rewrites.changed.is_empty() || !report.rewrites.failures.is_empty() {
        println!();
        println!("{}", "References:".blue().bold());
        for path in &report.rewrites.changed {
            println!("  rewrote {}", path.display());
        }
        for failure in &report.rewrites.failures {
            println!("  {} {}: {}", "failed".red(), failure.item, failure.message);
        }
    }

    println!();
    println!(
        "Exported {} item(s), {} failed, {} customization(s) cleared",
        report.written(),
        report.failed().count(),
        report.customizations_cleared
    );
}
