//! Transform command implementation.
//!
//! Runs the export transforms over a single markup file without touching
//! the database or the theme, which makes them easy to inspect.

use crate::cli::TransformArgs;
use crate::cli::commands::theme_dir;
use crate::config::resolve_theme;
use crate::error::Result;
use crate::model::Document;
use crate::sync::localize::localize_document;
use crate::sync::normalize::{NormalizeOptions, normalize_document};
use crate::sync::{MediaManifest, localize_media};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct TransformOutput {
    content: String,
    media: Vec<MediaEntry>,
}

#[derive(Serialize)]
struct MediaEntry {
    url: String,
    path: String,
}

/// Execute the transform command.
///
/// # Errors
///
/// Returns an error if the input cannot be read, or if text localization
/// needs the theme's text domain and no theme can be found.
pub fn execute(args: &TransformArgs, theme: Option<&PathBuf>, json: bool) -> Result<()> {
    let input = read_input(&args.file)?;

    let text_domain = if args.localize_text {
        match &args.text_domain {
            Some(domain) => Some(domain.clone()),
            None => Some(resolve_theme(theme_dir(theme))?.text_domain()),
        }
    } else {
        None
    };

    let mut manifest = MediaManifest::new();
    let content = transform(
        &input,
        args.normalize.then_some(NormalizeOptions {
            remove_nav_refs: !args.keep_nav_refs,
        }),
        text_domain.as_deref(),
        args.localize_images.then_some(&mut manifest),
    );

    if json {
        let output = TransformOutput {
            content,
            media: manifest
                .iter()
                .map(|a| MediaEntry {
                    url: a.url.clone(),
                    path: a.path.clone(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
        for asset in manifest.iter() {
            eprintln!("media: {} -> {}", asset.url, asset.path);
        }
    }

    Ok(())
}

/// Apply the selected transforms in export order.
fn transform(
    input: &str,
    normalize: Option<NormalizeOptions>,
    text_domain: Option<&str>,
    manifest: Option<&mut MediaManifest>,
) -> String {
    let mut doc = Document::parse(input);
    if let Some(options) = normalize {
        normalize_document(&mut doc, options);
    }
    if let Some(domain) = text_domain {
        localize_document(&mut doc, domain);
    }
    let markup = doc.to_markup();
    match manifest {
        Some(manifest) => localize_media(&markup, manifest),
        None => markup,
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transforms_is_identity() {
        let input = "<!-- wp:paragraph -->\n<p>Hi</p>\n<!-- /wp:paragraph -->";
        assert_eq!(transform(input, None, None, None), input);
    }

    #[test]
    fn test_localize_text_only() {
        let input = "<!-- wp:paragraph -->\n<p>Hi</p>\n<!-- /wp:paragraph -->";
        let out = transform(input, None, Some("my-theme"), None);
        assert!(out.contains("<?php echo __('Hi', 'my-theme');?>"));
    }

    #[test]
    fn test_normalize_strips_theme_attr() {
        let input = r#"<!-- wp:template-part {"slug":"header","theme":"tt4"} /-->"#;
        let out = transform(input, Some(NormalizeOptions::default()), None, None);
        assert_eq!(out, r#"<!-- wp:template-part {"slug":"header"} /-->"#);
    }
}
