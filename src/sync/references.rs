//! Pattern reference rewriting.
//!
//! Inside the content store, a synced pattern is referenced by numeric id
//! (`<!-- wp:block {"ref":42} /-->`). Inside theme files it has to be
//! referenced by slug (`<!-- wp:pattern {"slug":"my-theme/hero"} /-->`),
//! because ids do not survive a theme being installed elsewhere.
//!
//! Rewriting works on the parsed block tree, so `ref` 5 never matches
//! `ref` 50 and attribute order or spacing does not matter.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Attributes, Block, Document};
use crate::storage::ContentStore;
use crate::sync::codec;
use crate::sync::file::FileStore;
use crate::sync::types::{ItemFailure, RewriteStats, SyncResult};

/// Theme directories scanned for references, with their file extension.
pub const REFERENCE_DIRS: &[(&str, &str)] = &[
    ("patterns", "php"),
    ("synced-patterns", "php"),
    ("templates", "html"),
    ("template-parts", "html"),
];

/// Markup of a direct (id) reference to a synced pattern.
#[must_use]
pub fn direct_reference_markup(id: i64) -> String {
    let mut attrs = Attributes::new();
    attrs.insert("ref".into(), Value::from(id));
    Block::void("block", attrs).to_markup()
}

/// Markup of a slug reference to a theme pattern.
#[must_use]
pub fn slug_reference_markup(slug: &str) -> String {
    let mut attrs = Attributes::new();
    attrs.insert("slug".into(), Value::from(slug));
    Block::void("pattern", attrs).to_markup()
}

/// Replace every `block` reference to `id` with a `pattern` reference to
/// `slug`, keeping other attributes.
///
/// Returns `None` when nothing referenced `id`.
#[must_use]
pub fn to_slug_reference(content: &str, id: i64, slug: &str) -> Option<String> {
    let mut doc = Document::parse(content);
    let mut changed = false;

    doc.walk_blocks_mut(&mut |block| {
        if !block.is("block") || !block.attr("ref").is_some_and(|v| ref_matches(v, id)) {
            return;
        }
        let mut attrs = Attributes::new();
        attrs.insert("slug".into(), Value::from(slug));
        for (key, value) in block.attrs() {
            if key != "ref" {
                attrs.insert(key.clone(), value.clone());
            }
        }
        block.rename("pattern");
        block.set_attrs(attrs);
        changed = true;
    });

    changed.then(|| doc.to_markup())
}

/// Replace every `pattern` reference to `slug` with a `block` reference to
/// `id`, keeping other attributes.
///
/// Returns `None` when nothing referenced `slug`.
#[must_use]
pub fn to_direct_reference(content: &str, slug: &str, id: i64) -> Option<String> {
    let mut doc = Document::parse(content);
    let mut changed = false;

    doc.walk_blocks_mut(&mut |block| {
        if !block.is("pattern") || block.attr("slug").and_then(Value::as_str) != Some(slug) {
            return;
        }
        let mut attrs = Attributes::new();
        attrs.insert("ref".into(), Value::from(id));
        for (key, value) in block.attrs() {
            if key != "slug" {
                attrs.insert(key.clone(), value.clone());
            }
        }
        block.rename("block");
        block.set_attrs(attrs);
        changed = true;
    });

    changed.then(|| doc.to_markup())
}

fn ref_matches(value: &Value, id: i64) -> bool {
    match value {
        Value::Number(n) => n.as_i64() == Some(id),
        Value::String(s) => s.trim().parse::<i64>().ok() == Some(id),
        _ => false,
    }
}

/// Rewrite references to `id` in one theme file. Returns whether it changed.
///
/// Pattern files keep their header byte for byte; only the body is parsed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn rewrite_file(files: &dyn FileStore, path: &Path, id: i64, slug: &str) -> SyncResult<bool> {
    let text = files.read_text(path)?;
    let is_php = path.extension().is_some_and(|e| e == "php");

    let rewritten = if is_php {
        let (header, body) = codec::split(&text);
        to_slug_reference(body, id, slug).map(|body| format!("{header}{body}"))
    } else {
        to_slug_reference(&text, id, slug)
    };

    match rewritten {
        Some(new_text) => {
            files.write_file(path, new_text.as_bytes())?;
            debug!(path = %path.display(), id, slug, "rewrote pattern reference");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Rewrite references to `id` across the active theme's pattern and
/// template files. Files with no match are not touched.
///
/// A file that fails is recorded in the stats; the scan continues.
///
/// # Errors
///
/// Returns an error if a theme directory cannot be listed.
pub fn rewrite_files(files: &dyn FileStore, id: i64, slug: &str) -> SyncResult<RewriteStats> {
    let mut stats = RewriteStats::default();

    for (dir, ext) in REFERENCE_DIRS {
        for path in files.list_files(dir, ext, false)? {
            stats.scanned += 1;
            match rewrite_file(files, &path, id, slug) {
                Ok(true) => stats.changed.push(path),
                Ok(false) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "reference rewrite failed");
                    stats
                        .failures
                        .push(ItemFailure::new(path.display().to_string(), &e));
                }
            }
        }
    }

    Ok(stats)
}

/// Rewrite references to a synced pattern across the theme, then
/// invalidate the theme's cached template customizations so the rewritten
/// files are what the site renders.
///
/// Customizations are cleared even when no file changed.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or the content store
/// rejects the invalidation.
pub fn rewrite_theme_references(
    files: &dyn FileStore,
    store: &mut dyn ContentStore,
    theme: &str,
    id: i64,
    slug: &str,
) -> SyncResult<RewriteStats> {
    let mut stats = rewrite_files(files, id, slug)?;
    stats.customizations_cleared = store.clear_template_customizations(theme, &[])?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewPost, PostType};
    use crate::storage::SqliteStorage;
    use crate::sync::file::ThemeFiles;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_direct_reference_markup() {
        assert_eq!(direct_reference_markup(42), r#"<!-- wp:block {"ref":42} /-->"#);
        assert_eq!(
            slug_reference_markup("t/hero"),
            r#"<!-- wp:pattern {"slug":"t/hero"} /-->"#
        );
    }

    #[test]
    fn test_to_slug_reference() {
        let content = r#"<div><!-- wp:block {"ref":5} /--></div>"#;
        assert_eq!(
            to_slug_reference(content, 5, "t/hero").as_deref(),
            Some(r#"<div><!-- wp:pattern {"slug":"t/hero"} /--></div>"#)
        );
    }

    #[test]
    fn test_ref_is_exact() {
        let content = r#"<!-- wp:block {"ref":50} /-->"#;
        assert_eq!(to_slug_reference(content, 5, "t/hero"), None);
    }

    #[test]
    fn test_other_attributes_kept_after_slug() {
        let content = r#"<!-- wp:block {"ref":5,"className":"wide"} /-->"#;
        assert_eq!(
            to_slug_reference(content, 5, "t/a").as_deref(),
            Some(r#"<!-- wp:pattern {"slug":"t/a","className":"wide"} /-->"#)
        );
    }

    #[test]
    fn test_to_direct_reference_inverse() {
        let content = r#"<!-- wp:pattern {"slug":"t/a"} /-->"#;
        let direct = to_direct_reference(content, "t/a", 7).unwrap();
        assert_eq!(direct, r#"<!-- wp:block {"ref":7} /-->"#);
        assert_eq!(to_slug_reference(&direct, 7, "t/a").as_deref(), Some(content));
    }

    #[test]
    fn test_rewrite_theme_references() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("patterns")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        let header = "<?php\n/**\n * Title:   Odd  spacing\n * Slug: t/page\n */\n?>\n";
        fs::write(
            root.join("patterns/page.php"),
            format!("{header}<!-- wp:block {{\"ref\":3}} /-->"),
        )
        .unwrap();
        fs::write(
            root.join("templates/index.html"),
            r#"<!-- wp:block {"ref":3} /--><!-- wp:block {"ref":30} /-->"#,
        )
        .unwrap();
        fs::write(root.join("templates/home.html"), "<p>no refs</p>").unwrap();

        let files = ThemeFiles::new(root, None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost {
                post_type: PostType::Template,
                name: "index".into(),
                title: "Index".into(),
                content: String::new(),
                sync_status: None,
                theme: None,
            })
            .unwrap();
        let foreign = store
            .create_post(&NewPost {
                post_type: PostType::Template,
                name: "index".into(),
                title: "Index".into(),
                content: String::new(),
                sync_status: None,
                theme: Some("other".into()),
            })
            .unwrap();

        let stats = rewrite_theme_references(&files, &mut store, "t", 3, "t/hero").unwrap();
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.changed.len(), 2);
        assert_eq!(stats.customizations_cleared, 1);
        assert!(store.get_post(foreign).unwrap().is_some());

        let page = fs::read_to_string(root.join("patterns/page.php")).unwrap();
        assert_eq!(page, format!("{header}<!-- wp:pattern {{\"slug\":\"t/hero\"}} /-->"));

        let index = fs::read_to_string(root.join("templates/index.html")).unwrap();
        assert_eq!(
            index,
            r#"<!-- wp:pattern {"slug":"t/hero"} /--><!-- wp:block {"ref":30} /-->"#
        );
    }

    #[test]
    fn test_no_match_still_clears_customizations() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let stats = rewrite_theme_references(&files, &mut store, "t", 1, "t/a").unwrap();
        assert!(stats.changed.is_empty());
        assert_eq!(stats.customizations_cleared, 0);
    }
}
