//! Export of content-store patterns and templates into theme files.
//!
//! Every `wp_block` row becomes `patterns/<name>.php`:
//!
//! 1. **Transform**: strip per-install fields, optionally wrap text for
//!    translation and move media into the theme.
//! 2. **Write**: encode the header and write the file, skipping files whose
//!    content hash already matches.
//! 3. **Follow up**: a synced row is renamed to the exported slug so the
//!    importer finds it again; a non-synced row is deleted, since the file
//!    is now the pattern. Nothing is deleted unless its file was written.
//!
//! After all items, planned media is copied, id references to exported
//! synced patterns are rewritten to slug references across the theme, and
//! stale template customizations are cleared.
//!
//! A failing item is reported and the batch continues; re-running an
//! export converges.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::model::post::PATTERN_CATEGORY_TAXONOMY;
use crate::model::{Document, PatternItem, Post, PostType, PostUpdate, SyncStatus};
use crate::storage::ContentStore;
use crate::sync::codec;
use crate::sync::file::FileStore;
use crate::sync::hash::{content_hash, has_changed};
use crate::sync::import::PATTERNS_DIR;
use crate::sync::localize::localize_document;
use crate::sync::media::{MediaFetcher, MediaManifest, MediaWriteStats, localize_media, write_media};
use crate::sync::normalize::{NormalizeOptions, normalize_document};
use crate::sync::references::{rewrite_files, slug_reference_markup};
use crate::sync::types::{
    ExportKind, ExportReport, ItemAction, ItemFailure, ItemOutcome, ItemReport, SyncError,
    SyncResult,
};
use crate::validate::sanitize_title;

/// Export options.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Namespace of exported slugs (`<theme_slug>/<name>`).
    pub theme_slug: String,
    /// Text domain used in translation calls.
    pub text_domain: String,
    pub localize_text: bool,
    pub remove_nav_refs: bool,
    pub localize_images: bool,
    /// Also export template and template-part customizations.
    pub include_templates: bool,
    /// Build the full report without writing anything.
    pub dry_run: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            theme_slug: String::new(),
            text_domain: String::new(),
            localize_text: false,
            remove_nav_refs: true,
            localize_images: true,
            include_templates: false,
            dry_run: false,
        }
    }
}

impl ExportOptions {
    fn localizes(&self) -> bool {
        self.localize_text || self.localize_images
    }
}

/// Run the export transforms over one body of block markup.
///
/// Per-install fields are always stripped. Text and media localization
/// follow `options`; planned media lands in `manifest`.
#[must_use]
pub fn prepare_content(content: &str, options: &ExportOptions, manifest: &mut MediaManifest) -> String {
    let mut doc = Document::parse(content);
    normalize_document(
        &mut doc,
        NormalizeOptions {
            remove_nav_refs: options.remove_nav_refs,
        },
    );
    if options.localize_text {
        localize_document(&mut doc, &options.text_domain);
    }
    let markup = doc.to_markup();
    if options.localize_images {
        localize_media(&markup, manifest)
    } else {
        markup
    }
}

/// Exports content-store patterns (and optionally templates) to the theme.
pub struct Exporter<'a> {
    store: &'a mut dyn ContentStore,
    files: &'a dyn FileStore,
    fetcher: Option<&'a dyn MediaFetcher>,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub fn new(store: &'a mut dyn ContentStore, files: &'a dyn FileStore, options: ExportOptions) -> Self {
        Self {
            store,
            files,
            fetcher: None,
            options,
        }
    }

    /// Source for media copies. Without one, planned media is reported as
    /// failed.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: &'a dyn MediaFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Run the export.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store cannot be queried. Failures
    /// writing individual files are reported per item.
    pub fn export(&mut self) -> SyncResult<ExportReport> {
        let mut report = ExportReport {
            dry_run: self.options.dry_run,
            ..ExportReport::default()
        };
        let mut manifest = MediaManifest::new();
        let mut used_names = HashSet::new();
        let mut synced_exported = Vec::new();

        for post in self.store.list_posts(PostType::Block)? {
            let item = self.export_pattern(&post, &mut manifest, &mut used_names);
            if item.synced && item.outcome.is_persisted() {
                synced_exported.push((item.post_id, item.slug.clone()));
            }
            report.items.push(item);
        }

        let mut failed_templates = Vec::new();
        if self.options.include_templates {
            for post_type in [PostType::Template, PostType::TemplatePart] {
                for post in self.store.list_posts(post_type)? {
                    if !self.belongs_to_theme(&post) {
                        continue;
                    }
                    for item in self.export_template(&post, &mut manifest) {
                        if matches!(item.outcome, ItemOutcome::Failed(_)) {
                            failed_templates.push(post.id);
                        }
                        report.items.push(item);
                    }
                }
            }
        }

        report.media = manifest
            .iter()
            .map(|asset| (asset.url.clone(), PathBuf::from(&asset.path)))
            .collect();

        if self.options.dry_run {
            info!(items = report.items.len(), media = report.media.len(), "dry run finished");
            return Ok(report);
        }

        if !manifest.is_empty() {
            report.media_written = match self.fetcher {
                Some(fetcher) => write_media(&manifest, fetcher, self.files),
                None => missing_fetcher(&manifest),
            };
        }

        for (id, slug) in &synced_exported {
            match rewrite_files(self.files, *id, slug) {
                Ok(stats) => report.rewrites.merge(stats),
                Err(e) => {
                    warn!(id, slug = %slug, error = %e, "reference rewrite failed");
                    report.rewrites.failures.push(ItemFailure::new(slug.clone(), &e));
                }
            }
        }

        if !synced_exported.is_empty() || self.options.include_templates {
            failed_templates.sort_unstable();
            failed_templates.dedup();
            match self
                .store
                .clear_template_customizations(&self.options.theme_slug, &failed_templates)
            {
                Ok(cleared) => report.customizations_cleared = cleared,
                Err(e) => {
                    warn!(error = %e, "could not clear template customizations");
                    let err = SyncError::from(e);
                    report
                        .rewrites
                        .failures
                        .push(ItemFailure::new("template customizations", &err));
                }
            }
        }

        info!(
            written = report.written(),
            failed = report.failed().count(),
            media = report.media_written.written,
            rewritten = report.rewrites.changed.len(),
            "export finished"
        );
        Ok(report)
    }

    fn belongs_to_theme(&self, post: &Post) -> bool {
        post.theme
            .as_deref()
            .is_none_or(|theme| theme == self.options.theme_slug)
    }

    /// Build the file item for a `wp_block` row.
    fn pattern_item(&self, post: &Post, name: &str) -> PatternItem {
        let categories = match self.store.post_terms(post.id, PATTERN_CATEGORY_TAXONOMY) {
            Ok(terms) => terms,
            Err(e) => {
                warn!(id = post.id, error = %e, "could not read pattern categories");
                Vec::new()
            }
        };
        PatternItem {
            slug: format!("{}/{name}", self.options.theme_slug),
            title: Some(post.title.clone()).filter(|t| !t.is_empty()),
            categories,
            synced: if post.is_unsynced() {
                SyncStatus::Unsynced
            } else {
                SyncStatus::Synced
            },
            content: post.content.clone(),
            content_store_id: Some(post.id),
            ..PatternItem::default()
        }
    }

    fn export_pattern(
        &mut self,
        post: &Post,
        manifest: &mut MediaManifest,
        used_names: &mut HashSet<String>,
    ) -> ItemReport {
        let mut name = sanitize_title(&post.title);
        if name.is_empty() {
            name = format!("pattern-{}", post.id);
        }
        if !used_names.insert(name.clone()) {
            name = format!("{name}-{}", post.id);
            used_names.insert(name.clone());
        }

        let mut item = self.pattern_item(post, &name);
        item.content = prepare_content(&item.content, &self.options, manifest);

        let path = self.files.theme_path(&format!("{PATTERNS_DIR}/{name}.php"));
        let outcome = self.write(&path, &codec::encode(&item));

        let action = if outcome.is_persisted() && !self.options.dry_run {
            self.follow_up(post, &item)
        } else {
            ItemAction::None
        };

        ItemReport {
            slug: item.slug,
            post_id: post.id,
            kind: ExportKind::Pattern,
            synced: item.synced == SyncStatus::Synced,
            path,
            outcome,
            action,
        }
    }

    /// Rename a synced row to its exported slug, or delete a non-synced one.
    fn follow_up(&mut self, post: &Post, item: &PatternItem) -> ItemAction {
        let result = if item.is_synced() {
            let name = sanitize_title(&item.slug);
            if name == post.name {
                return ItemAction::None;
            }
            self.store
                .update_post(
                    post.id,
                    &PostUpdate {
                        name: Some(name),
                        ..PostUpdate::default()
                    },
                )
                .map(|()| ItemAction::Renamed)
        } else {
            self.store.delete_post(post.id).map(|_| ItemAction::Deleted)
        };

        result.unwrap_or_else(|e| {
            warn!(id = post.id, error = %e, "post follow-up failed");
            ItemAction::Failed(e.to_string())
        })
    }

    /// Export one template customization.
    ///
    /// Templates are HTML and cannot hold PHP, so when localization changes
    /// the body it moves into a hidden pattern and the template references
    /// that pattern instead.
    fn export_template(&mut self, post: &Post, manifest: &mut MediaManifest) -> Vec<ItemReport> {
        let (kind, prefix) = match post.post_type {
            PostType::TemplatePart => (ExportKind::TemplatePart, "template-part"),
            _ => (ExportKind::Template, "template"),
        };
        // Only a sanitized row name may become a path segment.
        let mut name = sanitize_title(&post.name);
        if name.is_empty() {
            name = format!("{prefix}-{}", post.id);
        }

        let plain_options = ExportOptions {
            localize_text: false,
            localize_images: false,
            ..self.options.clone()
        };
        let normalized = prepare_content(&post.content, &plain_options, manifest);
        let localized = if self.options.localizes() {
            prepare_content(&post.content, &self.options, manifest)
        } else {
            normalized.clone()
        };

        let mut reports = Vec::new();
        let template_body = if localized == normalized {
            normalized
        } else {
            let slug = format!("{}/{name}", self.options.theme_slug);
            let item = PatternItem {
                slug: slug.clone(),
                title: Some(post.name.clone()),
                inserter: Some(false),
                content: localized,
                ..PatternItem::default()
            };
            let path = self
                .files
                .theme_path(&format!("{PATTERNS_DIR}/{prefix}-{name}.php"));
            let outcome = self.write(&path, &codec::encode(&item));
            let failed = matches!(outcome, ItemOutcome::Failed(_));
            reports.push(ItemReport {
                slug: slug.clone(),
                post_id: post.id,
                kind: ExportKind::Pattern,
                synced: false,
                path,
                outcome,
                action: ItemAction::None,
            });
            if failed {
                return reports;
            }
            slug_reference_markup(&slug)
        };

        let path = self
            .files
            .theme_path(&format!("{}/{name}.html", post.post_type.theme_dir()));
        let outcome = self.write(&path, &template_body);
        reports.push(ItemReport {
            slug: name,
            post_id: post.id,
            kind,
            synced: false,
            path,
            outcome,
            action: ItemAction::None,
        });
        reports
    }

    fn write(&self, path: &Path, text: &str) -> ItemOutcome {
        let existing = if self.files.exists(path) {
            self.files.read_file(path).ok().map(content_hash)
        } else {
            None
        };
        if !has_changed(&content_hash(text), existing.as_deref()) {
            debug!(path = %path.display(), "unchanged");
            return ItemOutcome::Unchanged;
        }
        if self.options.dry_run {
            return ItemOutcome::Planned;
        }
        match self.files.write_file(path, text.as_bytes()) {
            Ok(()) => {
                debug!(path = %path.display(), "wrote theme file");
                ItemOutcome::Written
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "theme file write failed");
                ItemOutcome::Failed(e.to_string())
            }
        }
    }
}

fn missing_fetcher(manifest: &MediaManifest) -> MediaWriteStats {
    let err = SyncError::Fetch {
        url: String::new(),
        message: "no media source configured".to_string(),
    };
    MediaWriteStats {
        failures: manifest
            .iter()
            .map(|asset| ItemFailure::new(asset.url.clone(), &err))
            .collect(),
        ..MediaWriteStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewPost;
    use crate::storage::SqliteStorage;
    use crate::sync::file::ThemeFiles;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> ExportOptions {
        ExportOptions {
            theme_slug: "t".into(),
            ..ExportOptions::default()
        }
    }

    fn export(store: &mut SqliteStorage, files: &dyn FileStore, options: ExportOptions) -> ExportReport {
        Exporter::new(store, files, options).export().unwrap()
    }

    /// Fails every write whose path contains `broken`.
    struct FailingFiles(ThemeFiles);

    impl FileStore for FailingFiles {
        fn list_files(&self, dir: &str, ext: &str, include_parent: bool) -> SyncResult<Vec<PathBuf>> {
            self.0.list_files(dir, ext, include_parent)
        }
        fn read_file(&self, path: &Path) -> SyncResult<Vec<u8>> {
            self.0.read_file(path)
        }
        fn write_file(&self, path: &Path, content: &[u8]) -> SyncResult<()> {
            if path.to_string_lossy().contains("broken") {
                return Err(SyncError::Io(std::io::Error::other("disk full")));
            }
            self.0.write_file(path, content)
        }
        fn delete_file(&self, path: &Path) -> SyncResult<()> {
            self.0.delete_file(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }
        fn theme_path(&self, rel: &str) -> PathBuf {
            self.0.theme_path(rel)
        }
    }

    struct FakeFetcher;

    impl MediaFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> SyncResult<Vec<u8>> {
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_synced_pattern_exported_and_renamed() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("hero", "My Hero", "<p>hero</p>"))
            .unwrap();
        store
            .set_post_terms(id, PATTERN_CATEGORY_TAXONOMY, &["featured".into()])
            .unwrap();

        let report = export(&mut store, &files, options());
        assert_eq!(report.written(), 1);
        assert_eq!(report.items[0].action, ItemAction::Renamed);
        assert!(!report.has_failures());

        let text = fs::read_to_string(dir.path().join("patterns/my-hero.php")).unwrap();
        assert!(text.contains(" * Title: My Hero\n"));
        assert!(text.contains(" * Slug: t/my-hero\n"));
        assert!(text.contains(" * Categories: featured\n"));
        assert!(text.contains(" * Synced: yes\n"));
        assert!(text.ends_with("?>\n<p>hero</p>"));

        assert_eq!(store.get_post(id).unwrap().unwrap().name, "t-my-hero");
    }

    #[test]
    fn test_unsynced_pattern_row_deleted_after_write() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("plain", "Plain", "<p>x</p>").unsynced())
            .unwrap();

        let report = export(&mut store, &files, options());
        assert_eq!(report.items[0].action, ItemAction::Deleted);
        assert!(store.get_post(id).unwrap().is_none());

        let text = fs::read_to_string(dir.path().join("patterns/plain.php")).unwrap();
        assert!(!text.contains("Synced"));
    }

    #[test]
    fn test_second_export_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost::pattern("hero", "Hero", "<p>hero</p>"))
            .unwrap();

        export(&mut store, &files, options());
        let report = export(&mut store, &files, options());
        assert_eq!(report.items[0].outcome, ItemOutcome::Unchanged);
        assert_eq!(report.items[0].action, ItemAction::None);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(
                &NewPost::pattern(
                    "plain",
                    "Plain",
                    "<!-- wp:image --><figure><img src=\"https://example.com/a.png\"/></figure><!-- /wp:image -->",
                )
                .unsynced(),
            )
            .unwrap();

        let report = export(
            &mut store,
            &files,
            ExportOptions {
                dry_run: true,
                ..options()
            },
        );
        assert!(report.dry_run);
        assert_eq!(report.items[0].outcome, ItemOutcome::Planned);
        assert_eq!(report.media.len(), 1);
        assert!(!dir.path().join("patterns").exists());
        assert!(store.get_post(id).unwrap().is_some());
    }

    #[test]
    fn test_dry_run_over_identical_file_keeps_row() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let plain = NewPost::pattern("plain", "Plain", "<p>x</p>").unsynced();
        store.create_post(&plain).unwrap();
        export(&mut store, &files, options());

        let id = store.create_post(&plain).unwrap();
        let report = export(
            &mut store,
            &files,
            ExportOptions {
                dry_run: true,
                ..options()
            },
        );
        assert_eq!(report.items[0].outcome, ItemOutcome::Unchanged);
        assert_eq!(report.items[0].action, ItemAction::None);
        assert!(store.get_post(id).unwrap().is_some());
    }

    #[test]
    fn test_content_is_normalized_and_localized() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost::pattern(
                "nav",
                "Nav",
                "<!-- wp:navigation {\"ref\":4} /--><!-- wp:paragraph --><p>Hello</p><!-- /wp:paragraph -->",
            ))
            .unwrap();

        export(
            &mut store,
            &files,
            ExportOptions {
                localize_text: true,
                text_domain: "t".into(),
                ..options()
            },
        );
        let text = fs::read_to_string(dir.path().join("patterns/nav.php")).unwrap();
        assert!(text.contains("<!-- wp:navigation /-->"));
        assert!(text.contains("<p><?php echo __('Hello', 't');?></p>"));
    }

    #[test]
    fn test_references_rewritten_and_customizations_cleared() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("hero", "Hero", "<p>hero</p>"))
            .unwrap();
        fs::write(
            dir.path().join("templates/index.html"),
            format!("<!-- wp:block {{\"ref\":{id}}} /-->"),
        )
        .unwrap();
        store
            .create_post(&NewPost {
                post_type: PostType::Template,
                name: "index".into(),
                title: "Index".into(),
                content: String::new(),
                sync_status: None,
                theme: Some("t".into()),
            })
            .unwrap();

        let report = export(&mut store, &files, options());
        assert_eq!(report.rewrites.changed.len(), 1);
        assert_eq!(report.customizations_cleared, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("templates/index.html")).unwrap(),
            r#"<!-- wp:pattern {"slug":"t/hero"} /-->"#
        );
    }

    #[test]
    fn test_other_theme_customizations_survive() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost::pattern("hero", "Hero", "<p>hero</p>"))
            .unwrap();
        let other = store
            .create_post(&NewPost {
                post_type: PostType::Template,
                name: "index".into(),
                title: "Index".into(),
                content: String::new(),
                sync_status: None,
                theme: Some("other-theme".into()),
            })
            .unwrap();

        let report = export(&mut store, &files, options());
        assert_eq!(report.customizations_cleared, 0);
        assert!(store.get_post(other).unwrap().is_some());
    }

    #[test]
    fn test_media_copied_into_theme() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost::pattern(
                "gallery",
                "Gallery",
                "<!-- wp:image {\"id\":9} --><figure><img src=\"https://example.com/a.png\" class=\"wp-image-9\"/></figure><!-- /wp:image -->",
            ))
            .unwrap();

        let fetcher = FakeFetcher;
        let report = Exporter::new(&mut store, &files, options())
            .with_fetcher(&fetcher)
            .export()
            .unwrap();
        assert_eq!(report.media_written.written, 1);
        assert!(dir.path().join("assets/images/a.png").is_file());

        let text = fs::read_to_string(dir.path().join("patterns/gallery.php")).unwrap();
        assert!(text.contains("<!-- wp:image -->"));
        assert!(text.contains("get_stylesheet_directory_uri() ); ?>/assets/images/a.png"));
    }

    #[test]
    fn test_template_with_localized_text_moves_into_pattern() {
        let dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost {
                post_type: PostType::TemplatePart,
                name: "footer".into(),
                title: "Footer".into(),
                content: "<!-- wp:paragraph --><p>Bye</p><!-- /wp:paragraph -->".into(),
                sync_status: None,
                theme: Some("t".into()),
            })
            .unwrap();

        let report = export(
            &mut store,
            &files,
            ExportOptions {
                include_templates: true,
                localize_text: true,
                ..options()
            },
        );
        assert_eq!(report.items.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("template-parts/footer.html")).unwrap(),
            r#"<!-- wp:pattern {"slug":"t/footer"} /-->"#
        );
        let pattern = fs::read_to_string(dir.path().join("patterns/template-part-footer.php")).unwrap();
        assert!(pattern.contains(" * Inserter: no\n"));
        assert!(pattern.contains("__('Bye', '')"));
        assert_eq!(report.customizations_cleared, 1);
    }

    #[test]
    fn test_template_name_stays_inside_theme() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("themes/t");
        fs::create_dir_all(&root).unwrap();
        let files = ThemeFiles::new(&root, None);
        let mut store = SqliteStorage::open_memory().unwrap();
        store
            .create_post(&NewPost {
                post_type: PostType::Template,
                name: "../../escaped".into(),
                title: "Escaped".into(),
                content: "<p>x</p>".into(),
                sync_status: None,
                theme: Some("t".into()),
            })
            .unwrap();

        let report = export(
            &mut store,
            &files,
            ExportOptions {
                include_templates: true,
                ..options()
            },
        );
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].slug, "escaped");
        assert!(root.join("templates/escaped.html").is_file());
        assert!(!dir.path().join("escaped.html").exists());
        assert!(!dir.path().join("themes/escaped.html").exists());
    }

    #[test]
    fn test_failed_write_keeps_row_and_continues() {
        let dir = TempDir::new().unwrap();
        let files = FailingFiles(ThemeFiles::new(dir.path(), None));
        let mut store = SqliteStorage::open_memory().unwrap();
        let broken = store
            .create_post(&NewPost::pattern("broken", "Broken", "<p>a</p>").unsynced())
            .unwrap();
        let fine = store
            .create_post(&NewPost::pattern("fine", "Fine", "<p>b</p>").unsynced())
            .unwrap();

        let report = export(&mut store, &files, options());
        assert!(report.has_failures());
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.items[0].action, ItemAction::None);
        assert!(store.get_post(broken).unwrap().is_some());

        assert_eq!(report.items[1].outcome, ItemOutcome::Written);
        assert!(store.get_post(fine).unwrap().is_none());
        assert!(dir.path().join("patterns/fine.php").is_file());
    }
}
