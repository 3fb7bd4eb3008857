//! Theme pattern import.
//!
//! Import takes every `patterns/*.php` file of the active theme (then its
//! parent) through three steps:
//!
//! 1. **Discover**: decode headers, first slug wins.
//! 2. **Resolve**: synced items get a backing `wp_block` row, created once
//!    and reused afterwards.
//! 3. **Register**: synced items register a hidden pointer to their row;
//!    non-synced items register the file content.
//!
//! A failing item is recorded in [`ImportStats::failures`] and the rest of
//! the batch carries on.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::model::post::PATTERN_CATEGORY_TAXONOMY;
use crate::model::{NewPost, PatternItem, PostType, PostUpdate};
use crate::registry::{RegisteredPattern, Registry};
use crate::storage::ContentStore;
use crate::sync::codec;
use crate::sync::file::FileStore;
use crate::sync::references::to_direct_reference;
use crate::sync::types::{ImportStats, ItemFailure, ReimportPolicy, SyncResult};
use crate::validate::sanitize_title;

/// Theme directory holding pattern files.
pub const PATTERNS_DIR: &str = "patterns";

/// Patterns found in the theme, with what was left out and why.
#[derive(Debug, Default)]
pub struct Discovery {
    pub items: Vec<PatternItem>,
    /// Files whose slug an earlier file already claimed.
    pub shadowed: usize,
    pub skipped_no_slug: usize,
    pub failures: Vec<ItemFailure>,
}

/// Decode the theme's pattern files, active theme first.
///
/// When two files share a slug the first one wins, so an active theme
/// pattern shadows the parent theme's.
///
/// # Errors
///
/// Returns an error if a patterns directory cannot be listed. Unreadable
/// files are recorded in [`Discovery::failures`].
pub fn discover_patterns(files: &dyn FileStore) -> SyncResult<Discovery> {
    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();

    for path in files.list_files(PATTERNS_DIR, "php", true)? {
        let text = match files.read_text(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read pattern file");
                discovery
                    .failures
                    .push(ItemFailure::new(path.display().to_string(), &e));
                continue;
            }
        };

        let item = codec::decode(&text, &path);
        if item.slug.is_empty() {
            warn!(path = %path.display(), "pattern file has no Slug header, skipping");
            discovery.skipped_no_slug += 1;
            continue;
        }
        if !seen.insert(item.slug.clone()) {
            debug!(slug = %item.slug, path = %path.display(), "slug already provided, file shadowed");
            discovery.shadowed += 1;
            continue;
        }
        discovery.items.push(item);
    }

    Ok(discovery)
}

/// Import options.
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub policy: ReimportPolicy,
    /// Replace registrations that already exist.
    pub force_register: bool,
    /// Keep non-synced file patterns out of the inserter.
    pub hide_unsynced: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            policy: ReimportPolicy::default(),
            force_register: false,
            hide_unsynced: true,
        }
    }
}

/// Imports theme pattern files into the content store and registry.
pub struct Importer<'a> {
    store: &'a mut dyn ContentStore,
    files: &'a dyn FileStore,
    registry: &'a mut dyn Registry,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    #[must_use]
    pub fn new(
        store: &'a mut dyn ContentStore,
        files: &'a dyn FileStore,
        registry: &'a mut dyn Registry,
        options: ImportOptions,
    ) -> Self {
        Self {
            store,
            files,
            registry,
            options,
        }
    }

    /// Run the import.
    ///
    /// Slug references between synced patterns are turned into id
    /// references inside the rows this run wrote, once every synced item
    /// has an id.
    ///
    /// # Errors
    ///
    /// Returns an error only if the theme cannot be listed; per-item
    /// problems end up in the returned stats.
    pub fn import(&mut self) -> SyncResult<ImportStats> {
        let discovery = discover_patterns(self.files)?;
        let mut stats = ImportStats {
            discovered: discovery.items.len() + discovery.shadowed + discovery.skipped_no_slug,
            shadowed: discovery.shadowed,
            skipped_no_slug: discovery.skipped_no_slug,
            failures: discovery.failures,
            ..ImportStats::default()
        };

        let mut items = discovery.items;
        let mut written_rows = Vec::new();

        for item in items.iter_mut().filter(|i| i.is_synced()) {
            match self.resolve(item, &mut stats) {
                Ok(Some(id)) => written_rows.push(id),
                Ok(None) => {}
                Err(e) => {
                    warn!(slug = %item.slug, error = %e, "could not resolve synced pattern");
                    stats.failures.push(ItemFailure::new(item.slug.clone(), &e));
                }
            }
        }

        let synced_ids: Vec<(&str, i64)> = items
            .iter()
            .filter_map(|i| i.content_store_id.map(|id| (i.slug.as_str(), id)))
            .collect();
        for &id in &written_rows {
            if let Err(e) = self.link_references(id, &synced_ids) {
                warn!(id, error = %e, "could not link pattern references");
                stats.failures.push(ItemFailure::new(id.to_string(), &e));
            }
        }

        for item in &items {
            if item.is_synced() && item.content_store_id.is_none() {
                continue;
            }
            self.register(item, &mut stats);
        }

        info!(
            discovered = stats.discovered,
            created = stats.created,
            reused = stats.reused,
            registered = stats.registered,
            failures = stats.failures.len(),
            "import finished"
        );
        Ok(stats)
    }

    /// Find or create the row behind a synced item.
    ///
    /// Returns the id when this call wrote the row's content.
    fn resolve(&mut self, item: &mut PatternItem, stats: &mut ImportStats) -> SyncResult<Option<i64>> {
        let name = sanitize_title(&item.slug);

        if let Some(post) = self.store.find_post_by_slug(PostType::Block, &name)? {
            item.content_store_id = Some(post.id);
            if self.options.policy == ReimportPolicy::PreferFile && post.content != item.content {
                self.store.update_post(
                    post.id,
                    &PostUpdate {
                        content: Some(item.content.clone()),
                        ..PostUpdate::default()
                    },
                )?;
                debug!(slug = %item.slug, id = post.id, "overwrote stored pattern with file body");
                stats.updated += 1;
                return Ok(Some(post.id));
            }
            stats.reused += 1;
            return Ok(None);
        }

        let id = self.store.create_post(&NewPost::pattern(
            name,
            item.display_title(),
            item.content.clone(),
        ))?;
        if !item.categories.is_empty() {
            self.store
                .set_post_terms(id, PATTERN_CATEGORY_TAXONOMY, &item.categories)?;
        }
        item.content_store_id = Some(id);
        debug!(slug = %item.slug, id, "created synced pattern row");
        stats.created += 1;
        Ok(Some(id))
    }

    fn link_references(&mut self, id: i64, synced: &[(&str, i64)]) -> SyncResult<()> {
        let Some(post) = self.store.get_post(id)? else {
            return Ok(());
        };
        let mut content = post.content;
        let mut changed = false;
        for &(slug, target) in synced {
            if let Some(updated) = to_direct_reference(&content, slug, target) {
                content = updated;
                changed = true;
            }
        }
        if changed {
            self.store.update_post(
                id,
                &PostUpdate {
                    content: Some(content),
                    ..PostUpdate::default()
                },
            )?;
        }
        Ok(())
    }

    fn register(&mut self, item: &PatternItem, stats: &mut ImportStats) {
        if self.registry.is_registered(&item.slug) {
            if !self.options.force_register {
                stats.already_registered += 1;
                return;
            }
            self.registry.unregister(&item.slug);
        }
        let pattern = RegisteredPattern::for_item(item, self.options.hide_unsynced);
        if self.registry.register(&item.slug, pattern) {
            stats.registered += 1;
        }
    }
}
