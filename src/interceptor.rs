//! Request interception for theme-backed patterns.
//!
//! The editor lists and edits patterns through the `/wp/v2/blocks`
//! resource. Non-synced theme patterns have no row there, so the
//! interceptor:
//!
//! - appends them to list responses under a synthetic id (`CBT_<slug>`);
//! - answers reads, writes and deletes addressed to a synthetic id from the
//!   theme file itself;
//! - mirrors writes and deletes addressed to a numeric id onto the theme
//!   file backing that row.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::pattern::slug_from_synthetic_id;
use crate::model::post::UNSYNCED;
use crate::model::{PatternItem, PostType, SyncStatus};
use crate::storage::ContentStore;
use crate::sync::{FileStore, codec, discover_patterns};
use crate::validate::sanitize_title;

/// Route of the pattern collection.
pub const BLOCKS_ROUTE: &str = "/wp/v2/blocks";

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A request against a pattern resource.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub method: Method,
    pub route: String,
    /// New block markup, for writes.
    pub content: Option<String>,
}

impl ResourceRequest {
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            method,
            route: route.into(),
            content: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Id of a listed pattern: a row id or a synthetic `CBT_<slug>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PatternId {
    Post(i64),
    Synthetic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawText {
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawContent {
    pub raw: Option<String>,
    pub protected: bool,
    pub block_version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawExcerpt {
    pub raw: Option<String>,
    pub rendered: Option<String>,
    pub protected: bool,
}

/// A pattern record shaped like a `/wp/v2/blocks` item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternResponse {
    pub id: PatternId,
    pub file_path: Option<PathBuf>,
    pub slug: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: RawText,
    pub content: RawContent,
    pub excerpt: RawExcerpt,
    pub wp_pattern_category: Vec<i64>,
    /// Empty for synced patterns, `unsynced` otherwise
    pub wp_pattern_sync_status: String,
}

impl PatternResponse {
    #[must_use]
    pub fn from_item(item: &PatternItem) -> Self {
        Self {
            id: item
                .content_store_id
                .map_or_else(|| PatternId::Synthetic(item.synthetic_id()), PatternId::Post),
            file_path: item.source_path.clone(),
            slug: item.slug.clone(),
            status: "publish".to_string(),
            kind: "wp_block".to_string(),
            title: RawText {
                raw: item.title.clone(),
            },
            content: RawContent {
                raw: Some(item.content.clone()),
                protected: false,
                block_version: None,
            },
            excerpt: RawExcerpt {
                raw: item.description.clone(),
                rendered: None,
                protected: false,
            },
            wp_pattern_category: Vec::new(),
            wp_pattern_sync_status: if item.is_synced() {
                String::new()
            } else {
                UNSYNCED.to_string()
            },
        }
    }
}

/// What the host should do with a request after interception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Let the host handle the request normally.
    Continue,
    /// Short-circuit with this pattern.
    Respond(Box<PatternResponse>),
}

/// Serves theme patterns through the pattern resource.
#[derive(Debug, Clone, Default)]
pub struct PatternInterceptor {
    patterns: Vec<PatternItem>,
}

impl PatternInterceptor {
    #[must_use]
    pub fn new(patterns: Vec<PatternItem>) -> Self {
        Self { patterns }
    }

    /// Load the theme's patterns, attaching row ids to synced ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the theme cannot be listed or the store queried.
    pub fn load(store: &dyn ContentStore, files: &dyn FileStore) -> Result<Self> {
        let mut patterns = discover_patterns(files)?.items;
        for item in patterns.iter_mut().filter(|i| i.is_synced()) {
            let name = sanitize_title(&item.slug);
            item.content_store_id = store
                .find_post_by_slug(PostType::Block, &name)?
                .map(|p| p.id);
        }
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn patterns(&self) -> &[PatternItem] {
        &self.patterns
    }

    /// Append non-synced, inserter-visible theme patterns to a collection
    /// listing. Other routes pass through unchanged.
    #[must_use]
    pub fn filter_list_response(
        &self,
        route: &str,
        mut response: Vec<PatternResponse>,
    ) -> Vec<PatternResponse> {
        if route != BLOCKS_ROUTE {
            return response;
        }
        response.extend(
            self.patterns
                .iter()
                .filter(|p| p.synced == SyncStatus::Unsynced && p.inserter_visible())
                .map(|p| {
                    let mut listed = p.clone();
                    listed.content_store_id = None;
                    PatternResponse::from_item(&listed)
                }),
        );
        response
    }

    /// Intercept a single-pattern request before the host handles it.
    ///
    /// Synthetic ids are answered entirely from the theme. For numeric ids
    /// the backing file is updated and the host still applies its own
    /// action, except for deletes, where the row is removed here too.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the theme file cannot be accessed.
    pub fn pre_dispatch(
        &mut self,
        request: &ResourceRequest,
        store: &mut dyn ContentStore,
        files: &dyn FileStore,
    ) -> Result<Dispatch> {
        let Some(target) = request.route.strip_prefix(BLOCKS_ROUTE).and_then(|r| r.strip_prefix('/'))
        else {
            return Ok(Dispatch::Continue);
        };

        let (slug, post_id) = if let Some(slug) = slug_from_synthetic_id(target) {
            (slug.to_string(), None)
        } else {
            let Ok(id) = target.parse::<i64>() else {
                return Ok(Dispatch::Continue);
            };
            let Some(post) = store.get_post(id)? else {
                return Ok(Dispatch::Continue);
            };
            (post.name, Some(id))
        };

        let wanted = sanitize_title(&slug);
        let Some(index) = self
            .patterns
            .iter()
            .position(|p| sanitize_title(&p.slug) == wanted)
        else {
            return Ok(Dispatch::Continue);
        };

        match request.method {
            Method::Get => {}
            Method::Put | Method::Post => {
                if let Some(content) = &request.content {
                    self.write_pattern(index, content, files)?;
                }
            }
            Method::Delete => {
                let pattern = self.patterns.remove(index);
                if let Some(path) = &pattern.source_path {
                    files.delete_file(path)?;
                    debug!(slug = %pattern.slug, path = %path.display(), "deleted pattern file");
                }
                if let Some(id) = post_id {
                    store.delete_post(id)?;
                }
                return Ok(Dispatch::Respond(Box::new(PatternResponse::from_item(&pattern))));
            }
        }

        if post_id.is_some() {
            return Ok(Dispatch::Continue);
        }
        Ok(Dispatch::Respond(Box::new(PatternResponse::from_item(
            &self.patterns[index],
        ))))
    }

    /// Rewrite a pattern file with new content, keeping its identifying
    /// header fields.
    fn write_pattern(&mut self, index: usize, content: &str, files: &dyn FileStore) -> Result<()> {
        let pattern = &mut self.patterns[index];
        let Some(path) = pattern.source_path.clone() else {
            return Ok(());
        };
        let header = PatternItem {
            slug: pattern.slug.clone(),
            title: pattern.title.clone(),
            categories: pattern.categories.clone(),
            synced: pattern.synced,
            content: content.to_string(),
            ..PatternItem::default()
        };
        files.write_file(&path, codec::encode(&header).as_bytes())?;
        debug!(slug = %pattern.slug, path = %path.display(), "rewrote pattern file");
        pattern.content = content.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewPost;
    use crate::storage::SqliteStorage;
    use crate::sync::ThemeFiles;
    use std::fs;
    use tempfile::TempDir;

    fn theme() -> (TempDir, ThemeFiles) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("patterns")).unwrap();
        fs::write(
            dir.path().join("patterns/plain.php"),
            "<?php\n/**\n * Title: Plain\n * Slug: t/plain\n * Categories: text\n * Keywords: a, b\n */\n?>\n<p>plain</p>",
        )
        .unwrap();
        fs::write(
            dir.path().join("patterns/hidden.php"),
            "<?php\n/**\n * Slug: t/hidden\n * Inserter: no\n */\n?>\n<p>hidden</p>",
        )
        .unwrap();
        fs::write(
            dir.path().join("patterns/hero.php"),
            "<?php\n/**\n * Title: Hero\n * Slug: t/hero\n * Synced: yes\n */\n?>\n<p>hero</p>",
        )
        .unwrap();
        let files = ThemeFiles::new(dir.path(), None);
        (dir, files)
    }

    #[test]
    fn test_list_response_gets_visible_unsynced_patterns() {
        let (_dir, files) = theme();
        let store = SqliteStorage::open_memory().unwrap();
        let interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let listed = interceptor.filter_list_response(BLOCKS_ROUTE, Vec::new());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, PatternId::Synthetic("CBT_t/plain".into()));
        assert_eq!(listed[0].wp_pattern_sync_status, "unsynced");
        assert_eq!(listed[0].content.raw.as_deref(), Some("<p>plain</p>"));

        let json = serde_json::to_value(&listed[0]).unwrap();
        assert_eq!(json["id"], "CBT_t/plain");
        assert_eq!(json["type"], "wp_block");

        let other = interceptor.filter_list_response("/wp/v2/pages", Vec::new());
        assert!(other.is_empty());
    }

    #[test]
    fn test_get_synthetic_id_responds_from_file() {
        let (_dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let request = ResourceRequest::new(Method::Get, "/wp/v2/blocks/CBT_t/plain");
        let Dispatch::Respond(response) = interceptor.pre_dispatch(&request, &mut store, &files).unwrap()
        else {
            panic!("expected a response");
        };
        assert_eq!(response.slug, "t/plain");
        assert_eq!(response.title.raw.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_put_synthetic_id_rewrites_file() {
        let (dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let request = ResourceRequest::new(Method::Put, "/wp/v2/blocks/CBT_t/plain")
            .with_content("<p>edited</p>");
        let dispatch = interceptor.pre_dispatch(&request, &mut store, &files).unwrap();
        assert!(matches!(dispatch, Dispatch::Respond(ref r) if r.content.raw.as_deref() == Some("<p>edited</p>")));

        let text = fs::read_to_string(dir.path().join("patterns/plain.php")).unwrap();
        assert_eq!(
            text,
            "<?php\n/**\n * Title: Plain\n * Slug: t/plain\n * Categories: text\n */\n?>\n<p>edited</p>"
        );
    }

    #[test]
    fn test_numeric_id_put_updates_file_and_continues() {
        let (dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("t-hero", "Hero", "<p>hero</p>"))
            .unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let request = ResourceRequest::new(Method::Put, format!("/wp/v2/blocks/{id}"))
            .with_content("<p>new hero</p>");
        let dispatch = interceptor.pre_dispatch(&request, &mut store, &files).unwrap();
        assert_eq!(dispatch, Dispatch::Continue);

        let text = fs::read_to_string(dir.path().join("patterns/hero.php")).unwrap();
        assert!(text.contains(" * Synced: yes\n"));
        assert!(text.ends_with("<p>new hero</p>"));
    }

    #[test]
    fn test_numeric_id_delete_removes_file_and_row() {
        let (dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("t-hero", "Hero", "<p>hero</p>"))
            .unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let request = ResourceRequest::new(Method::Delete, format!("/wp/v2/blocks/{id}"));
        let dispatch = interceptor.pre_dispatch(&request, &mut store, &files).unwrap();
        assert!(matches!(dispatch, Dispatch::Respond(_)));
        assert!(!dir.path().join("patterns/hero.php").exists());
        assert!(store.get_post(id).unwrap().is_none());
        assert_eq!(interceptor.patterns().len(), 2);
    }

    #[test]
    fn test_delete_synthetic_id_removes_file_only() {
        let (dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let unrelated = store
            .create_post(&NewPost::pattern("t-plain", "Plain", "<p>row</p>"))
            .unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let request = ResourceRequest::new(Method::Delete, "/wp/v2/blocks/CBT_t/plain");
        let Dispatch::Respond(deleted) = interceptor.pre_dispatch(&request, &mut store, &files).unwrap()
        else {
            panic!("expected a response");
        };
        assert_eq!(deleted.id, PatternId::Synthetic("CBT_t/plain".into()));
        assert!(!dir.path().join("patterns/plain.php").exists());
        assert!(dir.path().join("patterns/hero.php").exists());
        assert!(store.get_post(unrelated).unwrap().is_some());
        assert!(interceptor.patterns().iter().all(|p| p.slug != "t/plain"));

        let again = interceptor.pre_dispatch(&request, &mut store, &files).unwrap();
        assert_eq!(again, Dispatch::Continue);
    }

    #[test]
    fn test_parent_theme_pattern_served_and_rewritten_in_place() {
        let (child, _) = theme();
        let parent = TempDir::new().unwrap();
        fs::create_dir_all(parent.path().join("patterns")).unwrap();
        fs::write(
            parent.path().join("patterns/footer.php"),
            "<?php\n/**\n * Title: Footer\n * Slug: base/footer\n */\n?>\n<p>base</p>",
        )
        .unwrap();
        let files = ThemeFiles::new(child.path(), Some(parent.path().to_path_buf()));
        let mut store = SqliteStorage::open_memory().unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        let get = ResourceRequest::new(Method::Get, "/wp/v2/blocks/CBT_base/footer");
        let Dispatch::Respond(response) = interceptor.pre_dispatch(&get, &mut store, &files).unwrap()
        else {
            panic!("expected a response");
        };
        assert_eq!(response.content.raw.as_deref(), Some("<p>base</p>"));
        assert_eq!(
            response.file_path.as_deref(),
            Some(parent.path().join("patterns/footer.php").as_path())
        );

        let put = ResourceRequest::new(Method::Put, "/wp/v2/blocks/CBT_base/footer")
            .with_content("<p>edited</p>");
        let dispatch = interceptor.pre_dispatch(&put, &mut store, &files).unwrap();
        assert!(matches!(dispatch, Dispatch::Respond(_)));
        let text = fs::read_to_string(parent.path().join("patterns/footer.php")).unwrap();
        assert!(text.contains(" * Slug: base/footer\n"));
        assert!(text.ends_with("<p>edited</p>"));
        assert!(!child.path().join("patterns/footer.php").exists());
    }

    #[test]
    fn test_unrelated_requests_continue() {
        let (_dir, files) = theme();
        let mut store = SqliteStorage::open_memory().unwrap();
        let id = store
            .create_post(&NewPost::pattern("not-in-theme", "Other", ""))
            .unwrap();
        let mut interceptor = PatternInterceptor::load(&store, &files).unwrap();

        for route in [
            "/wp/v2/pages/4".to_string(),
            "/wp/v2/blocks/CBT_t/unknown".to_string(),
            "/wp/v2/blocks/999".to_string(),
            format!("/wp/v2/blocks/{id}"),
            "/wp/v2/blocks".to_string(),
        ] {
            let request = ResourceRequest::new(Method::Get, route);
            assert_eq!(
                interceptor.pre_dispatch(&request, &mut store, &files).unwrap(),
                Dispatch::Continue
            );
        }
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
        assert_eq!(Method::parse("PATCH"), None);
    }
}
