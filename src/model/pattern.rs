//! Pattern item model.
//!
//! A pattern item is the in-memory form of one pattern, whether it came
//! from a theme file (`patterns/*.php`) or from a content-store row.
//! The namespaced slug (`theme-name/my-pattern`) is the join key between
//! the two representations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sync status of a pattern.
///
/// Synced patterns live in the content store as a single `wp_block` row and
/// are referenced by id. Unsynced patterns are plain templates whose file
/// is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    #[default]
    Unsynced,
}

impl SyncStatus {
    /// Get the string representation used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Unsynced => "unsynced",
        }
    }

    /// Parse the `Synced:` header value. Only `yes` means synced.
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yes") {
            Self::Synced
        } else {
            Self::Unsynced
        }
    }

    /// Map a content-store `sync_status` meta value. Absent means synced.
    #[must_use]
    pub fn from_store(value: Option<&str>) -> Self {
        match value {
            Some(v) if v == super::post::UNSYNCED => Self::Unsynced,
            _ => Self::Synced,
        }
    }
}

/// A pattern, decoded from a theme file or built from a stored post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternItem {
    /// Namespaced slug, e.g. `theme-name/my-pattern`
    pub slug: String,

    pub title: Option<String>,

    pub description: Option<String>,

    /// Preview width in pixels
    pub viewport_width: Option<u32>,

    /// Whether the pattern shows up in the inserter (`None` = default, visible)
    pub inserter: Option<bool>,

    /// Category slugs, in header order
    pub categories: Vec<String>,

    pub keywords: Vec<String>,

    pub block_types: Vec<String>,

    pub post_types: Vec<String>,

    pub template_types: Vec<String>,

    pub synced: SyncStatus,

    /// Block markup body
    pub content: String,

    /// Id of the backing content-store row, once resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_store_id: Option<i64>,

    /// File the item was decoded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl PatternItem {
    /// Create an item with a slug and body and nothing else.
    pub fn new(slug: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced == SyncStatus::Synced
    }

    #[must_use]
    pub fn inserter_visible(&self) -> bool {
        self.inserter.unwrap_or(true)
    }

    /// The part of the slug after the theme namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        self.slug
            .split_once('/')
            .map_or(self.slug.as_str(), |(_, name)| name)
    }

    /// Id used by the request interceptor for file-only patterns.
    #[must_use]
    pub fn synthetic_id(&self) -> String {
        format!("{SYNTHETIC_ID_PREFIX}{}", self.slug)
    }

    /// Title, falling back to the slug.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }
}

/// Prefix of synthetic ids handed out for file-backed patterns.
pub const SYNTHETIC_ID_PREFIX: &str = "CBT_";

/// Inverse of [`PatternItem::synthetic_id`].
#[must_use]
pub fn slug_from_synthetic_id(id: &str) -> Option<&str> {
    id.strip_prefix(SYNTHETIC_ID_PREFIX).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_from_header() {
        assert_eq!(SyncStatus::from_header("yes"), SyncStatus::Synced);
        assert_eq!(SyncStatus::from_header(" Yes "), SyncStatus::Synced);
        assert_eq!(SyncStatus::from_header("no"), SyncStatus::Unsynced);
        assert_eq!(SyncStatus::from_header(""), SyncStatus::Unsynced);
    }

    #[test]
    fn test_sync_status_from_store() {
        assert_eq!(SyncStatus::from_store(None), SyncStatus::Synced);
        assert_eq!(SyncStatus::from_store(Some("unsynced")), SyncStatus::Unsynced);
        assert_eq!(SyncStatus::from_store(Some("fully")), SyncStatus::Synced);
    }

    #[test]
    fn test_name_and_synthetic_id() {
        let item = PatternItem::new("my-theme/hero", "");
        assert_eq!(item.name(), "hero");
        assert_eq!(item.synthetic_id(), "CBT_my-theme/hero");
        assert_eq!(slug_from_synthetic_id("CBT_my-theme/hero"), Some("my-theme/hero"));
        assert_eq!(slug_from_synthetic_id("42"), None);
        assert_eq!(slug_from_synthetic_id("CBT_"), None);
    }

    #[test]
    fn test_inserter_defaults_visible() {
        let mut item = PatternItem::new("t/a", "");
        assert!(item.inserter_visible());
        item.inserter = Some(false);
        assert!(!item.inserter_visible());
        assert_eq!(item.display_title(), "t/a");
    }
}
