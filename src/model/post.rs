//! Content-store post model.
//!
//! Posts are the database side of the sync: `wp_block` rows hold user
//! patterns, `wp_template` / `wp_template_part` rows hold per-site
//! template customizations.

use serde::{Deserialize, Serialize};

/// Taxonomy holding pattern categories.
pub const PATTERN_CATEGORY_TAXONOMY: &str = "wp_pattern_category";

/// `sync_status` meta value marking a non-synced pattern.
pub const UNSYNCED: &str = "unsynced";

/// Post types the sync engine touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostType {
    #[serde(rename = "wp_block")]
    Block,
    #[serde(rename = "wp_template")]
    Template,
    #[serde(rename = "wp_template_part")]
    TemplatePart,
}

impl PostType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "wp_block",
            Self::Template => "wp_template",
            Self::TemplatePart => "wp_template_part",
        }
    }

    /// Parse from the storage string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wp_block" => Some(Self::Block),
            "wp_template" => Some(Self::Template),
            "wp_template_part" => Some(Self::TemplatePart),
            _ => None,
        }
    }

    /// Theme directory that holds files of this type.
    #[must_use]
    pub const fn theme_dir(&self) -> &'static str {
        match self {
            Self::Block => "patterns",
            Self::Template => "templates",
            Self::TemplatePart => "template-parts",
        }
    }
}

/// A content-store row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,

    pub post_type: PostType,

    /// Sanitized slug (`post_name`)
    pub name: String,

    pub title: String,

    /// Block markup
    pub content: String,

    /// Publication status, `publish` for everything the engine creates
    pub status: String,

    /// `None` means synced; `Some("unsynced")` marks a plain pattern
    pub sync_status: Option<String>,

    /// Theme a template customization belongs to
    pub theme: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Post {
    #[must_use]
    pub fn is_unsynced(&self) -> bool {
        self.sync_status.as_deref() == Some(UNSYNCED)
    }
}

/// Fields for a new row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub post_type: PostType,
    pub name: String,
    pub title: String,
    pub content: String,
    pub sync_status: Option<String>,
    pub theme: Option<String>,
}

impl NewPost {
    /// A published synced pattern row.
    pub fn pattern(
        name: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            post_type: PostType::Block,
            name: name.into(),
            title: title.into(),
            content: content.into(),
            sync_status: None,
            theme: None,
        }
    }

    /// Mark the row as a non-synced pattern.
    #[must_use]
    pub fn unsynced(mut self) -> Self {
        self.sync_status = Some(UNSYNCED.to_string());
        self
    }
}

/// Partial update of a row. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.title.is_none() && self.content.is_none()
    }
}
