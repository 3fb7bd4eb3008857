//! Sync types for import/export between theme files and the content store.
//!
//! This module defines the policies, per-item reports and batch statistics
//! shared by the importer, exporter and reference rewriter.

use std::path::PathBuf;

use serde::Serialize;

use super::media::MediaWriteStats;

/// What to do when a synced pattern file is imported but its row exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReimportPolicy {
    /// Keep the stored row untouched; edits made in the editor win.
    #[default]
    PreferStore,
    /// Overwrite the stored row's content with the file body.
    PreferFile,
}

/// A per-item failure that did not abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    /// Slug if known, otherwise the file path
    pub item: String,
    pub message: String,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, err: &SyncError) -> Self {
        Self {
            item: item.into(),
            message: err.to_string(),
        }
    }
}

/// Statistics for an import run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    /// Pattern files decoded.
    pub discovered: usize,
    /// Files ignored because an earlier file (active theme first) had the slug.
    pub shadowed: usize,
    /// Files without a `Slug:` header.
    pub skipped_no_slug: usize,
    /// Synced rows created.
    pub created: usize,
    /// Synced rows found and reused as-is.
    pub reused: usize,
    /// Synced rows overwritten under [`ReimportPolicy::PreferFile`].
    pub updated: usize,
    /// Registry entries added.
    pub registered: usize,
    /// Registry entries left alone because they already existed.
    pub already_registered: usize,
    pub failures: Vec<ItemFailure>,
}

impl ImportStats {
    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What an exported item was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Pattern,
    Template,
    TemplatePart,
}

/// Result of writing one item's file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ItemOutcome {
    Written,
    /// Target file already had identical content.
    Unchanged,
    /// Dry run: would have been written.
    Planned,
    Failed(String),
}

impl ItemOutcome {
    /// Whether the file on disk now holds the exported content.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Written | Self::Unchanged)
    }
}

/// Follow-up applied to the content store after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "detail", rename_all = "snake_case")]
pub enum ItemAction {
    None,
    /// Synced pattern's `post_name` updated to the sanitized slug.
    Renamed,
    /// Non-synced pattern's row deleted (the file is now authoritative).
    Deleted,
    Failed(String),
}

/// Report line for one exported item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub slug: String,
    pub post_id: i64,
    pub kind: ExportKind,
    pub synced: bool,
    pub path: PathBuf,
    pub outcome: ItemOutcome,
    pub action: ItemAction,
}

/// Report of an export run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExportReport {
    pub items: Vec<ItemReport>,
    /// Planned media copies (URL → theme path).
    pub media: Vec<(String, PathBuf)>,
    pub media_written: MediaWriteStats,
    pub rewrites: RewriteStats,
    /// Template customization rows removed at the end of the run.
    pub customizations_cleared: usize,
    pub dry_run: bool,
}

impl ExportReport {
    /// Items whose file write failed.
    pub fn failed(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Failed(_)))
    }

    /// Number of items written (or planned, in a dry run).
    #[must_use]
    pub fn written(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Written | ItemOutcome::Planned))
            .count()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
            || !self.media_written.failures.is_empty()
            || self
                .items
                .iter()
                .any(|i| matches!(i.action, ItemAction::Failed(_)))
    }
}

/// Statistics for a reference rewrite over theme files.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RewriteStats {
    /// Files inspected.
    pub scanned: usize,
    /// Files rewritten.
    pub changed: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
    /// Template customization rows invalidated after the rewrite.
    pub customizations_cleared: usize,
}

impl RewriteStats {
    pub fn merge(&mut self, other: Self) {
        self.scanned += other.scanned;
        self.changed.extend(other.changed);
        self.failures.extend(other.failures);
        self.customizations_cleared += other.customizations_cleared;
    }
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Theme file not found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A theme file that could not be decoded.
    #[error("Invalid pattern file {path}: {message}")]
    InvalidPattern {
        path: PathBuf,
        message: String,
    },

    /// Content-store row not found.
    #[error("Post not found: {0}")]
    PostNotFound(i64),

    /// Media download failure.
    #[error("Media fetch failed for {url}: {message}")]
    Fetch {
        url: String,
        message: String,
    },
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<crate::error::Error> for SyncError {
    fn from(err: crate::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reimport_policy_default() {
        assert_eq!(ReimportPolicy::default(), ReimportPolicy::PreferStore);
    }

    #[test]
    fn test_outcome_persisted() {
        assert!(ItemOutcome::Written.is_persisted());
        assert!(ItemOutcome::Unchanged.is_persisted());
        assert!(!ItemOutcome::Planned.is_persisted());
        assert!(!ItemOutcome::Failed("disk full".into()).is_persisted());
    }

    #[test]
    fn test_report_counts_failures() {
        let mut report = ExportReport::default();
        report.items.push(ItemReport {
            slug: "t/a".into(),
            post_id: 1,
            kind: ExportKind::Pattern,
            synced: true,
            path: PathBuf::from("patterns/a.php"),
            outcome: ItemOutcome::Written,
            action: ItemAction::Renamed,
        });
        assert!(!report.has_failures());
        assert_eq!(report.written(), 1);

        report.items.push(ItemReport {
            slug: "t/b".into(),
            post_id: 2,
            kind: ExportKind::Pattern,
            synced: false,
            path: PathBuf::from("patterns/b.php"),
            outcome: ItemOutcome::Failed("denied".into()),
            action: ItemAction::None,
        });
        assert!(report.has_failures());
        assert_eq!(report.failed().count(), 1);
    }

    #[test]
    fn test_rewrite_stats_merge() {
        let mut a = RewriteStats {
            scanned: 2,
            changed: vec![PathBuf::from("x")],
            ..RewriteStats::default()
        };
        a.merge(RewriteStats {
            scanned: 3,
            changed: vec![PathBuf::from("y")],
            failures: vec![],
            customizations_cleared: 2,
        });
        assert_eq!(a.scanned, 5);
        assert_eq!(a.changed.len(), 2);
        assert_eq!(a.customizations_cleared, 2);
    }
}
