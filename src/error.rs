//! Error types for the cbt CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for cbt operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    PostNotFound,
    PatternNotFound,
    ThemeNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidSlug,

    // Sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Media (exit 9)
    MediaError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::PostNotFound => "POST_NOT_FOUND",
            Self::PatternNotFound => "PATTERN_NOT_FOUND",
            Self::ThemeNotFound => "THEME_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidSlug => "INVALID_SLUG",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::MediaError => "MEDIA_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::PostNotFound | Self::PatternNotFound | Self::ThemeNotFound => 3,
            Self::InvalidArgument | Self::InvalidSlug => 4,
            Self::SyncError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::MediaError => 9,
        }
    }

    /// Whether retrying with corrected input can succeed.
    ///
    /// True for validation errors and transient media downloads.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::InvalidSlug | Self::MediaError | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in cbt operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `cbt init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Post not found: {id}")]
    PostNotFound { id: i64 },

    #[error("Pattern not found: {slug}")]
    PatternNotFound { slug: String },

    #[error("Pattern not found: {slug} (did you mean: {}?)", similar.join(", "))]
    PatternNotFoundSimilar { slug: String, similar: Vec<String> },

    #[error("No block theme found from {start} (no style.css)")]
    ThemeNotFound { start: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid pattern slug: {0}")]
    InvalidSlug(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) | Self::Sync(SyncError::Database(_)) => ErrorCode::DatabaseError,
            Self::PostNotFound { .. } | Self::Sync(SyncError::PostNotFound(_)) => {
                ErrorCode::PostNotFound
            }
            Self::PatternNotFound { .. } | Self::PatternNotFoundSimilar { .. } => {
                ErrorCode::PatternNotFound
            }
            Self::ThemeNotFound { .. } => ErrorCode::ThemeNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidSlug(_) => ErrorCode::InvalidSlug,
            Self::Sync(SyncError::Fetch { .. }) => ErrorCode::MediaError,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `cbt init` to initialize the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::PostNotFound { id } => Some(format!(
                "No post with ID {id}. Use `cbt post list` to see stored posts."
            )),

            Self::PatternNotFound { slug } => Some(format!(
                "No theme pattern with slug '{slug}'. Use `cbt patterns list` to see theme patterns."
            )),
            Self::PatternNotFoundSimilar { similar, .. } => {
                Some(format!("Did you mean: {}?", similar.join(", ")))
            }

            Self::ThemeNotFound { .. } => Some(
                "Run inside a theme directory, or pass --theme <dir> (or set CBT_THEME)"
                    .to_string(),
            ),

            Self::InvalidSlug(_) => {
                Some("Pattern slugs look like `theme-name/pattern-name` (lowercase, dashes)".to_string())
            }

            Self::Sync(SyncError::Fetch { .. }) => Some(
                "Check the media URL is reachable, or pass --uploads-dir and --site-url to copy from disk"
                    .to_string(),
            ),

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Sync(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
