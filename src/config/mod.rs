//! Configuration management.
//!
//! This module resolves the two things every command needs:
//!
//! - **Database**: a single global content store at `~/.cbt/data/content.db`
//!   unless overridden with `--db` or `CBT_DB`
//! - **Theme**: the block theme directory, found by walking up from the
//!   current directory to the first `style.css`, unless overridden with
//!   `--theme` or `CBT_THEME`
//!
//! Theme metadata (name, text domain, parent theme) is read from the
//! `style.css` header.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::sync::ThemeFiles;
use crate::sync::codec::read_header_fields;
use crate::validate::sanitize_title;

/// Theme stylesheet carrying the theme header.
pub const STYLESHEET: &str = "style.css";

/// Only the start of `style.css` is scanned for the header.
const HEADER_READ_LIMIT: u64 = 8 * 1024;

const THEME_FIELDS: &[&str] = &["Theme Name", "Text Domain", "Template", "Version"];

/// Get the global cbt directory location (`~/.cbt/`).
#[must_use]
pub fn global_cbt_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cbt"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `CBT_DB` environment variable
/// 3. Global location: `~/.cbt/data/content.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("CBT_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_cbt_dir().map(|dir| dir.join("data").join("content.db"))
}

/// Walk up from `start` to the first directory holding a `style.css`.
#[must_use]
pub fn discover_theme_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(STYLESHEET).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Resolve and load the active theme.
///
/// Priority:
/// 1. `explicit_dir` (the `--theme` flag)
/// 2. `CBT_THEME` environment variable
/// 3. Walk up from the current directory
///
/// # Errors
///
/// Returns [`Error::ThemeNotFound`] if no directory with a `style.css` is
/// found, or an error if the stylesheet cannot be read.
pub fn resolve_theme(explicit_dir: Option<&Path>) -> Result<ThemeConfig> {
    let from_env = std::env::var("CBT_THEME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let start = match explicit_dir.map(Path::to_path_buf).or(from_env) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let root = discover_theme_dir(&start).ok_or(Error::ThemeNotFound { start })?;
    ThemeConfig::load(&root)
}

/// The active theme and what its stylesheet header says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub root: PathBuf,
    /// Parent theme directory, for child themes
    pub parent: Option<PathBuf>,
    pub name: Option<String>,
    pub text_domain: Option<String>,
    pub version: Option<String>,
}

impl ThemeConfig {
    /// Load the theme at `root` from its `style.css` header.
    ///
    /// A `Template:` header names the parent theme, looked up as a sibling
    /// directory; a missing parent is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `style.css` cannot be read.
    pub fn load(root: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        File::open(root.join(STYLESHEET))?
            .take(HEADER_READ_LIMIT)
            .read_to_end(&mut bytes)?;
        let header = String::from_utf8_lossy(&bytes);

        let mut fields = read_header_fields(&header, THEME_FIELDS);
        let mut take = |name: &str| fields.remove(name).filter(|v| !v.is_empty());

        let name = take("Theme Name");
        let text_domain = take("Text Domain");
        let version = take("Version");
        let parent = take("Template").and_then(|template| {
            let dir = root.parent()?.join(&template);
            if dir.is_dir() {
                Some(dir)
            } else {
                warn!(template = %template, "parent theme not found next to the active theme");
                None
            }
        });

        debug!(root = %root.display(), name = ?name, parent = ?parent, "loaded theme");
        Ok(Self {
            root: root.to_path_buf(),
            parent,
            name,
            text_domain,
            version,
        })
    }

    /// Namespace for pattern slugs.
    ///
    /// The text domain when set, otherwise the sanitized theme name,
    /// otherwise the directory name.
    #[must_use]
    pub fn slug(&self) -> String {
        if let Some(domain) = &self.text_domain {
            return domain.clone();
        }
        self.name
            .as_deref()
            .map(sanitize_title)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.root
                    .file_name()
                    .map(|n| sanitize_title(&n.to_string_lossy()))
            })
            .unwrap_or_default()
    }

    /// Text domain for translation calls, falling back to [`Self::slug`].
    #[must_use]
    pub fn text_domain(&self) -> String {
        self.text_domain.clone().unwrap_or_else(|| self.slug())
    }

    #[must_use]
    pub fn file_store(&self) -> ThemeFiles {
        ThemeFiles::new(&self.root, self.parent.clone())
    }
}

/// Get the default actor name recorded on audit events.
///
/// Priority:
/// 1. `CBT_ACTOR` environment variable
/// 2. Git user name
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Ok(actor) = std::env::var("CBT_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    if let Ok(user) = std::env::var("USER") {
        return user;
    }

    "unknown".to_string()
}
