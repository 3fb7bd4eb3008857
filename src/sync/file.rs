//! Theme file access.
//!
//! [`FileStore`] is the seam between the sync engine and the theme on disk.
//! [`ThemeFiles`] implements it for an active theme directory plus an
//! optional parent theme. Writes are atomic: write to a temp file, sync to
//! disk, then rename, so a failed write never leaves a half-written pattern.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::sync::types::{SyncError, SyncResult};

/// Access to theme files, relative to the active theme root.
pub trait FileStore {
    /// List files with extension `ext` directly inside `dir`.
    ///
    /// Active theme files come first (sorted by name), then parent theme
    /// files when `include_parent` is set. Returned paths are absolute.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory exists but cannot be read.
    fn list_files(&self, dir: &str, ext: &str, include_parent: bool) -> SyncResult<Vec<PathBuf>>;

    /// Read a file's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FileNotFound`] if the file is absent.
    fn read_file(&self, path: &Path) -> SyncResult<Vec<u8>>;

    /// Write a file atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if any file operation fails.
    fn write_file(&self, path: &Path, content: &[u8]) -> SyncResult<()>;

    /// Delete a file. Deleting an absent file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn delete_file(&self, path: &Path) -> SyncResult<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Absolute path of `rel` inside the active theme.
    fn theme_path(&self, rel: &str) -> PathBuf;

    /// Read a file as UTF-8 text (lossy).
    ///
    /// # Errors
    ///
    /// Same as [`FileStore::read_file`].
    fn read_text(&self, path: &Path) -> SyncResult<String> {
        let bytes = self.read_file(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Theme directory on disk, with an optional parent theme.
#[derive(Debug, Clone)]
pub struct ThemeFiles {
    root: PathBuf,
    parent: Option<PathBuf>,
}

impl ThemeFiles {
    pub fn new(root: impl Into<PathBuf>, parent: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parent,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Path> {
        self.parent.as_deref()
    }
}

impl FileStore for ThemeFiles {
    fn list_files(&self, dir: &str, ext: &str, include_parent: bool) -> SyncResult<Vec<PathBuf>> {
        let mut files = list_dir(&self.root.join(dir), ext)?;
        if include_parent {
            if let Some(parent) = &self.parent {
                files.extend(list_dir(&parent.join(dir), ext)?);
            }
        }
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> SyncResult<Vec<u8>> {
        if !path.exists() {
            return Err(SyncError::FileNotFound(path.display().to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> SyncResult<()> {
        atomic_write(path, content)
    }

    fn delete_file(&self, path: &Path) -> SyncResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn theme_path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

fn list_dir(dir: &Path, ext: &str) -> SyncResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .collect();
    files.sort();
    Ok(files)
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary sibling file
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> SyncResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SyncError::FileNotFound(path.display().to_string()))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Get the size of a file in bytes.
///
/// Returns 0 if the file doesn't exist.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("patterns/hero.php");

        atomic_write(&path, b"<?php\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<?php\n");
        assert!(!temp_dir.path().join("patterns/.hero.php.tmp").exists());
    }

    #[test]
    fn test_list_files_active_theme_first() {
        let child = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        fs::create_dir_all(child.path().join("patterns")).unwrap();
        fs::create_dir_all(parent.path().join("patterns")).unwrap();
        fs::write(child.path().join("patterns/b.php"), "").unwrap();
        fs::write(child.path().join("patterns/a.php"), "").unwrap();
        fs::write(child.path().join("patterns/notes.txt"), "").unwrap();
        fs::write(parent.path().join("patterns/a.php"), "").unwrap();

        let files = ThemeFiles::new(child.path(), Some(parent.path().to_path_buf()));

        let listed = files.list_files("patterns", "php", true).unwrap();
        assert_eq!(
            listed,
            vec![
                child.path().join("patterns/a.php"),
                child.path().join("patterns/b.php"),
                parent.path().join("patterns/a.php"),
            ]
        );

        let own = files.list_files("patterns", "php", false).unwrap();
        assert_eq!(own.len(), 2);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(temp_dir.path(), None);
        assert!(files.list_files("templates", "html", true).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(temp_dir.path(), None);
        let result = files.read_file(&files.theme_path("patterns/none.php"));
        assert!(matches!(result, Err(SyncError::FileNotFound(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let files = ThemeFiles::new(temp_dir.path(), None);
        let path = files.theme_path("patterns/x.php");
        files.write_file(&path, b"x").unwrap();
        assert!(files.exists(&path));

        files.delete_file(&path).unwrap();
        files.delete_file(&path).unwrap();
        assert!(!files.exists(&path));
    }
}
