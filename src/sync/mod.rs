//! Theme sync and transformation.
//!
//! This module moves patterns and templates between the content store and
//! a block theme on disk:
//!
//! - **Import**: theme pattern files → content-store rows + registry
//! - **Export**: content-store rows → theme pattern/template files
//! - **Transforms**: environment stripping, text localization, media
//!   localization and reference rewriting applied on export
//! - **Status**: what is pending in either direction
//!
//! # Architecture
//!
//! The engine only talks to its surroundings through traits:
//! [`ContentStore`](crate::storage::ContentStore) for rows, [`FileStore`]
//! for theme files, [`Registry`](crate::registry::Registry) for the
//! inserter and [`MediaFetcher`] for media bytes. Block markup is handled
//! as a parsed [`Document`](crate::model::Document) tree, never as text.
//!
//! # Example
//!
//! ```ignore
//! use cbt::sync::{ExportOptions, Exporter, ImportOptions, Importer};
//!
//! let mut importer = Importer::new(&mut storage, &files, &mut registry, ImportOptions::default());
//! let stats = importer.import()?;
//!
//! let options = ExportOptions { theme_slug: "my-theme".into(), ..ExportOptions::default() };
//! let report = Exporter::new(&mut storage, &files, options).with_fetcher(&fetcher).export()?;
//! ```

pub mod codec;
mod export;
mod file;
mod hash;
mod import;
pub mod localize;
pub mod media;
pub mod normalize;
pub mod references;
mod status;
mod types;

// Re-export main types and functions
pub use export::{ExportOptions, Exporter, prepare_content};
pub use file::{FileStore, ThemeFiles, atomic_write, file_size};
pub use hash::{content_hash, has_changed, short_hash};
pub use import::{Discovery, ImportOptions, Importer, PATTERNS_DIR, discover_patterns};
pub use localize::localize_text;
pub use media::{
    HttpFetcher, MediaAsset, MediaFetcher, MediaManifest, MediaWriteStats, UploadsFetcher,
    localize_media, write_media,
};
pub use normalize::{NormalizeOptions, normalize};
pub use references::{rewrite_theme_references, to_direct_reference, to_slug_reference};
pub use status::{ThemeDirInfo, ThemeStatus, get_theme_status, print_status};
pub use types::{
    ExportKind, ExportReport, ImportStats, ItemAction, ItemFailure, ItemOutcome, ItemReport,
    ReimportPolicy, RewriteStats, SyncError, SyncResult,
};
