//! Media localization.
//!
//! Exported patterns must not point at the source site's uploads. Every
//! absolute media URL found in a media block is planned as a copy into the
//! theme's `assets/` directory and rewritten to a theme-relative URL:
//!
//! ```text
//! https://example.com/wp-content/uploads/2024/01/hero.jpg
//!   → <?php echo esc_url( get_stylesheet_directory_uri() ); ?>/assets/images/hero.jpg
//! ```
//!
//! Scanning only builds a [`MediaManifest`]; nothing touches disk until
//! [`write_media`] runs with a [`MediaFetcher`].

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Block, Document, Node};
use crate::sync::file::FileStore;
use crate::sync::hash::short_hash;
use crate::sync::types::{ItemFailure, SyncError, SyncResult};

/// Prefix substituted for a media URL's origin in exported markup.
pub const THEME_URI_PREFIX: &str = "<?php echo esc_url( get_stylesheet_directory_uri() ); ?>/";

/// Block types whose attributes and markup are scanned for media.
pub const MEDIA_BLOCKS: &[&str] = &["image", "cover", "media-text", "video", "audio", "gallery"];

/// Attributes holding a media URL.
const URL_ATTRS: &[&str] = &["url", "mediaUrl", "src"];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "avif", "bmp", "ico"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "m4v"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];

static MEDIA_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:img|video|audio|source)\b[^>]*?\bsrc="([^"]+)""#)
        .expect("media src regex is valid")
});

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:&quot;|['"])?([^'"()\s&]+)(?:&quot;|['"])?\s*\)"#)
        .expect("css url regex is valid")
});

/// Kind of media, deciding the assets subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classify a URL by its file extension. Unknown extensions are not media.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let ext = basename(url)?.rsplit_once('.')?.1.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn assets_dir(&self) -> &'static str {
        match self {
            Self::Image => "assets/images",
            Self::Video => "assets/videos",
            Self::Audio => "assets/audio",
        }
    }
}

/// One planned copy: source URL and theme-relative destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAsset {
    pub url: String,
    /// Relative to the theme root, e.g. `assets/images/hero.jpg`
    pub path: String,
    pub kind: MediaKind,
}

impl MediaAsset {
    /// The URL exported markup uses in place of [`MediaAsset::url`].
    #[must_use]
    pub fn theme_url(&self) -> String {
        format!("{THEME_URI_PREFIX}{}", self.path)
    }
}

/// Planned media copies, keyed by source URL.
#[derive(Debug, Default, Clone)]
pub struct MediaManifest {
    assets: BTreeMap<String, MediaAsset>,
    paths: HashSet<String>,
}

impl MediaManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a copy of `url`, returning the (possibly existing) asset.
    ///
    /// Returns `None` if the URL is not an absolute http(s) media URL.
    pub fn plan(&mut self, url: &str) -> Option<&MediaAsset> {
        if !is_remote(url) {
            return None;
        }
        let kind = MediaKind::from_url(url)?;

        if !self.assets.contains_key(url) {
            let name = basename(url)?;
            let mut path = format!("{}/{name}", kind.assets_dir());
            if self.paths.contains(&path) {
                path = format!("{}/{}-{name}", kind.assets_dir(), short_hash(url, 8));
            }
            debug!(url, path = %path, "planned media copy");
            self.paths.insert(path.clone());
            self.assets.insert(
                url.to_string(),
                MediaAsset {
                    url: url.to_string(),
                    path,
                    kind,
                },
            );
        }
        self.assets.get(url)
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&MediaAsset> {
        self.assets.get(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaAsset> {
        self.assets.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn is_remote(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last path segment of a URL, without query or fragment.
fn basename(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    (!name.is_empty()).then_some(name)
}

/// Plan every media URL in `content` and rewrite it to its theme URL.
///
/// Both the plain and the JSON-escaped (`\/`) forms of a URL are
/// replaced. Longer URLs are replaced first so one URL that prefixes
/// another is not clobbered.
#[must_use]
pub fn localize_media(content: &str, manifest: &mut MediaManifest) -> String {
    let doc = Document::parse(content);
    let mut urls = Vec::new();
    doc.walk_blocks(&mut |block| {
        if MEDIA_BLOCKS.contains(&block.block_type()) {
            collect_block_urls(block, &mut urls);
        }
    });

    let mut planned: Vec<(String, String)> = urls
        .iter()
        .filter_map(|url| {
            manifest
                .plan(url)
                .map(|asset| (asset.url.clone(), asset.theme_url()))
        })
        .collect();
    planned.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    planned.dedup();

    let mut out = content.to_string();
    for (url, theme_url) in &planned {
        out = out.replace(url.as_str(), theme_url);
        let escaped = url.replace('/', "\\/");
        if escaped != *url {
            out = out.replace(&escaped, &theme_url.replace('/', "\\/"));
        }
    }
    out
}

fn collect_block_urls(block: &Block, urls: &mut Vec<String>) {
    for key in URL_ATTRS {
        if let Some(Value::String(url)) = block.attr(key) {
            urls.push(url.clone());
        }
    }
    if let Some(Value::Object(style)) = block.attr("style") {
        if let Some(Value::String(url)) = style
            .get("background")
            .and_then(|bg| bg.get("backgroundImage"))
            .and_then(|img| img.get("url"))
        {
            urls.push(url.clone());
        }
    }
    for node in block.inner() {
        if let Node::Html(html) = node {
            urls.extend(MEDIA_SRC.captures_iter(html).map(|c| c[1].to_string()));
            urls.extend(CSS_URL.captures_iter(html).map(|c| c[1].to_string()));
        }
    }
}

/// Source of media bytes.
pub trait MediaFetcher {
    /// Fetch the bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the media cannot be retrieved.
    fn fetch(&self, url: &str) -> SyncResult<Vec<u8>>;
}

/// Downloads media over HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpFetcher {
    /// Create a fetcher with a 30 second timeout and a redirect limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or async runtime cannot be built.
    pub fn new() -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Fetch {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(Self { client, runtime })
    }
}

impl MediaFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> SyncResult<Vec<u8>> {
        let fetch_error = |e: reqwest::Error| SyncError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(fetch_error)?;
            let bytes = response.bytes().await.map_err(fetch_error)?;
            Ok(bytes.to_vec())
        })
    }
}

/// Reads media straight from a local uploads directory.
///
/// `<site_url>/wp-content/uploads/2024/01/a.jpg` maps to
/// `<uploads_dir>/2024/01/a.jpg`.
#[derive(Debug, Clone)]
pub struct UploadsFetcher {
    site_url: String,
    uploads_dir: PathBuf,
}

impl UploadsFetcher {
    pub fn new(site_url: impl Into<String>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Local path for `url`, if it lives under the site's uploads.
    #[must_use]
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        let prefix = format!("{}/wp-content/uploads/", self.site_url);
        let rel = url.split(['?', '#']).next()?.strip_prefix(&prefix)?;
        let rel = Path::new(rel);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.uploads_dir.join(rel))
    }
}

impl MediaFetcher for UploadsFetcher {
    fn fetch(&self, url: &str) -> SyncResult<Vec<u8>> {
        let path = self.local_path(url).ok_or_else(|| SyncError::Fetch {
            url: url.to_string(),
            message: format!("not under {}/wp-content/uploads", self.site_url),
        })?;
        fs::read(&path).map_err(|e| SyncError::Fetch {
            url: url.to_string(),
            message: format!("{}: {e}", path.display()),
        })
    }
}

/// Outcome of [`write_media`].
#[derive(Debug, Default, Clone, Serialize)]
pub struct MediaWriteStats {
    pub written: usize,
    /// Assets already present with identical bytes.
    pub unchanged: usize,
    pub failures: Vec<ItemFailure>,
}

/// Copy every planned asset into the theme, once each.
///
/// A failing asset is recorded and the rest are still copied.
pub fn write_media(
    manifest: &MediaManifest,
    fetcher: &dyn MediaFetcher,
    files: &dyn FileStore,
) -> MediaWriteStats {
    let mut stats = MediaWriteStats::default();

    for asset in manifest.iter() {
        let target = files.theme_path(&asset.path);
        let result = fetcher.fetch(&asset.url).and_then(|bytes| {
            if files.exists(&target) && files.read_file(&target)? == bytes {
                return Ok(false);
            }
            files.write_file(&target, &bytes)?;
            Ok(true)
        });

        match result {
            Ok(true) => {
                debug!(url = %asset.url, path = %asset.path, "copied media");
                stats.written += 1;
            }
            Ok(false) => stats.unchanged += 1,
            Err(e) => {
                warn!(url = %asset.url, error = %e, "media copy failed");
                stats.failures.push(ItemFailure::new(asset.url.clone(), &e));
            }
        }
    }

    stats
}
