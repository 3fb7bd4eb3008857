//! Pattern file codec.
//!
//! A pattern file is a PHP header comment followed by block markup:
//!
//! ```text
//! <?php
//! /**
//!  * Title: Hero
//!  * Slug: my-theme/hero
//!  * Categories: featured, banner
//!  * Synced: yes
//!  */
//! ?>
//! <!-- wp:cover ... -->
//! ```
//!
//! The header is parsed as `Field: value` lines, first match wins. The body
//! is plain data: PHP fragments inside it (translation calls, asset URLs)
//! are carried through untouched and never evaluated.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{PatternItem, SyncStatus};
use crate::validate::parse_flag;

/// Header fields understood on pattern files, in emit order.
pub const PATTERN_FIELDS: &[&str] = &[
    "Title",
    "Slug",
    "Description",
    "Viewport Width",
    "Inserter",
    "Categories",
    "Keywords",
    "Block Types",
    "Post Types",
    "Template Types",
    "Synced",
];

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:[ \t]*<\?php)?[ \t/*#@]*([A-Za-z][A-Za-z ]*?):(.*)$")
        .expect("header line regex is valid")
});

static HEADER_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:\*/|\?>).*")
        .expect("header tail regex is valid")
});

/// Split a pattern file into its raw header and its body.
///
/// The header runs from the leading `<?php` through the first `?>` plus
/// one line break, and is returned verbatim so callers can rewrite the body
/// without reformatting the header. Files that do not start with `<?php`
/// have an empty header.
#[must_use]
pub fn split(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("<?php") {
        return ("", text);
    }
    let Some(close) = text.find("?>") else {
        return (text, "");
    };
    let mut end = close + 2;
    let rest = &text[end..];
    if rest.starts_with("\r\n") {
        end += 2;
    } else if rest.starts_with('\n') {
        end += 1;
    }
    text.split_at(end)
}

/// Read `Field: value` header lines.
///
/// Only the names listed in `names` are collected (matched
/// case-insensitively); the first occurrence of each wins. Values are
/// trimmed and cut at a closing `*/` or `?>`. Used for pattern headers and
/// `style.css` theme headers alike.
#[must_use]
pub fn read_header_fields<'a>(text: &str, names: &[&'a str]) -> HashMap<&'a str, String> {
    let mut fields = HashMap::new();
    for caps in HEADER_LINE.captures_iter(text) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let key = key.as_str().trim();
        let Some(&name) = names.iter().find(|n| n.eq_ignore_ascii_case(key)) else {
            continue;
        };
        if fields.contains_key(name) {
            continue;
        }
        let value = HEADER_TAIL.replace(value.as_str(), "");
        fields.insert(name, value.trim().to_string());
    }
    fields
}

/// Decode a pattern file into an item.
///
/// Absent fields stay `None` or empty; an unparseable `Viewport Width` is
/// `None`. A file without a `Slug:` yields an item with an empty slug,
/// which callers skip.
#[must_use]
pub fn decode(text: &str, path: &Path) -> PatternItem {
    let (header, body) = split(text);
    let mut fields = read_header_fields(header, PATTERN_FIELDS);
    let mut take = |name: &str| fields.remove(name).filter(|v| !v.is_empty());

    PatternItem {
        slug: take("Slug").unwrap_or_default(),
        title: take("Title"),
        description: take("Description"),
        viewport_width: take("Viewport Width").and_then(|v| v.parse().ok()),
        inserter: take("Inserter").and_then(|v| parse_flag(&v)),
        categories: take("Categories").map(|v| split_list(&v)).unwrap_or_default(),
        keywords: take("Keywords").map(|v| split_list(&v)).unwrap_or_default(),
        block_types: take("Block Types").map(|v| split_list(&v)).unwrap_or_default(),
        post_types: take("Post Types").map(|v| split_list(&v)).unwrap_or_default(),
        template_types: take("Template Types")
            .map(|v| split_list(&v))
            .unwrap_or_default(),
        synced: take("Synced").map_or(SyncStatus::Unsynced, |v| SyncStatus::from_header(&v)),
        content: body.to_string(),
        content_store_id: None,
        source_path: Some(path.to_path_buf()),
    }
}

/// Encode an item as a pattern file.
#[must_use]
pub fn encode(item: &PatternItem) -> String {
    let mut out = String::from("<?php\n/**\n");
    let mut field = |name: &str, value: &str| {
        let value = header_value(value);
        if !value.is_empty() {
            out.push_str(&format!(" * {name}: {value}\n"));
        }
    };

    field("Title", item.title.as_deref().unwrap_or_default());
    field("Slug", &item.slug);
    field("Description", item.description.as_deref().unwrap_or_default());
    field(
        "Viewport Width",
        &item.viewport_width.map(|w| w.to_string()).unwrap_or_default(),
    );
    field(
        "Inserter",
        match item.inserter {
            Some(true) => "yes",
            Some(false) => "no",
            None => "",
        },
    );
    field("Categories", &item.categories.join(", "));
    field("Keywords", &item.keywords.join(", "));
    field("Block Types", &item.block_types.join(", "));
    field("Post Types", &item.post_types.join(", "));
    field("Template Types", &item.template_types.join(", "));
    if item.is_synced() {
        field("Synced", "yes");
    }

    out.push_str(" */\n?>\n");
    out.push_str(&item.content);
    out
}

/// Replace the body of a pattern file, keeping its header byte for byte.
#[must_use]
pub fn replace_body(text: &str, body: &str) -> String {
    let (header, _) = split(text);
    format!("{header}{body}")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Header values are single-line and must not close the comment or the
/// PHP block.
fn header_value(value: &str) -> String {
    value
        .replace("*/", "* /")
        .replace("?>", "? >")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const HERO: &str = "<?php\n/**\n * Title: Hero\n * Slug: my-theme/hero\n * Categories: featured, banner\n * Viewport Width: 1200\n * Inserter: no\n * Synced: yes\n */\n?>\n<!-- wp:paragraph --><p>Hi</p><!-- /wp:paragraph -->\n";

    #[test]
    fn test_decode_reads_header() {
        let item = decode(HERO, Path::new("patterns/hero.php"));
        assert_eq!(item.slug, "my-theme/hero");
        assert_eq!(item.title.as_deref(), Some("Hero"));
        assert_eq!(item.categories, vec!["featured", "banner"]);
        assert_eq!(item.viewport_width, Some(1200));
        assert_eq!(item.inserter, Some(false));
        assert!(item.is_synced());
        assert_eq!(
            item.content,
            "<!-- wp:paragraph --><p>Hi</p><!-- /wp:paragraph -->\n"
        );
        assert_eq!(item.source_path, Some(PathBuf::from("patterns/hero.php")));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let item = decode("<?php\n/**\n * Slug: t/a\n */\n?>\nbody", Path::new("a.php"));
        assert_eq!(item.title, None);
        assert!(item.categories.is_empty());
        assert_eq!(item.synced, SyncStatus::Unsynced);
        assert_eq!(item.inserter, None);
    }

    #[test]
    fn test_bad_viewport_width_is_none() {
        let item = decode(
            "<?php\n/**\n * Slug: t/a\n * Viewport Width: wide\n */\n?>\n",
            Path::new("a.php"),
        );
        assert_eq!(item.viewport_width, None);
    }

    #[test]
    fn test_first_match_wins() {
        let item = decode(
            "<?php\n/**\n * Title: First\n * Title: Second\n * Slug: t/a\n */\n?>\n",
            Path::new("a.php"),
        );
        assert_eq!(item.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_body_lines_are_not_header_fields() {
        let item = decode(
            "<?php\n/**\n * Slug: t/a\n */\n?>\nTitle: not a header\n",
            Path::new("a.php"),
        );
        assert_eq!(item.title, None);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut item = PatternItem::new("my-theme/cta", "<!-- wp:buttons /-->\n");
        item.title = Some("Call to action".into());
        item.description = Some("A button row".into());
        item.categories = vec!["call-to-action".into(), "featured".into()];
        item.keywords = vec!["cta".into()];
        item.block_types = vec!["core/buttons".into()];
        item.viewport_width = Some(800);
        item.inserter = Some(false);
        item.synced = SyncStatus::Synced;

        let decoded = decode(&encode(&item), Path::new("cta.php"));
        assert_eq!(decoded.slug, item.slug);
        assert_eq!(decoded.title, item.title);
        assert_eq!(decoded.description, item.description);
        assert_eq!(decoded.categories, item.categories);
        assert_eq!(decoded.keywords, item.keywords);
        assert_eq!(decoded.block_types, item.block_types);
        assert_eq!(decoded.viewport_width, item.viewport_width);
        assert_eq!(decoded.inserter, item.inserter);
        assert_eq!(decoded.synced, item.synced);
        assert_eq!(decoded.content, item.content);
    }

    #[test]
    fn test_round_trip_with_closing_tokens_in_title() {
        let mut item = PatternItem::new("t/q", "<p>body</p>");
        item.title = Some("What?> now */ then".into());
        item.synced = SyncStatus::Synced;

        let decoded = decode(&encode(&item), Path::new("q.php"));
        assert_eq!(decoded.title.as_deref(), Some("What? > now * / then"));
        assert_eq!(decoded.slug, "t/q");
        assert_eq!(decoded.synced, SyncStatus::Synced);
        assert_eq!(decoded.content, "<p>body</p>");
    }

    #[test]
    fn test_encode_omits_empty_fields() {
        let item = PatternItem::new("t/a", "x");
        let text = encode(&item);
        assert_eq!(text, "<?php\n/**\n * Slug: t/a\n */\n?>\nx");
        assert!(!text.contains("Synced"));
    }

    #[test]
    fn test_split_keeps_header_verbatim() {
        let (header, body) = split(HERO);
        assert!(header.starts_with("<?php\n"));
        assert!(header.ends_with("?>\n"));
        assert!(body.starts_with("<!-- wp:paragraph"));
        assert_eq!(replace_body(HERO, "new"), format!("{header}new"));
    }

    #[test]
    fn test_split_without_header() {
        assert_eq!(split("<p>plain</p>"), ("", "<p>plain</p>"));
    }

    #[test]
    fn test_body_php_is_not_evaluated() {
        let text = "<?php\n/**\n * Slug: t/a\n */\n?>\n<p><?php echo __('Hi', 'x');?></p>";
        let item = decode(text, Path::new("a.php"));
        assert_eq!(item.content, "<p><?php echo __('Hi', 'x');?></p>");
    }

    #[test]
    fn test_read_style_css_header() {
        let css = "/*\nTheme Name: Test Theme\nText Domain: test-theme\nTemplate: parent */\nbody{}";
        let fields = read_header_fields(css, &["Theme Name", "Text Domain", "Template"]);
        assert_eq!(fields.get("Theme Name").map(String::as_str), Some("Test Theme"));
        assert_eq!(fields.get("Text Domain").map(String::as_str), Some("test-theme"));
        assert_eq!(fields.get("Template").map(String::as_str), Some("parent"));
    }
}
