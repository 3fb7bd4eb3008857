//! Translation wrapping for exported patterns.
//!
//! Visible text in leaf blocks (paragraphs, headings, buttons, list items)
//! and `alt` text on images is replaced with a PHP translation call so the
//! exported theme can be translated:
//!
//! ```text
//! <p>Hello</p>   →   <p><?php echo __('Hello', 'my-theme');?></p>
//! ```
//!
//! Container blocks are never wrapped themselves; the walk visits every
//! nested leaf instead.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::model::{Block, Document};

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img tag regex is valid"));

static ALT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\balt=")([^"]*)(")"#).expect("alt attribute regex is valid"));

/// HTML tags whose text content is wrapped, per leaf block type.
#[must_use]
pub fn leaf_tags(block_type: &str) -> Option<&'static [&'static str]> {
    match block_type {
        "paragraph" => Some(&["p"]),
        "heading" => Some(&["h1", "h2", "h3", "h4", "h5", "h6"]),
        "button" => Some(&["a", "button"]),
        "list-item" => Some(&["li"]),
        _ => None,
    }
}

/// Escape text for a single-quoted PHP string (addslashes rules).
#[must_use]
pub fn escape_php_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

/// The translation call emitted in place of `text`.
#[must_use]
pub fn translation_wrapper(text: &str, text_domain: &str) -> String {
    format!(
        "<?php echo __('{}', '{}');?>",
        escape_php_string(text),
        escape_php_string(text_domain)
    )
}

fn is_wrapped(text: &str) -> bool {
    text.contains("<?php")
}

/// Wrap leaf text and `alt` text throughout `content`.
#[must_use]
pub fn localize_text(content: &str, text_domain: &str) -> String {
    let mut doc = Document::parse(content);
    localize_document(&mut doc, text_domain);
    doc.to_markup()
}

/// In-place variant of [`localize_text`] for callers already holding a tree.
pub fn localize_document(doc: &mut Document, text_domain: &str) {
    doc.walk_blocks_mut(&mut |block| {
        if let Some(tags) = leaf_tags(block.block_type()) {
            wrap_leaf(block, tags, text_domain);
        }
        if block.is("image") || block.is("cover") {
            wrap_alt_attribute(block, text_domain);
        }
    });
    doc.walk_html_mut(&mut |html| {
        if let Some(updated) = wrap_img_alts(html, text_domain) {
            *html = updated;
        }
    });
}

/// Wrap the text between a leaf's first matching open tag and its last
/// matching close tag, within the block's first HTML run.
///
/// When child blocks follow (a list item holding a nested list), the text
/// runs to the end of that first run instead.
fn wrap_leaf(block: &mut Block, tags: &[&str], text_domain: &str) {
    let has_children = block.has_child_blocks();
    let Some(html) = block.html_mut().next() else {
        return;
    };
    let Some((start, tag)) = find_open_tag(html, tags) else {
        return;
    };
    let end = match html.rfind(&format!("</{tag}>")) {
        Some(end) if end >= start => end,
        _ if has_children => html.len(),
        _ => return,
    };

    let text = &html[start..end];
    let inner = text.trim();
    if inner.is_empty() || is_wrapped(inner) {
        return;
    }

    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    let replacement = format!(
        "{leading}{}{trailing}",
        translation_wrapper(inner, text_domain)
    );
    html.replace_range(start..end, &replacement);
}

/// Byte offset just past the first `<tag ...>` for any of `tags`, plus the
/// tag that matched.
fn find_open_tag<'t>(html: &str, tags: &[&'t str]) -> Option<(usize, &'t str)> {
    let lower = html.to_ascii_lowercase();
    let mut best: Option<(usize, usize, &'t str)> = None;

    for &tag in tags {
        let needle = format!("<{tag}");
        let mut from = 0;
        while let Some(offset) = lower[from..].find(&needle) {
            let at = from + offset;
            let after = at + needle.len();
            let boundary = lower.as_bytes().get(after).copied();
            if matches!(boundary, Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/')) {
                if best.is_none_or(|(b, _, _)| at < b) {
                    if let Some(close) = lower[after..].find('>') {
                        best = Some((at, after + close + 1, tag));
                    }
                }
                break;
            }
            from = after;
        }
    }

    best.map(|(_, end, tag)| (end, tag))
}

fn wrap_img_alts(html: &str, text_domain: &str) -> Option<String> {
    if !IMG_TAG.is_match(html) {
        return None;
    }
    let mut changed = false;
    let updated = IMG_TAG.replace_all(html, |img: &Captures<'_>| {
        ALT_ATTR
            .replace(&img[0], |alt: &Captures<'_>| {
                let value = &alt[2];
                if value.trim().is_empty() || is_wrapped(value) {
                    return alt[0].to_string();
                }
                changed = true;
                format!("{}{}{}", &alt[1], translation_wrapper(value, text_domain), &alt[3])
            })
            .into_owned()
    });
    changed.then(|| updated.into_owned())
}

fn wrap_alt_attribute(block: &mut Block, text_domain: &str) {
    let Some(alt) = block.attr("alt").and_then(Value::as_str) else {
        return;
    };
    if alt.trim().is_empty() || is_wrapped(alt) {
        return;
    }
    let wrapped = translation_wrapper(alt, text_domain);
    block.set_attr("alt", Value::String(wrapped));
}
