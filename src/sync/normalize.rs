//! Per-install field stripping.
//!
//! Content authored on one site carries ids that mean nothing anywhere
//! else: the theme a template part came from, navigation menu post ids,
//! attachment ids, taxonomy term ids. Exported theme files must not carry
//! them, so they are removed from the block tree before writing.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::model::{Block, Document};

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img tag regex is valid"));

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s*)\bclass="([^"]*)""#).expect("class attribute regex is valid")
});

static IMAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wp-image-\d+$").expect("image class regex is valid"));

/// What to strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop `ref` from navigation blocks.
    pub remove_nav_refs: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_nav_refs: true,
        }
    }
}

/// Strip per-install fields from markup.
#[must_use]
pub fn normalize(content: &str, options: NormalizeOptions) -> String {
    let mut doc = Document::parse(content);
    normalize_document(&mut doc, options);
    doc.to_markup()
}

/// In-place variant of [`normalize`].
pub fn normalize_document(doc: &mut Document, options: NormalizeOptions) {
    doc.walk_blocks_mut(&mut |block| match block.block_type().to_owned().as_str() {
        "template-part" => {
            block.remove_attr("theme");
        }
        "navigation" if options.remove_nav_refs => {
            block.remove_attr("ref");
        }
        "image" | "cover" => strip_media_id(block),
        "query" => strip_tax_query(block),
        _ => {}
    });
}

fn strip_media_id(block: &mut Block) {
    if !block.attr("id").is_some_and(Value::is_number) {
        return;
    }
    block.remove_attr("id");

    for html in block.html_mut() {
        if let Some(updated) = strip_image_classes(html) {
            *html = updated;
        }
    }
}

/// Remove `wp-image-<n>` class tokens from `<img>` tags, dropping a
/// `class` attribute left empty.
fn strip_image_classes(html: &str) -> Option<String> {
    let mut changed = false;
    let updated = IMG_TAG.replace_all(html, |img: &Captures<'_>| {
        CLASS_ATTR
            .replace(&img[0], |class: &Captures<'_>| {
                let tokens: Vec<&str> = class[2].split_whitespace().collect();
                let kept: Vec<&str> = tokens
                    .iter()
                    .copied()
                    .filter(|t| !IMAGE_CLASS.is_match(t))
                    .collect();
                if kept.len() == tokens.len() {
                    return class[0].to_string();
                }
                changed = true;
                if kept.is_empty() {
                    String::new()
                } else {
                    format!("{}class=\"{}\"", &class[1], kept.join(" "))
                }
            })
            .into_owned()
    });
    changed.then(|| updated.into_owned())
}

fn strip_tax_query(block: &mut Block) {
    let has_tax_query = block
        .attr("query")
        .and_then(Value::as_object)
        .is_some_and(|q| q.contains_key("taxQuery"));
    if !has_tax_query {
        return;
    }
    if let Some(Value::Object(query)) = block.attrs_mut().get_mut("query") {
        query.shift_remove("taxQuery");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> String {
        normalize(input, NormalizeOptions::default())
    }

    #[test]
    fn test_template_part_theme_removed() {
        assert_eq!(
            run(r#"<!-- wp:template-part {"slug":"header","theme":"testtheme"} /-->"#),
            r#"<!-- wp:template-part {"slug":"header"} /-->"#
        );
    }

    #[test]
    fn test_navigation_ref_removed() {
        assert_eq!(run(r#"<!-- wp:navigation {"ref":4} /-->"#), "<!-- wp:navigation /-->");
    }

    #[test]
    fn test_navigation_ref_kept_when_disabled() {
        let input = r#"<!-- wp:navigation {"ref":4} /-->"#;
        let out = normalize(
            input,
            NormalizeOptions {
                remove_nav_refs: false,
            },
        );
        assert_eq!(out, input);
    }

    #[test]
    fn test_image_id_and_class_removed() {
        let input = r#"<!-- wp:image {"id":635} --><figure class="wp-block-image"><img src="https://example.com/a.jpg" alt="" class="wp-image-635"/></figure><!-- /wp:image -->"#;
        let out = run(input);
        assert!(out.starts_with("<!-- wp:image -->"));
        assert!(!out.contains("wp-image-635"));
        assert!(!out.contains("class=\"\""));
        assert!(out.contains(r#"<img src="https://example.com/a.jpg" alt=""/>"#));
    }

    #[test]
    fn test_other_image_classes_kept() {
        let input = r#"<!-- wp:image {"id":7,"sizeSlug":"large"} --><figure><img class="wp-image-7 rounded" src="a.jpg"/></figure><!-- /wp:image -->"#;
        let out = run(input);
        assert!(out.starts_with(r#"<!-- wp:image {"sizeSlug":"large"} -->"#));
        assert!(out.contains(r#"<img class="rounded" src="a.jpg"/>"#));
    }

    #[test]
    fn test_cover_id_removed() {
        let input = r#"<!-- wp:cover {"url":"a.jpg","id":12,"dimRatio":50} --><div class="wp-block-cover"><img class="wp-block-cover__image-background wp-image-12" src="a.jpg"/></div><!-- /wp:cover -->"#;
        let out = run(input);
        assert!(out.starts_with(r#"<!-- wp:cover {"url":"a.jpg","dimRatio":50} -->"#));
        assert!(out.contains(r#"class="wp-block-cover__image-background""#));
    }

    #[test]
    fn test_tax_query_removed_other_keys_kept() {
        let input = r#"<!-- wp:query {"queryId":1,"query":{"perPage":3,"taxQuery":{"post_tag":[9]},"order":"desc"}} --><div></div><!-- /wp:query -->"#;
        assert_eq!(
            run(input),
            r#"<!-- wp:query {"queryId":1,"query":{"perPage":3,"order":"desc"}} --><div></div><!-- /wp:query -->"#
        );
    }

    #[test]
    fn test_untouched_markup_is_identical() {
        let input = "<!-- wp:paragraph {\"align\": \"center\"} --><p>x</p><!-- /wp:paragraph -->";
        assert_eq!(run(input), input);
    }

    #[test]
    fn test_nested_blocks_normalized() {
        let input = r#"<!-- wp:group --><div><!-- wp:template-part {"slug":"footer","theme":"x"} /--></div><!-- /wp:group -->"#;
        assert_eq!(
            run(input),
            r#"<!-- wp:group --><div><!-- wp:template-part {"slug":"footer"} /--></div><!-- /wp:group -->"#
        );
    }
}
