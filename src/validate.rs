//! Slug sanitization and header value validation.
//!
//! Slugs are the join key between theme files and content-store rows, so
//! every slug that crosses that boundary goes through [`sanitize_title`].
//! Header flags accept a small synonym set (`yes`/`no`/`true`/`false`...)
//! resolved through O(1) lookups.

use std::collections::HashMap;
use std::sync::LazyLock;

// ── Header flag synonyms ─────────────────────────────────────

pub static FLAG_VALUES: LazyLock<HashMap<&str, bool>> = LazyLock::new(|| {
    [
        ("yes", true),
        ("true", true),
        ("1", true),
        ("on", true),
        ("no", false),
        ("false", false),
        ("0", false),
        ("off", false),
    ]
    .into_iter()
    .collect()
});

/// Parse a yes/no style header flag. Unknown values yield `None`.
#[must_use]
pub fn parse_flag(input: &str) -> Option<bool> {
    FLAG_VALUES
        .get(input.trim().to_lowercase().as_str())
        .copied()
}

// ── Slugs ────────────────────────────────────────────────────

/// Reduce a title or slug to the `post_name` form.
///
/// Lowercases, strips HTML tags, turns whitespace, `/` and `.` into dashes,
/// drops every other character outside `[a-z0-9_-]` and collapses runs of
/// dashes. `theme/hero` therefore becomes `theme-hero`.
#[must_use]
pub fn sanitize_title(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_whitespace() || c == '/' || c == '.' || c == '-' => out.push('-'),
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('-').to_string()
}

/// Whether `slug` is a usable namespaced pattern slug (`namespace/name`).
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    let Some((namespace, name)) = slug.split_once('/') else {
        return false;
    };
    let segment_ok = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    };
    segment_ok(namespace) && segment_ok(name)
}

/// Build the namespaced slug for a pattern exported from a titled post.
#[must_use]
pub fn pattern_slug(theme_slug: &str, title: &str) -> String {
    format!("{}/{}", sanitize_title(theme_slug), sanitize_title(title))
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find known slugs close to a slug that was not found.
///
/// Returns up to `max` suggestions with edit distance ≤ 3,
/// sorted by distance then alphabetically.
#[must_use]
pub fn find_similar_slugs(searched: &str, existing: &[String], max: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|slug| (levenshtein_distance(searched, slug), slug.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max)
        .map(|(_, slug)| slug.to_string())
        .collect()
}
