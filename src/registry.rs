//! Pattern registry.
//!
//! The registry is what the block editor's inserter reads from. It is an
//! explicit object passed to the importer rather than process-global
//! state, so tests and the CLI each own their own instance.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::PatternItem;
use crate::sync::references::direct_reference_markup;

/// A registered pattern as the inserter sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredPattern {
    pub title: String,
    pub content: String,
    pub inserter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
}

impl RegisteredPattern {
    /// Registration record for an imported item.
    ///
    /// Synced items register a hidden pointer to their content-store row;
    /// the row is what the inserter offers. Non-synced items register their
    /// file content, hidden when `hide_unsynced` is set or the header says
    /// `Inserter: no`.
    #[must_use]
    pub fn for_item(item: &PatternItem, hide_unsynced: bool) -> Self {
        let (content, inserter) = match (item.is_synced(), item.content_store_id) {
            (true, Some(id)) => (direct_reference_markup(id), false),
            _ => (
                item.content.clone(),
                item.inserter_visible() && !hide_unsynced,
            ),
        };
        Self {
            title: item.display_title().to_string(),
            content,
            inserter,
            description: item.description.clone(),
            categories: item.categories.clone(),
            keywords: item.keywords.clone(),
        }
    }
}

/// Where imported patterns are made available to the editor.
pub trait Registry {
    fn is_registered(&self, slug: &str) -> bool;

    /// Register `pattern` under `slug`. Does nothing if the slug is taken;
    /// returns whether it inserted.
    fn register(&mut self, slug: &str, pattern: RegisteredPattern) -> bool;

    /// Remove a registration. Returns whether it existed.
    fn unregister(&mut self, slug: &str) -> bool;

    fn get(&self, slug: &str) -> Option<&RegisteredPattern>;
}

/// In-memory registry, ordered by slug.
#[derive(Debug, Default, Clone)]
pub struct PatternRegistry {
    patterns: BTreeMap<String, RegisteredPattern>,
}

impl PatternRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredPattern)> {
        self.patterns.iter().map(|(slug, p)| (slug.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Registry for PatternRegistry {
    fn is_registered(&self, slug: &str) -> bool {
        self.patterns.contains_key(slug)
    }

    fn register(&mut self, slug: &str, pattern: RegisteredPattern) -> bool {
        if self.patterns.contains_key(slug) {
            return false;
        }
        self.patterns.insert(slug.to_string(), pattern);
        true
    }

    fn unregister(&mut self, slug: &str) -> bool {
        self.patterns.remove(slug).is_some()
    }

    fn get(&self, slug: &str) -> Option<&RegisteredPattern> {
        self.patterns.get(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SyncStatus;

    fn pattern(content: &str) -> RegisteredPattern {
        RegisteredPattern {
            title: "Hero".into(),
            content: content.into(),
            inserter: true,
            description: None,
            categories: vec![],
            keywords: vec![],
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = PatternRegistry::new();
        assert!(registry.register("t/hero", pattern("first")));
        assert!(!registry.register("t/hero", pattern("second")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("t/hero").unwrap().content, "first");
    }

    #[test]
    fn test_forced_update_is_unregister_then_register() {
        let mut registry = PatternRegistry::new();
        registry.register("t/hero", pattern("first"));
        assert!(registry.unregister("t/hero"));
        assert!(registry.register("t/hero", pattern("second")));
        assert_eq!(registry.get("t/hero").unwrap().content, "second");
        assert!(!registry.unregister("t/missing"));
    }

    #[test]
    fn test_synced_item_registers_hidden_pointer() {
        let mut item = PatternItem::new("t/hero", "<p>body</p>");
        item.synced = SyncStatus::Synced;
        item.content_store_id = Some(12);

        let registered = RegisteredPattern::for_item(&item, true);
        assert_eq!(registered.content, r#"<!-- wp:block {"ref":12} /-->"#);
        assert!(!registered.inserter);
        assert_eq!(registered.title, "t/hero");
    }

    #[test]
    fn test_unsynced_item_visibility() {
        let item = PatternItem::new("t/plain", "<p>body</p>");
        assert!(!RegisteredPattern::for_item(&item, true).inserter);
        assert!(RegisteredPattern::for_item(&item, false).inserter);

        let mut hidden = item.clone();
        hidden.inserter = Some(false);
        let registered = RegisteredPattern::for_item(&hidden, false);
        assert!(!registered.inserter);
        assert_eq!(registered.content, "<p>body</p>");
    }
}
