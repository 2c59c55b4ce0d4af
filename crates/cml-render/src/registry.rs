//! Named format tables.
//!
//! Holds the tables a host renders with by name. Callers that already have a
//! table can skip the registry and call [`crate::render`] directly.

use std::collections::HashMap;

use cml_parser::{Document, NodeId};

use crate::table::FormatTable;
use crate::{html, json, RenderOptions};

/// Registry of format tables keyed by name.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, FormatTable>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in `html` and `json` formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("html", html::table());
        registry.register("json", json::table());
        registry
    }

    /// Register a table. An existing table with the same name is replaced.
    pub fn register(&mut self, name: impl Into<String>, table: FormatTable) {
        self.formats.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&FormatTable> {
        self.formats.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// All registered names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render `doc` with the named format. An unknown name renders as empty
    /// text.
    pub fn render(&self, doc: &Document, name: &str, options: &RenderOptions) -> String {
        self.render_node(doc, doc.root(), name, options)
    }

    /// Render one node of `doc` with the named format.
    pub fn render_node(
        &self,
        doc: &Document,
        node: NodeId,
        name: &str,
        options: &RenderOptions,
    ) -> String {
        match self.get(name) {
            Some(table) => crate::render(doc, node, table, options),
            None => {
                tracing::warn!(format = name, "unknown render format");
                String::new()
            }
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Slot;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_creation() {
        let registry = FormatRegistry::new();
        assert!(registry.list_formats().is_empty());
    }

    #[test]
    fn test_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["html", "json"]);
        assert!(registry.has("html"));
        assert!(registry.get("json").is_some());
    }

    #[test]
    fn test_register_custom_and_replace() {
        let mut registry = FormatRegistry::with_defaults();
        let upper = FormatTable {
            element: Slot::element(|node, _| node.tag_text().to_uppercase()),
            ..FormatTable::default()
        };
        registry.register("upper", upper.clone());
        registry.register("html", upper);

        let doc = cml_parser::parse("abc: x").unwrap();
        let options = RenderOptions::default();
        assert_eq!(registry.render(&doc, "upper", &options), "ABC");
        assert_eq!(registry.render(&doc, "html", &options), "ABC");
        assert_eq!(registry.list_formats(), vec!["html", "json", "upper"]);
    }

    #[test]
    fn test_unknown_format_is_empty() {
        let registry = FormatRegistry::with_defaults();
        let doc = cml_parser::parse("p: x").unwrap();
        assert_eq!(registry.render(&doc, "yaml", &RenderOptions::default()), "");
        assert!(!registry.has("yaml"));
    }

    #[test]
    fn test_render_single_node_by_name() {
        let registry = FormatRegistry::with_defaults();
        let doc = cml_parser::parse("ul:\n  li: a\n  li: b").unwrap();
        let (ul, _) = doc.children(doc.root()).next().unwrap();
        let whole = RenderOptions {
            skip_root: false,
            ..RenderOptions::default()
        };
        assert_eq!(
            registry.render_node(&doc, ul, "html", &whole),
            "<ul><li>a</li><li>b</li></ul>"
        );
        assert_eq!(
            registry.render_node(&doc, ul, "html", &RenderOptions::default()),
            "<li>a</li><li>b</li>"
        );
        assert_eq!(registry.render_node(&doc, ul, "yaml", &whole), "");
    }

    #[test]
    fn test_render_html_by_name() {
        let registry = FormatRegistry::with_defaults();
        let doc = cml_parser::parse("div[class=box]: text").unwrap();
        assert_eq!(
            registry.render(&doc, "html", &RenderOptions::default()),
            r#"<div class="box">text</div>"#
        );
    }
}
