//! Shortcut markers in element tags.
//!
//! After parsing, a tag such as `div.card` (fragments `div`, `.`, `card`) can
//! be rewritten so the fragments after the marker become the value of an
//! attribute or the content of a child element:
//!
//! ```text
//! div.card: x    ->  div[class=card]: x
//! a#top:         ->  a[id=top]:
//! ```

use std::collections::HashMap;

use crate::ast::{ContentItem, Document};

/// Where the fragments after a marker go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortcut {
    /// Value of the named attribute, inserted if missing.
    Attribute(String),
    /// Content of the named child element, created if missing.
    Child(String),
}

/// Marker fragment to shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutTable {
    entries: HashMap<String, Shortcut>,
}

impl Default for ShortcutTable {
    fn default() -> Self {
        Self::new()
            .insert("#", Shortcut::Attribute("id".into()))
            .insert(".", Shortcut::Attribute("class".into()))
    }
}

impl ShortcutTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(mut self, marker: impl Into<String>, shortcut: Shortcut) -> Self {
        self.entries.insert(marker.into(), shortcut);
        self
    }

    pub fn get(&self, marker: &str) -> Option<&Shortcut> {
        self.entries.get(marker)
    }
}

/// Rewrite the first shortcut marker in every element tag. Returns how many
/// elements were rewritten.
pub fn apply(doc: &mut Document, table: &ShortcutTable) -> usize {
    let ids: Vec<_> = doc.ids().collect();
    let mut rewrites = 0;

    for id in ids {
        let node = doc.node_mut(id);
        let Some(at) = node.tag.iter().position(|f| table.get(f).is_some()) else {
            continue;
        };
        let mut rest = node.tag.split_off(at);
        let marker = rest.remove(0);
        let args: Vec<String> = rest.into_iter().filter(|f| f != " ").collect();

        match table.get(&marker) {
            Some(Shortcut::Attribute(name)) => {
                let index = doc.attribute_or_insert(id, vec![name.clone()]);
                doc.node_mut(id).attributes[index].content = args;
            }
            Some(Shortcut::Child(name)) => {
                let tag = vec![name.clone()];
                let child = match doc.find_child(id, &tag) {
                    Some(child) => child,
                    None => doc.add_child(id, tag),
                };
                doc.node_mut(child).content = args.into_iter().map(ContentItem::Text).collect();
            }
            None => continue,
        }
        tracing::trace!(node = id.index(), %marker, "applied shortcut");
        rewrites += 1;
    }

    rewrites
}
