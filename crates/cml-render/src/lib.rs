//! CML Renderer
//!
//! Serializes a parsed CML tree through a [`FormatTable`]. The walk is
//! post-order: every child is fully rendered before its parent's `element`
//! slot runs.
//!
//! ```text
//! per node: before -> tag -> content -> attributes -> children -> element -> after
//! ```
//!
//! ```
//! let doc = cml_parser::parse("div[class=box]: text").unwrap();
//! let html = cml_render::FormatRegistry::with_defaults()
//!     .render(&doc, "html", &cml_render::RenderOptions::default());
//! assert_eq!(html, r#"<div class="box">text</div>"#);
//! ```

pub mod html;
pub mod json;
pub mod registry;
pub mod table;

use cml_parser::{ContentItem, Document, NodeId};
use serde::Deserialize;

pub use registry::FormatRegistry;
pub use table::{Context, FormatTable, Slot, Template, TemplateError};

/// Options for one render call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Render the node's children instead of the node itself.
    pub skip_root: bool,
    /// Initial context for every node.
    pub seed: Context,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            skip_root: true,
            seed: Context::new(),
        }
    }
}

/// Render `node` of `doc` with `table`.
pub fn render(doc: &Document, node: NodeId, table: &FormatTable, options: &RenderOptions) -> String {
    if options.skip_root {
        doc.node(node)
            .children()
            .iter()
            .map(|&child| render_node(doc, child, table, &options.seed))
            .collect()
    } else {
        render_node(doc, node, table, &options.seed)
    }
}

/// Render the whole document with `table`.
pub fn render_document(doc: &Document, table: &FormatTable, options: &RenderOptions) -> String {
    render(doc, doc.root(), table, options)
}

fn render_node(doc: &Document, id: NodeId, table: &FormatTable, seed: &Context) -> String {
    let node = doc.node(id);
    let mut ctx = seed.clone();

    if let Some(before) = &table.before {
        before(node, &mut ctx);
    }

    let tag: Vec<String> = node
        .tag
        .iter()
        .map(|fragment| table.tag_text.apply(fragment, &ctx))
        .collect();
    let value = table.tag.apply(&tag, &ctx);
    set_container(&mut ctx, "tag", value, &tag);

    let content: Vec<String> = node
        .content
        .iter()
        .map(|item| match item {
            ContentItem::Text(text) => table.content_text.apply(text, &ctx),
            ContentItem::Lines(lines) => {
                let lines: Vec<String> = lines
                    .iter()
                    .map(|fragment| table.content_text.apply(fragment, &ctx))
                    .collect();
                table.content.apply(&lines, &ctx).unwrap_or_else(|| lines.concat())
            }
        })
        .collect();
    let value = table.content.apply(&content, &ctx);
    set_container(&mut ctx, "content", value, &content);

    let mut attributes = Vec::with_capacity(node.attributes.len());
    for attribute in &node.attributes {
        let tag: Vec<String> = attribute
            .tag
            .iter()
            .map(|fragment| table.attribute_tag_text.apply(fragment, &ctx))
            .collect();
        let tag = table.attribute_tag.apply(&tag, &ctx).unwrap_or_else(|| tag.concat());

        let content: Vec<String> = attribute
            .content
            .iter()
            .map(|fragment| table.attribute_content_text.apply(fragment, &ctx))
            .collect();
        let content = table
            .attribute_content
            .apply(&content, &ctx)
            .unwrap_or_else(|| content.concat());

        ctx.set("attribute_tag", tag.as_str());
        ctx.set("attribute_content", content.as_str());
        attributes.push(match &table.attribute {
            Slot::Function(f) => f(attribute, &ctx),
            Slot::Template(t) => t.render(&format!("{tag}{content}"), &ctx),
            Slot::Default => format!("{tag}{content}"),
        });
    }
    let value = table.attributes.apply(&attributes, &ctx);
    set_container(&mut ctx, "attributes", value, &attributes);

    let children: Vec<String> = node
        .children()
        .iter()
        .map(|&child| {
            let rendered = render_node(doc, child, table, seed);
            table.child.apply(&rendered, &ctx)
        })
        .collect();
    let value = table.children.apply(&children, &ctx);
    set_container(&mut ctx, "children", value, &children);

    let out = match &table.element {
        Slot::Function(f) => f(node, &ctx),
        Slot::Template(t) => t.render(&node.tag_text(), &ctx),
        Slot::Default => ["tag", "attributes", "content", "children"]
            .iter()
            .filter_map(|name| ctx.get(name))
            .collect(),
    };

    if let Some(after) = &table.after {
        after(node, &mut ctx);
    }
    out
}

/// Store a node-level combined value. A default slot keeps whatever `before`
/// already put under `name` and otherwise concatenates the items.
fn set_container(ctx: &mut Context, name: &str, value: Option<String>, items: &[String]) {
    match value {
        Some(value) => ctx.set(name, value),
        None if ctx.contains(name) => {}
        None => ctx.set(name, items.concat()),
    }
}
