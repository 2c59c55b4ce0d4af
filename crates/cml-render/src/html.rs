//! HTML format.
//!
//! Tag text is trimmed and defaults to `div`. A trailing `/` marks a
//! self-closing element that emits only its opening tag. Newlines in content
//! become `<br>`.

use cml_parser::Node;

use crate::table::{Context, FormatTable, Slot};

/// The built-in HTML format table.
pub fn table() -> FormatTable {
    FormatTable {
        content_text: Slot::text(|text, _| text.replace('\n', "<br>")),
        attribute: Slot::attribute(|attribute, ctx| {
            let name = ctx.get("attribute_tag").unwrap_or_default().trim();
            if attribute.content.is_empty() {
                format!(" {name}")
            } else {
                let value = ctx.get("attribute_content").unwrap_or_default().trim();
                format!(" {name}=\"{value}\"")
            }
        }),
        element: Slot::element(|_, ctx| {
            let tag = ctx.get("tag").unwrap_or("div");
            let attributes = ctx.get("attributes").unwrap_or_default();
            if ctx.flag("single") {
                format!("<{tag}{attributes}>")
            } else {
                let content = ctx.get("content").unwrap_or_default();
                let children = ctx.get("children").unwrap_or_default();
                format!("<{tag}{attributes}>{content}{children}</{tag}>")
            }
        }),
        ..FormatTable::default()
    }
    .before(tag_name)
}

/// Derive the element name and the self-closing flag.
fn tag_name(node: &Node, ctx: &mut Context) {
    let joined = node.tag_text();
    let mut tag = joined.trim();
    let single = tag.ends_with('/');
    if single {
        tag = tag[..tag.len() - 1].trim_end();
    }
    ctx.set("tag", if tag.is_empty() { "div" } else { tag });
    ctx.set_flag("single", single);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render_document, RenderOptions};
    use pretty_assertions::assert_eq;

    fn html(source: &str) -> String {
        let doc = cml_parser::parse(source).unwrap();
        render_document(&doc, &table(), &RenderOptions::default())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_single_element() {
        assert_eq!(html("div: 'hello'"), "<div>hello</div>");
    }

    #[test]
    fn test_element_with_attribute() {
        assert_eq!(html("div[class=box]: text"), r#"<div class="box">text</div>"#);
    }

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            html("div:\n  span: a\n  span: b"),
            "<div><span>a</span><span>b</span></div>"
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(html("img/[src=x.png]"), r#"<img src="x.png">"#);
    }

    #[test]
    fn test_self_closing_drops_content_and_children() {
        assert_eq!(html("br/: ignored\n  p: gone"), "<br>");
    }

    #[test]
    fn test_empty_tag_defaults_to_div() {
        assert_eq!(html(": x"), "<div>x</div>");
        assert_eq!(html("/[id=a]"), r#"<div id="a">"#);
    }

    #[test]
    fn test_siblings_concatenate_at_top_level() {
        assert_eq!(html("h1: Title; p: body"), "<h1>Title</h1><p>body</p>");
    }

    #[test]
    fn test_root_renders_as_div_when_not_skipped() {
        let doc = cml_parser::parse("p: x").unwrap();
        let options = RenderOptions {
            skip_root: false,
            ..RenderOptions::default()
        };
        assert_eq!(render_document(&doc, &table(), &options), "<div><p>x</p></div>");
    }

    // =========================================================================
    // Attributes and content
    // =========================================================================

    #[test]
    fn test_boolean_and_multiple_attributes() {
        assert_eq!(
            html("input/[type=checkbox, checked]"),
            r#"<input type="checkbox" checked>"#
        );
    }

    #[test]
    fn test_attribute_names_are_trimmed() {
        assert_eq!(html("a:\n  href = /home\n  span: x"), r#"<a href="/home"><span>x</span></a>"#);
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(html(r"p: one\ntwo"), "<p>one<br>two</p>");
    }

    #[test]
    fn test_text_block_line_breaks() {
        assert_eq!(html("p: {\nfirst\nsecond\n}"), "<p>first<br>second<br></p>");
    }

    #[test]
    fn test_raw_string_passes_through() {
        assert_eq!(html("p: \"<b>x</b>\""), "<p><b>x</b></p>");
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[test]
    fn test_rendering_is_idempotent() {
        let doc = cml_parser::parse("ul[id=list]:\n  li: {a, b}\n  li/: x").unwrap();
        let table = table();
        let options = RenderOptions::default();
        let first = render_document(&doc, &table, &options);
        let second = render_document(&doc, &table, &options);
        assert_eq!(first, second);
    }

    /// Opening tag names in document order.
    fn opening_tags(html: &str) -> Vec<String> {
        html.split('<')
            .skip(1)
            .filter(|part| !part.starts_with('/'))
            .map(|part| {
                part.chars()
                    .take_while(|c| !matches!(c, '>' | ' '))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_tag_names_survive_reparse() {
        let source = "section[id=top]:\n  article:\n    header: x\n    p: y\n  footer: z\naside: w";
        let doc = cml_parser::parse(source).unwrap();
        let expected: Vec<String> = doc
            .ids()
            .skip(1)
            .map(|id| doc.node(id).tag_text())
            .collect();
        let out = render_document(&doc, &table(), &RenderOptions::default());
        assert_eq!(opening_tags(&out), expected);
        assert_eq!(expected, vec!["section", "article", "header", "p", "footer", "aside"]);
    }
}
