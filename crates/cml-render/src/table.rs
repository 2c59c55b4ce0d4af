//! Format tables.
//!
//! A [`FormatTable`] describes one output format as a closed set of slots.
//! Each slot is a function, a text template, or nothing, decided when the
//! table is built. Hooks run before and after a node and may edit the
//! render context.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cml_parser::{Attribute, Node};
use serde::Deserialize;

/// Named values visible to slots and templates while a node renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Context::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// A flag is set when its value is `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn set_flag(&mut self, name: impl Into<String>, on: bool) {
        self.set(name, if on { "true" } else { "false" });
    }
}

/// Error building a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at offset {offset}")]
    Unclosed { offset: usize },

    #[error("unmatched '}}' at offset {offset}")]
    Unmatched { offset: usize },

    #[error("empty placeholder at offset {offset}")]
    Empty { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A text template with `{name}` placeholders.
///
/// `{source}` is the slot's own input; any other name is looked up in the
/// render context and substitutes empty text when absent. `{{` and `}}` are
/// literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, '{')) | None => return Err(TemplateError::Unclosed { offset }),
                            Some((_, c)) => name.push(c),
                        }
                    }
                    if name.is_empty() {
                        return Err(TemplateError::Empty { offset });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(TemplateError::Unmatched { offset }),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, source: &str, ctx: &Context) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) if name == "source" => out.push_str(source),
                Segment::Placeholder(name) => out.push_str(ctx.get(name).unwrap_or_default()),
            }
        }
        out
    }
}

/// Renders one text fragment.
pub type TextFn = dyn Fn(&str, &Context) -> String + Send + Sync;
/// Combines rendered items into one value.
pub type JoinFn = dyn Fn(&[String], &Context) -> String + Send + Sync;
/// Renders one attribute. `attribute_tag` and `attribute_content` are
/// already in the context.
pub type AttributeFn = dyn Fn(&Attribute, &Context) -> String + Send + Sync;
/// Produces a node's output from the computed values in the context.
pub type ElementFn = dyn Fn(&Node, &Context) -> String + Send + Sync;
/// Runs before or after a node and may edit the context.
pub type HookFn = dyn Fn(&Node, &mut Context) + Send + Sync;

/// One slot of a format table.
pub enum Slot<F: ?Sized> {
    Function(Arc<F>),
    Template(Template),
    /// Identity for per-item slots, concatenation for combining slots.
    Default,
}

impl<F: ?Sized> Slot<F> {
    /// Slot rendering `text` as a template.
    pub fn template(text: &str) -> Result<Self, TemplateError> {
        Template::parse(text).map(Slot::Template)
    }
}

impl Slot<TextFn> {
    pub fn text(f: impl Fn(&str, &Context) -> String + Send + Sync + 'static) -> Self {
        Slot::Function(Arc::new(f))
    }

    pub(crate) fn apply(&self, source: &str, ctx: &Context) -> String {
        match self {
            Slot::Function(f) => f(source, ctx),
            Slot::Template(t) => t.render(source, ctx),
            Slot::Default => source.to_string(),
        }
    }
}

impl Slot<JoinFn> {
    pub fn join(f: impl Fn(&[String], &Context) -> String + Send + Sync + 'static) -> Self {
        Slot::Function(Arc::new(f))
    }

    /// `None` for the default slot, so callers can choose their own fallback.
    pub(crate) fn apply(&self, items: &[String], ctx: &Context) -> Option<String> {
        match self {
            Slot::Function(f) => Some(f(items, ctx)),
            Slot::Template(t) => Some(t.render(&items.concat(), ctx)),
            Slot::Default => None,
        }
    }
}

impl Slot<AttributeFn> {
    pub fn attribute(f: impl Fn(&Attribute, &Context) -> String + Send + Sync + 'static) -> Self {
        Slot::Function(Arc::new(f))
    }
}

impl Slot<ElementFn> {
    pub fn element(f: impl Fn(&Node, &Context) -> String + Send + Sync + 'static) -> Self {
        Slot::Function(Arc::new(f))
    }
}

impl<F: ?Sized> Default for Slot<F> {
    fn default() -> Self {
        Slot::Default
    }
}

impl<F: ?Sized> Clone for Slot<F> {
    fn clone(&self) -> Self {
        match self {
            Slot::Function(f) => Slot::Function(Arc::clone(f)),
            Slot::Template(t) => Slot::Template(t.clone()),
            Slot::Default => Slot::Default,
        }
    }
}

impl<F: ?Sized> fmt::Debug for Slot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Function(_) => f.write_str("Function"),
            Slot::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Slot::Default => f.write_str("Default"),
        }
    }
}

/// The slots and hooks that turn a tree into one output format.
///
/// Build with struct update syntax over [`FormatTable::default`], where every
/// slot is [`Slot::Default`] and there are no hooks.
#[derive(Clone, Default)]
pub struct FormatTable {
    pub before: Option<Arc<HookFn>>,
    pub after: Option<Arc<HookFn>>,

    pub tag_text: Slot<TextFn>,
    pub tag: Slot<JoinFn>,
    pub content_text: Slot<TextFn>,
    pub content: Slot<JoinFn>,

    pub attribute_tag_text: Slot<TextFn>,
    pub attribute_tag: Slot<JoinFn>,
    pub attribute_content_text: Slot<TextFn>,
    pub attribute_content: Slot<JoinFn>,
    pub attribute: Slot<AttributeFn>,
    pub attributes: Slot<JoinFn>,

    pub child: Slot<TextFn>,
    pub children: Slot<JoinFn>,

    pub element: Slot<ElementFn>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, hook: impl Fn(&Node, &mut Context) + Send + Sync + 'static) -> Self {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn after(mut self, hook: impl Fn(&Node, &mut Context) + Send + Sync + 'static) -> Self {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for FormatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatTable")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("tag", &self.tag)
            .field("content", &self.content)
            .field("attribute", &self.attribute)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Templates
    // =========================================================================

    #[test]
    fn test_template_substitutes_context_and_source() {
        let t = Template::parse("<{tag}>{source}</{tag}>").unwrap();
        let ctx = Context::new().with("tag", "p");
        assert_eq!(t.render("hi", &ctx), "<p>hi</p>");
    }

    #[test]
    fn test_template_unknown_name_is_empty() {
        let t = Template::parse("[{missing}]").unwrap();
        assert_eq!(t.render("", &Context::new()), "[]");
    }

    #[test]
    fn test_template_escaped_braces() {
        let t = Template::parse(r#"{{"tag":{tag}}}"#).unwrap();
        let ctx = Context::new().with("tag", "\"a\"");
        assert_eq!(t.render("", &ctx), r#"{"tag":"a"}"#);
    }

    #[test]
    fn test_template_errors() {
        assert_eq!(
            Template::parse("a {tag").unwrap_err(),
            TemplateError::Unclosed { offset: 2 }
        );
        assert_eq!(
            Template::parse("a } b").unwrap_err(),
            TemplateError::Unmatched { offset: 2 }
        );
        assert_eq!(Template::parse("{}").unwrap_err(), TemplateError::Empty { offset: 0 });
    }

    #[test]
    fn test_slot_template_constructor() {
        let slot: Slot<TextFn> = Slot::template("({source})").unwrap();
        assert_eq!(slot.apply("x", &Context::new()), "(x)");
        assert!(Slot::<ElementFn>::template("{").is_err());
    }

    // =========================================================================
    // Slots and context
    // =========================================================================

    #[test]
    fn test_default_text_slot_is_identity() {
        let slot: Slot<TextFn> = Slot::Default;
        assert_eq!(slot.apply("abc", &Context::new()), "abc");
    }

    #[test]
    fn test_join_slot_variants() {
        let items = vec!["a".to_string(), "b".to_string()];
        let ctx = Context::new();
        assert_eq!(Slot::join(|items, _| items.join("+")).apply(&items, &ctx), Some("a+b".into()));
        assert_eq!(
            Slot::<JoinFn>::template("[{source}]").unwrap().apply(&items, &ctx),
            Some("[ab]".into())
        );
        assert_eq!(Slot::<JoinFn>::Default.apply(&items, &ctx), None);
    }

    #[test]
    fn test_context_flags() {
        let mut ctx = Context::new();
        assert!(!ctx.flag("single"));
        ctx.set_flag("single", true);
        assert!(ctx.flag("single"));
        assert!(ctx.contains("single"));
        ctx.set_flag("single", false);
        assert!(!ctx.flag("single"));
    }

    #[test]
    fn test_context_deserializes_from_map() {
        let ctx: Context = serde_json::from_str(r#"{"lang": "en"}"#).unwrap();
        assert_eq!(ctx.get("lang"), Some("en"));
    }
}
