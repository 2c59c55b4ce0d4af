//! Document parser for CML.
//!
//! A line-oriented state machine over the token stream from `cml-lexer`.
//! Each line first runs a depth test (leading spaces against the context
//! stack), then its body tokens either accumulate in a buffer or flush it
//! into the tag, content or attribute slot of the innermost context frame.
//!
//! ```text
//! div[class=box]:        element `div`, attribute list on it
//!   span: a              indent -> child of div
//!   span: b              flat   -> sibling of the previous span
//!   p: {one, two}        text block -> one nested content line
//! ```

use cml_lexer::{tokenize, Token, TokenKind};

use crate::ast::{ContentItem, Document, NodeId};
use crate::imports::{FileLookup, FsLookup, ImportExpander};
use crate::options::ParseOptions;
use crate::shortcuts::{self, ShortcutTable};
use crate::ParseError;

/// Structural kind of a context frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Element,
    Attribute,
    AttributeList,
    TextList,
}

/// What a frame writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Node(NodeId),
    Attribute { node: NodeId, index: usize },
}

/// One entry of the context stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    target: Target,
    depth: i32,
    kind: FrameKind,
    /// For bracket frames: the line state to resume once the bracket closes.
    resume: Option<LineMark>,
}

/// Line state captured when a bracket opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineMark {
    line: LineState,
    depth: i32,
    line_opened: bool,
}

impl Frame {
    fn target(&self) -> Target {
        self.target
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn kind(&self) -> FrameKind {
        self.kind
    }
}

/// The context stack. The bottom frame anchors the root and is never popped.
struct ContextStack {
    frames: Vec<Frame>,
}

impl ContextStack {
    fn new(root: NodeId) -> Self {
        Self {
            frames: vec![Frame {
                target: Target::Node(root),
                depth: -1,
                kind: FrameKind::Element,
                resume: None,
            }],
        }
    }

    fn top(&self) -> &Frame {
        self.frames.last().expect("root frame is never popped")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("root frame is never popped")
    }

    fn below(&self) -> Option<&Frame> {
        self.frames.len().checked_sub(2).map(|i| &self.frames[i])
    }

    fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Kind of the innermost open bracket sub-grammar, looking through an
    /// attribute value frame.
    fn open_bracket(&self) -> Option<FrameKind> {
        for frame in self.frames.iter().rev() {
            match frame.kind() {
                FrameKind::Attribute => continue,
                FrameKind::AttributeList | FrameKind::TextList => return Some(frame.kind()),
                FrameKind::Element => return None,
            }
        }
        None
    }
}

/// How the current line relates to the context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Still reading leading whitespace.
    TestDepth,
    /// Deeper than the top frame: new tags nest under it.
    Indent,
    /// Same depth: new tags replace the top frame with a sibling.
    Flat,
}

/// Tokens waiting to be used as a tag, content or attribute value.
#[derive(Default)]
struct TokenBuffer {
    fragments: Vec<(TokenKind, String)>,
}

impl TokenBuffer {
    fn push(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.fragments.push((kind, text.into()));
    }

    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.fragments.last().map(|(kind, _)| *kind)
    }

    /// Whether the fragments, less surrounding spaces, could name an element:
    /// bare words, symbols and escapes with no inner whitespace.
    fn is_tag_like(&self) -> bool {
        self.trimmed().iter().all(|(kind, _)| {
            matches!(kind, TokenKind::Word | TokenKind::Symbol | TokenKind::Escape)
        })
    }

    fn trimmed(&self) -> &[(TokenKind, String)] {
        let is_text = |(kind, _): &(TokenKind, String)| *kind != TokenKind::Space;
        let start = self.fragments.iter().position(is_text).unwrap_or(self.fragments.len());
        let end = self.fragments.iter().rposition(is_text).map_or(start, |i| i + 1);
        &self.fragments[start..end]
    }

    /// Drain the buffer, dropping leading and trailing spaces.
    fn take_trimmed(&mut self) -> Vec<String> {
        let kept = self.trimmed().iter().map(|(_, text)| text.clone()).collect();
        self.fragments.clear();
        kept
    }

    /// Drain the buffer, keeping only the text.
    fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.fragments)
            .into_iter()
            .map(|(_, text)| text)
            .collect()
    }
}

/// The parsing state machine. Consumed by [`TreeBuilder::build`].
struct TreeBuilder {
    doc: Document,
    stack: ContextStack,
    buffer: TokenBuffer,
    depth: i32,
    line: LineState,
    indent_char: Option<char>,
    last_break: Option<String>,
    /// An element has been opened on the current line.
    line_opened: bool,
    /// The element was opened by a bracket and may still be closed by `:`.
    header_open: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        let doc = Document::new();
        let stack = ContextStack::new(doc.root());
        Self {
            doc,
            stack,
            buffer: TokenBuffer::default(),
            depth: 0,
            line: LineState::TestDepth,
            indent_char: None,
            last_break: None,
            line_opened: false,
            header_open: false,
        }
    }

    fn build(mut self, tokens: impl IntoIterator<Item = Token>) -> Result<Document, ParseError> {
        for token in tokens {
            self.feed(token)?;
        }

        tracing::debug!(nodes = self.doc.len(), "parsed document");
        Ok(self.doc)
    }

    fn feed(&mut self, token: Token) -> Result<(), ParseError> {
        if self.line == LineState::TestDepth {
            match token.kind {
                TokenKind::Space => return self.measure_indent(&token),
                // Blank and comment-only lines never move the depth.
                TokenKind::Linebreak => {
                    self.start_line();
                    return Ok(());
                }
                TokenKind::Comment => return Ok(()),
                _ => self.test_depth(&token),
            }
        }
        self.step(token)
    }

    // =========================================================================
    // Depth test
    // =========================================================================

    fn measure_indent(&mut self, token: &Token) -> Result<(), ParseError> {
        let found = token.text.chars().next().unwrap_or(' ');
        if let Some(expected) = self.indent_char {
            if expected != found {
                return Err(ParseError::IndentMismatch {
                    offset: token.span.start,
                    expected,
                    found,
                });
            }
        }
        self.indent_char = Some(found);
        self.depth += 1;
        Ok(())
    }

    fn test_depth(&mut self, token: &Token) {
        if self.stack.top().kind() == FrameKind::TextList || self.closes_open_bracket(token) {
            self.line = LineState::Flat;
            return;
        }

        while self.depth < self.stack.top().depth() {
            if self.pop_frame().is_none() {
                break;
            }
        }

        self.line = if self.depth > self.stack.top().depth() {
            LineState::Indent
        } else {
            LineState::Flat
        };
        tracing::trace!(depth = self.depth, line = ?self.line, "depth test");
    }

    fn start_line(&mut self) {
        self.depth = 0;
        self.indent_char = None;
        self.line = LineState::TestDepth;
        self.line_opened = false;
        if self.stack.open_bracket().is_none() {
            self.header_open = false;
        }
    }

    /// A line that starts by closing the open bracket keeps it on the stack
    /// whatever its indentation.
    fn closes_open_bracket(&self, token: &Token) -> bool {
        token.kind == TokenKind::EndBracket
            && matches!(
                (self.stack.open_bracket(), token.text.as_str()),
                (Some(FrameKind::AttributeList), "]") | (Some(FrameKind::TextList), "}")
            )
    }

    // =========================================================================
    // Body
    // =========================================================================

    fn step(&mut self, token: Token) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::Linebreak | TokenKind::Break | TokenKind::EndBracket => {
                self.terminate(token)
            }
            TokenKind::Bracket => self.bracket(token),
            TokenKind::Tag => self.tag(token),
            TokenKind::Comment => Ok(()),
            TokenKind::Unknown => Err(ParseError::UnknownToken {
                offset: token.span.start,
                text: token.text,
            }),
            TokenKind::Escape => {
                self.buffer.push(TokenKind::Escape, decode_escape(&token.text));
                Ok(())
            }
            TokenKind::Word
            | TokenKind::Symbol
            | TokenKind::Space
            | TokenKind::String
            | TokenKind::RawString => {
                self.buffer.push(token.kind, token.text);
                Ok(())
            }
        }
    }

    /// Linebreak, break or closing bracket.
    fn terminate(&mut self, token: Token) -> Result<(), ParseError> {
        let offset = token.span.start;

        let closing = self.closes_open_bracket(&token);
        if token.kind == TokenKind::EndBracket && !closing && self.stack.open_bracket().is_some() {
            self.buffer.push(token.kind, token.raw);
            return Ok(());
        }

        if self.stack.top().kind() == FrameKind::Attribute {
            self.use_buffer(offset)?;
            self.pop_frame();
        }

        if self.stack.top().kind() == FrameKind::TextList && !closing {
            if token.kind == TokenKind::Linebreak {
                if !self.buffer.is_empty() && self.buffer.last_kind() != Some(TokenKind::Break) {
                    let separator = self.last_break.clone().unwrap_or_else(|| "\n".into());
                    self.buffer.push(TokenKind::Break, separator);
                }
            } else {
                self.buffer.push(TokenKind::Break, token.raw.clone());
                self.last_break = Some(token.raw);
            }
            return Ok(());
        }

        self.use_buffer(offset)?;

        if closing {
            // A bracket closed on a later line continues its opening line.
            if let Some(mark) = self.pop_frame().and_then(|frame| frame.resume) {
                self.line = mark.line;
                self.depth = mark.depth;
                self.line_opened = mark.line_opened;
            }
            self.last_break = None;
        } else if token.kind == TokenKind::Linebreak {
            self.start_line();
        }
        Ok(())
    }

    /// `[` opens an attribute list, `{` a text block.
    fn bracket(&mut self, token: Token) -> Result<(), ParseError> {
        let offset = token.span.start;

        if self.stack.top().kind() != FrameKind::Element {
            self.buffer.push(token.kind, token.raw);
            return Ok(());
        }

        if !self.buffer.is_empty() {
            if !self.line_opened && self.buffer.is_tag_like() {
                // `name[...]` / `name{...}`: the pending text names a new element.
                let tag = self.buffer.take_trimmed();
                self.open_child(tag, offset)?;
                self.header_open = true;
            } else {
                self.use_buffer(offset)?;
            }
        }

        let kind = if token.text == "[" {
            FrameKind::AttributeList
        } else {
            FrameKind::TextList
        };
        let top = *self.stack.top();
        let resume = LineMark {
            line: self.line,
            depth: self.depth,
            line_opened: self.line_opened,
        };
        self.push_frame(Frame {
            target: top.target(),
            depth: top.depth() + 1,
            kind,
            resume: Some(resume),
        });
        Ok(())
    }

    /// `:` opens a child element, `=` an attribute.
    fn tag(&mut self, token: Token) -> Result<(), ParseError> {
        let offset = token.span.start;
        let is_child = token.text == ":";

        match self.stack.top().kind() {
            FrameKind::TextList | FrameKind::Attribute => {
                self.buffer.push(token.kind, token.raw);
                Ok(())
            }
            FrameKind::AttributeList if is_child => {
                self.buffer.push(token.kind, token.raw);
                Ok(())
            }
            FrameKind::AttributeList => {
                let depth = self.stack.top().depth();
                self.open_attribute(depth, offset)
            }
            FrameKind::Element if is_child => {
                if self.header_open && self.buffer.is_empty() {
                    self.header_open = false;
                    return Ok(());
                }
                self.header_open = false;
                let tag = self.buffer.take();
                self.open_child(tag, offset)
            }
            FrameKind::Element => {
                let depth = match self.line {
                    LineState::Indent => self.depth,
                    LineState::Flat => self.stack.top().depth(),
                    LineState::TestDepth => return Err(ParseError::UnknownLineState { offset }),
                };
                self.open_attribute(depth, offset)
            }
        }
    }

    // =========================================================================
    // Tree operations
    // =========================================================================

    /// Create an element from `tag`: nested under the top frame on an indent
    /// line, or as a sibling replacing the top frame on a flat line.
    fn open_child(&mut self, tag: Vec<String>, offset: usize) -> Result<(), ParseError> {
        match self.line {
            LineState::Indent => {
                let parent = node_target(self.stack.top(), &[FrameKind::Element], offset)?;
                let child = self.doc.add_child(parent, tag);
                self.push_frame(Frame {
                    target: Target::Node(child),
                    depth: self.depth,
                    kind: FrameKind::Element,
                    resume: None,
                });
            }
            LineState::Flat => {
                let top = *self.stack.top();
                let below = self
                    .stack
                    .below()
                    .copied()
                    .ok_or(ParseError::UnexpectedContextTarget {
                        offset,
                        expected: &[FrameKind::Element],
                        got: top.kind(),
                    })?;
                let parent = node_target(&below, &[FrameKind::Element], offset)?;
                let child = self.doc.add_child(parent, tag);
                self.stack.top_mut().target = Target::Node(child);
                tracing::trace!(depth = top.depth(), "replace frame with sibling");
            }
            LineState::TestDepth => return Err(ParseError::UnknownLineState { offset }),
        }

        self.line = LineState::Flat;
        self.line_opened = true;
        Ok(())
    }

    /// Find or insert the attribute named by the buffer on the top frame's
    /// element and make it the target of a new frame.
    fn open_attribute(&mut self, depth: i32, offset: usize) -> Result<(), ParseError> {
        let node = node_target(
            self.stack.top(),
            &[FrameKind::Element, FrameKind::AttributeList],
            offset,
        )?;
        let tag = self.buffer.take();
        let index = self.doc.attribute_or_insert(node, tag);
        self.doc.node_mut(node).attributes[index].content.clear();
        self.push_frame(Frame {
            target: Target::Attribute { node, index },
            depth,
            kind: FrameKind::Attribute,
            resume: None,
        });
        Ok(())
    }

    /// Move the buffer into the top frame's slot.
    fn use_buffer(&mut self, offset: usize) -> Result<(), ParseError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let frame = *self.stack.top();
        let fragments = self.buffer.take();
        match (frame.kind(), frame.target()) {
            (FrameKind::Element, Target::Node(id)) => {
                let content = &mut self.doc.node_mut(id).content;
                content.extend(fragments.into_iter().map(ContentItem::Text));
            }
            (FrameKind::Attribute, Target::Attribute { node, index }) => {
                self.doc.node_mut(node).attributes[index].content = fragments;
            }
            (FrameKind::AttributeList, Target::Node(id)) => {
                self.doc.attribute_or_insert(id, fragments);
            }
            (FrameKind::TextList, Target::Node(id)) => {
                self.doc.node_mut(id).content.push(ContentItem::Lines(fragments));
            }
            (got, Target::Node(_)) => {
                return Err(ParseError::UnexpectedContextTarget {
                    offset,
                    expected: &[
                        FrameKind::Element,
                        FrameKind::AttributeList,
                        FrameKind::TextList,
                    ],
                    got,
                })
            }
            (got, Target::Attribute { .. }) => {
                return Err(ParseError::UnexpectedContextTarget {
                    offset,
                    expected: &[FrameKind::Attribute],
                    got,
                })
            }
        }
        Ok(())
    }

    fn push_frame(&mut self, frame: Frame) {
        tracing::trace!(depth = frame.depth(), kind = ?frame.kind(), "push frame");
        self.stack.push(frame);
    }

    fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.stack.pop();
        if let Some(frame) = &frame {
            tracing::trace!(depth = frame.depth(), kind = ?frame.kind(), "pop frame");
        }
        frame
    }
}

/// The node a frame targets, provided the frame is one of `expected`.
fn node_target(
    frame: &Frame,
    expected: &'static [FrameKind],
    offset: usize,
) -> Result<NodeId, ParseError> {
    match frame.target() {
        Target::Node(id) if expected.contains(&frame.kind()) => Ok(id),
        _ => Err(ParseError::UnexpectedContextTarget {
            offset,
            expected,
            got: frame.kind(),
        }),
    }
}

fn decode_escape(text: &str) -> String {
    match text {
        "n" => "\n".into(),
        "f" => "\x0C".into(),
        "v" => "\x0B".into(),
        "t" => "\t".into(),
        other => other.into(),
    }
}

/// CML document parser.
///
/// Expands imports, appends a closing terminator, tokenizes and runs the
/// context-stack machine. Optionally rewrites shortcut markers afterwards.
pub struct Parser {
    options: ParseOptions,
    lookup: Box<dyn FileLookup>,
    shortcuts: ShortcutTable,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with default options, reading imports from disk.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            lookup: Box::new(FsLookup),
            shortcuts: ShortcutTable::default(),
        }
    }

    /// Resolve imports through `lookup` instead of the filesystem.
    pub fn with_lookup(mut self, lookup: impl FileLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn with_shortcuts(mut self, shortcuts: ShortcutTable) -> Self {
        self.shortcuts = shortcuts;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse CML source into a document tree.
    pub fn parse(&self, source: &str) -> Result<Document, ParseError> {
        let mut script = if self.options.expand_imports {
            ImportExpander::new(
                &self.options.import_paths,
                self.lookup.as_ref(),
                self.options.missing_imports,
            )
            .expand(source)?
        } else {
            source.to_string()
        };
        script.push_str("\n;");

        let mut doc = self.parse_tokens(tokenize(&script))?;
        if self.options.shortcuts {
            let rewrites = shortcuts::apply(&mut doc, &self.shortcuts);
            tracing::debug!(rewrites, "applied shortcuts");
        }
        Ok(doc)
    }

    /// Parse an already tokenized script as-is. Nothing is appended, so the
    /// sequence should end with a terminator for trailing text to be kept.
    pub fn parse_tokens(
        &self,
        tokens: impl IntoIterator<Item = Token>,
    ) -> Result<Document, ParseError> {
        TreeBuilder::new().build(tokens)
    }
}
