/// A byte range in source text. `end` is the cursor position after the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Token classification for CML source, listed in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `\` followed by one character.
    Escape,
    /// `//` through end of line.
    Comment,
    /// Double-quoted string.
    RawString,
    /// Single-quoted string.
    String,
    /// `[` or `{`
    Bracket,
    /// `]` or `}`
    EndBracket,
    /// One or more `\n` / `\r`.
    Linebreak,
    /// `,` or `;`, collapsing any following separators and spaces.
    Break,
    /// `:` or `=`
    Tag,
    /// A single horizontal whitespace character.
    Space,
    /// A run of word characters.
    Word,
    /// One punctuation character from the symbol set.
    Symbol,
    /// Anything else.
    Unknown,
}

/// A token produced by the CML lexer.
///
/// `text` is the captured inner text (a string without its quotes, a bracket
/// without the whitespace it swallowed); `raw` is the whole matched lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub raw: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, raw: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            raw: raw.into(),
            span,
        }
    }

    /// Cursor position after this token.
    pub fn end_offset(&self) -> usize {
        self.span.end
    }
}
