use std::sync::LazyLock;

use regex::Regex;

use crate::token::{Span, Token, TokenKind};

/// Lexeme patterns in priority order. Each is anchored at the cursor and
/// captures the token text in group 1.
static LEXEMES: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    [
        (TokenKind::Escape, r"\\(.)"),
        (TokenKind::Comment, r"/{2,}[ \t\f\v]*([^\n\r]*)"),
        (TokenKind::RawString, r#""((?:[^"\\]|\\.)*)""#),
        (TokenKind::String, r"'((?:[^'\\\n\r]|\\.)*)'"),
        (TokenKind::Bracket, r"([\[{])[ \t\f\v]*"),
        (TokenKind::EndBracket, r"([\]}])[ \t\f\v]*"),
        (TokenKind::Linebreak, r"([\n\r]+)"),
        (TokenKind::Break, r"([,;])[ \t\f\v,;]*"),
        (TokenKind::Tag, r"([:=])[ \t\f\v]*"),
        (TokenKind::Space, r"([ \t\f\v])"),
        (TokenKind::Word, r"(\w+)"),
        (TokenKind::Symbol, r"([!@#$%^\&*?/.+\-|\~()`<>])"),
        (TokenKind::Unknown, r"(?s)(.)"),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let anchored = format!("^(?:{pattern})");
        (kind, Regex::new(&anchored).expect("lexeme patterns are valid"))
    })
    .collect()
});

/// CML source scanner.
///
/// A single-pass cursor over the source. Tokens are produced on demand;
/// scanning again means building a new scanner over the same text.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.is_at_end() {
            return None;
        }

        let rest = &self.source[self.pos..];
        for (kind, pattern) in LEXEMES.iter() {
            let Some(captures) = pattern.captures(rest) else {
                continue;
            };
            let whole = captures.get(0)?;
            let text = captures.get(1).map_or("", |m| m.as_str());
            let start = self.pos;
            self.pos += whole.end();
            return Some(Token::new(
                *kind,
                text,
                whole.as_str(),
                Span::new(start, self.pos),
            ));
        }

        None
    }
}

/// Tokenize `source` lazily.
pub fn tokenize(source: &str) -> Scanner<'_> {
    Scanner::new(source)
}
