//! CML Parser
//!
//! Turns CML source into a [`Document`] tree. Import directives are expanded
//! on the raw text first, the result is tokenized by `cml-lexer`, and a
//! context-stack state machine builds the tree from the tokens.
//!
//! ```
//! let doc = cml_parser::parse("div[class=box]: text").unwrap();
//! let (_, div) = doc.children(doc.root()).next().unwrap();
//! assert_eq!(div.tag_text(), "div");
//! assert_eq!(div.attribute("class").unwrap().content_text(), "box");
//! ```

pub mod ast;
pub mod imports;
pub mod options;
pub mod parser;
pub mod shortcuts;

pub use ast::{Attribute, ContentItem, Document, Node, NodeId};
pub use imports::{FileLookup, FsLookup};
pub use options::{MissingImport, ParseOptions};
pub use parser::{FrameKind, Parser};
pub use shortcuts::{Shortcut, ShortcutTable};

/// Parse failure. Offsets are byte positions in the import-expanded source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("mixed indentation at offset {offset}: expected {expected:?}, found {found:?}")]
    IndentMismatch {
        offset: usize,
        expected: char,
        found: char,
    },

    #[error("unknown token {text:?} at offset {offset}")]
    UnknownToken { offset: usize, text: String },

    #[error("unknown line state at offset {offset}")]
    UnknownLineState { offset: usize },

    #[error("unexpected context target at offset {offset}: expected one of {expected:?}, got {got:?}")]
    UnexpectedContextTarget {
        offset: usize,
        expected: &'static [FrameKind],
        got: FrameKind,
    },

    #[error("cannot import '{path}': {reason}")]
    Import { path: String, reason: String },
}

impl ParseError {
    /// Whether this error signals a bug in the parser rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ParseError::UnknownLineState { .. } | ParseError::UnexpectedContextTarget { .. }
        )
    }
}

/// Parse `source` with default options.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Parser::new().parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ParseError::UnknownToken {
            offset: 3,
            text: "§".into(),
        };
        assert_eq!(err.to_string(), "unknown token \"§\" at offset 3");

        let err = ParseError::Import {
            path: "nav.cml".into(),
            reason: "not found".into(),
        };
        assert_eq!(err.to_string(), "cannot import 'nav.cml': not found");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_context_errors_are_internal() {
        let err = ParseError::UnexpectedContextTarget {
            offset: 0,
            expected: &[FrameKind::Element],
            got: FrameKind::Attribute,
        };
        assert!(err.is_internal());
    }
}
