//! CML Lexer
//!
//! Tokenizes Casual Markup Language source into a lazy stream of tokens.
//! Matching is driven by a fixed, ordered list of lexeme patterns: at every
//! position the first pattern that matches wins, regardless of length.
//!
//! # Example
//!
//! ```
//! use cml_lexer::{tokenize, TokenKind};
//!
//! let kinds: Vec<TokenKind> = tokenize("div: hi").map(|t| t.kind).collect();
//! assert_eq!(kinds, vec![TokenKind::Word, TokenKind::Tag, TokenKind::Word]);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::{tokenize, Scanner};
pub use token::{Span, Token, TokenKind};
