//! Parser configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// What to do when an import directive cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingImport {
    /// Replace the directive with empty text and keep going.
    #[default]
    Substitute,
    /// Abort the parse with [`crate::ParseError::Import`].
    Error,
}

/// Options controlling a parse.
///
/// Deserializable so hosts can keep it in their own configuration files;
/// every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Candidate base locations for import directives, tried in order.
    pub import_paths: Vec<PathBuf>,
    /// Run the import expander before lexing.
    pub expand_imports: bool,
    pub missing_imports: MissingImport,
    /// Rewrite shortcut markers (`#id`, `.class`) after parsing.
    pub shortcuts: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            import_paths: vec![PathBuf::from(".")],
            expand_imports: true,
            missing_imports: MissingImport::Substitute,
            shortcuts: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.import_paths, vec![PathBuf::from(".")]);
        assert!(options.expand_imports);
        assert_eq!(options.missing_imports, MissingImport::Substitute);
        assert!(!options.shortcuts);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ParseOptions = serde_json::from_str(
            r#"{ "import_paths": ["lib", "vendor"], "missing_imports": "error" }"#,
        )
        .unwrap();
        assert_eq!(
            options.import_paths,
            vec![PathBuf::from("lib"), PathBuf::from("vendor")]
        );
        assert_eq!(options.missing_imports, MissingImport::Error);
        assert!(options.expand_imports);
    }

    #[test]
    fn test_deserialize_empty_object_is_default() {
        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParseOptions::default());
    }
}
