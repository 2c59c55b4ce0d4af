//! Import directive expansion.
//!
//! Runs over raw source before lexing. Every `<<path~selector>>` directive is
//! replaced by the content it names, in a single left-to-right pass; text
//! pulled in by a directive is not scanned for further directives.
//!
//! ```text
//! <<partials/nav.cml>>          whole file
//! <<../shared.cml ~ footer.*>>  first match of the selector regex
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::options::MissingImport;
use crate::ParseError;

/// `<<` + leading dots/slashes + path + optional `~selector` + optional `>>`.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<[ \t\f\v./\\]*([^>\n\r~]+)~? *([^>\n\r]*)(>>)?")
        .expect("import directive pattern is valid")
});

/// Reads a file relative to a base location.
pub trait FileLookup {
    fn read(&self, base: &Path, path: &str) -> io::Result<String>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLookup;

impl FileLookup for FsLookup {
    fn read(&self, base: &Path, path: &str) -> io::Result<String> {
        std::fs::read_to_string(base.join(path))
    }
}

/// Expands import directives against an ordered list of base locations.
pub struct ImportExpander<'a> {
    bases: &'a [PathBuf],
    lookup: &'a dyn FileLookup,
    missing: MissingImport,
}

impl<'a> ImportExpander<'a> {
    pub fn new(bases: &'a [PathBuf], lookup: &'a dyn FileLookup, missing: MissingImport) -> Self {
        Self {
            bases,
            lookup,
            missing,
        }
    }

    /// Replace every directive in `source`.
    pub fn expand(&self, source: &str) -> Result<String, ParseError> {
        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        for captures in DIRECTIVE.captures_iter(source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let path = captures.get(1).map_or("", |m| m.as_str()).trim();
            let selector = captures.get(2).map_or("", |m| m.as_str()).trim();

            out.push_str(&source[last..whole.start()]);
            out.push_str(&self.resolve(path, selector)?);
            last = whole.end();
        }

        out.push_str(&source[last..]);
        Ok(out)
    }

    fn resolve(&self, path: &str, selector: &str) -> Result<String, ParseError> {
        for base in self.bases {
            let Ok(content) = self.lookup.read(base, path) else {
                continue;
            };
            tracing::debug!(path, base = %base.display(), "resolved import");
            if selector.is_empty() {
                return Ok(content);
            }
            return match Regex::new(selector) {
                Ok(pattern) => Ok(pattern
                    .find(&content)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()),
                Err(e) => self.missing(path, format!("invalid selector '{selector}': {e}")),
            };
        }

        self.missing(path, "not found in any import location".into())
    }

    fn missing(&self, path: &str, reason: String) -> Result<String, ParseError> {
        match self.missing {
            MissingImport::Substitute => {
                tracing::warn!(path, %reason, "import failed; substituting empty text");
                Ok(String::new())
            }
            MissingImport::Error => Err(ParseError::Import {
                path: path.to_string(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// In-memory lookup keyed by `base/path`.
    #[derive(Default)]
    pub(crate) struct MemoryLookup {
        pub(crate) files: HashMap<PathBuf, String>,
    }

    impl MemoryLookup {
        pub(crate) fn with(mut self, path: &str, content: &str) -> Self {
            self.files.insert(PathBuf::from(path), content.to_string());
            self
        }
    }

    impl FileLookup for MemoryLookup {
        fn read(&self, base: &Path, path: &str) -> io::Result<String> {
            self.files
                .get(&base.join(path))
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn expand(lookup: &MemoryLookup, bases: &[&str], source: &str) -> Result<String, ParseError> {
        let bases: Vec<PathBuf> = bases.iter().map(PathBuf::from).collect();
        ImportExpander::new(&bases, lookup, MissingImport::Substitute).expand(source)
    }

    #[test]
    fn test_no_directives_is_identity() {
        let lookup = MemoryLookup::default();
        assert_eq!(expand(&lookup, &["."], "div: hi").unwrap(), "div: hi");
    }

    #[test]
    fn test_whole_file() {
        let lookup = MemoryLookup::default().with("lib/nav.cml", "nav: menu");
        assert_eq!(
            expand(&lookup, &["lib"], "a\n<<nav.cml>>\nb").unwrap(),
            "a\nnav: menu\nb"
        );
    }

    #[test]
    fn test_bases_tried_in_order() {
        let lookup = MemoryLookup::default()
            .with("second/x.cml", "second")
            .with("third/x.cml", "third");
        assert_eq!(
            expand(&lookup, &["first", "second", "third"], "<<x.cml>>").unwrap(),
            "second"
        );
    }

    #[test]
    fn test_selector_takes_first_match() {
        let lookup = MemoryLookup::default().with("./parts.cml", "head: a\nfoot: b\nfoot: c");
        assert_eq!(
            expand(&lookup, &["."], "<<parts.cml~foot: \\w>>").unwrap(),
            "foot: b"
        );
    }

    #[test]
    fn test_selector_without_match_is_empty() {
        let lookup = MemoryLookup::default().with("./parts.cml", "head: a");
        assert_eq!(expand(&lookup, &["."], "[<<parts.cml~zzz>>]").unwrap(), "[]");
    }

    #[test]
    fn test_leading_dots_and_slashes_are_skipped() {
        let lookup = MemoryLookup::default().with("lib/shared.cml", "s");
        assert_eq!(expand(&lookup, &["lib"], "<<../shared.cml>>").unwrap(), "s");
    }

    #[test]
    fn test_missing_file_substitutes_empty() {
        let lookup = MemoryLookup::default();
        assert_eq!(expand(&lookup, &["a", "b"], "x<<nope.cml>>y").unwrap(), "xy");
    }

    #[test]
    fn test_missing_file_strict() {
        let lookup = MemoryLookup::default();
        let bases = vec![PathBuf::from(".")];
        let err = ImportExpander::new(&bases, &lookup, MissingImport::Error)
            .expand("<<nope.cml>>")
            .unwrap_err();
        assert!(matches!(err, ParseError::Import { ref path, .. } if path == "nope.cml"));
    }

    #[test]
    fn test_imported_directives_are_not_expanded() {
        let lookup = MemoryLookup::default()
            .with("./outer.cml", "<<inner.cml>>")
            .with("./inner.cml", "inner");
        assert_eq!(expand(&lookup, &["."], "<<outer.cml>>").unwrap(), "<<inner.cml>>");
    }

    #[test]
    fn test_unterminated_directive_runs_to_end_of_line() {
        let lookup = MemoryLookup::default().with("./a.cml", "A");
        assert_eq!(expand(&lookup, &["."], "<<a.cml\nnext").unwrap(), "A\nnext");
    }
}
