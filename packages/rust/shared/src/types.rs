//! Core domain types shared across crates.

use std::fmt;

/// What a caller-supplied context token refers to.
///
/// Derived on every call, never stored: the same token may classify
/// differently once a file appears or disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// A glob pattern matching at least one existing path.
    File,
    /// An absolute URL with a scheme.
    Url,
    /// Anything else; used verbatim.
    Term,
}

impl InputKind {
    /// Lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Term => "term",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_lowercase_labels() {
        assert_eq!(InputKind::File.to_string(), "file");
        assert_eq!(InputKind::Url.to_string(), "url");
        assert_eq!(InputKind::Term.to_string(), "term");
    }
}
