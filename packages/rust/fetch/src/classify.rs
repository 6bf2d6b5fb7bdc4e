//! Token classification.

use tracing::trace;
use url::Url;

use agency_shared::InputKind;

/// Decide what `token` refers to, right now.
///
/// Checks run in priority order and never fail:
/// 1. [`InputKind::File`] if the token, read as a glob, matches at least one
///    existing path (pattern or directory-read errors count as no match)
/// 2. [`InputKind::Url`] if it parses as an absolute, hierarchical URL
///    (`scheme:/...` or `scheme://...`); `word: text` prose and opaque
///    forms such as `mailto:` stay terms
/// 3. [`InputKind::Term`] otherwise
///
/// Nothing is cached; a file created between two calls changes the answer.
pub fn classify(token: &str) -> InputKind {
    let kind = if matches_existing_path(token) {
        InputKind::File
    } else if is_absolute_url(token) {
        InputKind::Url
    } else {
        InputKind::Term
    };
    trace!(token, %kind, "classified token");
    kind
}

fn matches_existing_path(pattern: &str) -> bool {
    match glob::glob(pattern) {
        Ok(paths) => paths.flatten().any(|path| path.exists()),
        Err(_) => false,
    }
}

fn is_absolute_url(token: &str) -> bool {
    Url::parse(token).is_ok_and(|url| !url.scheme().is_empty() && !url.cannot_be_a_base())
}
