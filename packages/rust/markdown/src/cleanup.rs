//! Post-conversion cleanup passes for Markdown produced from web pages.
//!
//! Each pass is a function `&str -> String`, applied in order.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Run every cleanup pass over freshly converted Markdown.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let md = collapse_blank_lines(md);
    let md = fix_fence_languages(&md);
    let md = strip_layout_tags(&md);
    let md = resolve_links(&md, base_url);
    let md = trim_line_ends(&md);
    single_trailing_newline(&md)
}

/// Collapse runs of 3+ blank lines into two.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    BLANK_RUN.replace_all(md, "\n\n\n").into_owned()
}

/// Turn ```` ```language-js ```` style fences (leaked CSS classes) into ```` ```js ````.
fn fix_fence_languages(md: &str) -> String {
    static CLASS_FENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)([\w+#.-]+)").expect("valid regex")
    });

    CLASS_FENCE.replace_all(md, "```$1").into_owned()
}

/// Drop layout-only tags that `htmd` passes through, keeping their text.
/// Lines inside fenced code are left alone.
fn strip_layout_tags(md: &str) -> String {
    static LAYOUT_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    map_prose_lines(md, |line| LAYOUT_TAG.replace_all(line, "").into_owned())
}

/// Make relative link targets absolute against the page URL.
/// Images, anchors, and already-absolute targets are kept as they are.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    static LINK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let Some(base) = base_url else {
        return md.to_string();
    };

    LINK.replace_all(md, |caps: &Captures| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        if start > 0 && md.as_bytes()[start - 1] == b'!' {
            return whole.to_string();
        }

        let href = &caps[2];
        if href.starts_with('#') || Url::parse(href).is_ok() {
            return whole.to_string();
        }

        match base.join(href) {
            Ok(resolved) => format!("[{}]({resolved})", &caps[1]),
            Err(_) => whole.to_string(),
        }
    })
    .into_owned()
}

/// Strip trailing whitespace outside fenced code.
fn trim_line_ends(md: &str) -> String {
    map_prose_lines(md, |line| line.trim_end().to_string())
}

/// Apply `f` to every line outside fenced code. Fence delimiters and the
/// lines between them pass through unchanged.
fn map_prose_lines(md: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut in_fence = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                line.to_string()
            } else if in_fence {
                line.to_string()
            } else {
                f(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_trailing_newline(md: &str) -> String {
    format!("{}\n", md.trim_end_matches('\n'))
}
