//! HTML-to-Markdown conversion for fetched pages.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use agency_shared::{AgencyError, Result};

use crate::cleanup;

/// Tags whose content never reaches the Markdown output.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "svg", "iframe", "template"];

/// Containers tried, in order, when only the main content is wanted.
const MAIN_CONTENT_SELECTORS: [&str; 4] = ["article", "main", "[role=\"main\"]", ".content"];

static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title, h1"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static DATA_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Options for a single page conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Page URL, used to resolve relative links.
    pub source_url: Option<Url>,
    /// Convert only the main content container instead of the whole body.
    pub main_content_only: bool,
}

/// Result of converting an HTML page to Markdown.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Cleaned Markdown text, ending in exactly one newline.
    pub markdown: String,
    /// `<title>` or first `<h1>` text, if any.
    pub title: Option<String>,
}

/// Convert a rendered HTML document to readable Markdown.
///
/// 1. Picks the `<body>` (or the main content container)
/// 2. Rewrites `<table>` elements as Markdown tables
/// 3. Converts HTML → Markdown via `htmd`
/// 4. Runs the cleanup pipeline
#[instrument(skip(html), fields(url = opts.source_url.as_ref().map(Url::as_str), html_len = html.len()))]
pub fn convert(html: &str, opts: &ConvertOptions) -> Result<ConvertResult> {
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);

    let content_html = select_content(&doc, opts.main_content_only);
    let content_html = tables_to_markdown(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .options(htmd::options::Options {
            heading_style: htmd::options::HeadingStyle::Atx,
            code_block_style: htmd::options::CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| AgencyError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    let markdown = cleanup::run_pipeline(&raw_markdown, opts.source_url.as_ref());

    Ok(ConvertResult { markdown, title })
}

/// Inner HTML of the element that should be converted.
fn select_content(doc: &Html, main_content_only: bool) -> String {
    if main_content_only {
        for css in MAIN_CONTENT_SELECTORS {
            let sel = selector(css);
            if let Some(el) = doc.select(&sel).next() {
                debug!(selector = css, "using main content container");
                return el.inner_html();
            }
        }
    }

    match doc.select(&BODY).next() {
        Some(body) => body.inner_html(),
        None => doc.root_element().inner_html(),
    }
}

fn extract_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Replace each `<table>` with Markdown table syntax before `htmd` runs.
///
/// `htmd` 0.1 flattens tables into loose text.
fn tables_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let tables: Vec<ElementRef> = fragment.select(&TABLE).collect();
    if tables.is_empty() {
        return html.to_string();
    }

    // Re-serialize so the table markup below matches byte for byte.
    let mut result = fragment.root_element().inner_html();
    for table in tables {
        result = result.replacen(&table.html(), &table_markdown(&table), 1);
    }
    result
}

fn table_markdown(table: &ElementRef) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut has_header = false;

    for tr in table.select(&ROW) {
        let headers = cell_texts(&tr, &HEADER_CELL);
        if !headers.is_empty() {
            has_header = rows.is_empty();
            rows.push(headers);
            continue;
        }
        let cells = cell_texts(&tr, &DATA_CELL);
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }
    for row in &mut rows {
        row.resize(columns, String::new());
    }

    let mut md = String::from("\n\n");
    let header: Vec<String> = if has_header {
        rows.remove(0)
    } else {
        vec![String::new(); columns]
    };
    push_row(&mut md, &header);
    push_row(&mut md, &vec!["---".to_string(); columns]);
    for row in &rows {
        push_row(&mut md, row);
    }
    md.push('\n');
    md
}

fn cell_texts(row: &ElementRef, cells: &Selector) -> Vec<String> {
    row.select(cells)
        .map(|cell| {
            cell.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .replace('|', "\\|")
        })
        .collect()
}

fn push_row(md: &mut String, cells: &[String]) {
    md.push_str("| ");
    md.push_str(&cells.join(" | "));
    md.push_str(" |\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(url: &str) -> ConvertOptions {
        ConvertOptions {
            source_url: Some(Url::parse(url).unwrap()),
            main_content_only: false,
        }
    }

    #[test]
    fn convert_simple_page() {
        let html = "<html><head><title>Hello</title></head><body><h1>Hello World</h1><p>Some text.</p></body></html>";
        let result = convert(html, &opts("https://example.com/page")).unwrap();

        assert!(result.markdown.contains("# Hello World"));
        assert!(result.markdown.contains("Some text."));
        assert_eq!(result.title.as_deref(), Some("Hello"));
        assert!(result.markdown.ends_with('\n'));
    }

    #[test]
    fn convert_skips_scripts_and_styles() {
        let html = r#"<html><body>
            <script>window.analytics = true;</script>
            <style>p { color: red; }</style>
            <p>Visible text.</p>
        </body></html>"#;

        let result = convert(html, &opts("https://example.com/")).unwrap();
        assert!(result.markdown.contains("Visible text."));
        assert!(!result.markdown.contains("analytics"));
        assert!(!result.markdown.contains("color: red"));
    }

    #[test]
    fn convert_keeps_whole_body_by_default() {
        let html = r#"<html><body>
            <header><p>Site banner</p></header>
            <main><p>Main text.</p></main>
        </body></html>"#;

        let result = convert(html, &opts("https://example.com/")).unwrap();
        assert!(result.markdown.contains("Site banner"));
        assert!(result.markdown.contains("Main text."));
    }

    #[test]
    fn convert_main_content_only() {
        let html = r#"<html><body>
            <header><p>Site banner</p></header>
            <main><p>Main text.</p></main>
            <footer><p>Copyright 2024</p></footer>
        </body></html>"#;

        let result = convert(
            html,
            &ConvertOptions {
                source_url: None,
                main_content_only: true,
            },
        )
        .unwrap();
        assert!(result.markdown.contains("Main text."));
        assert!(!result.markdown.contains("Site banner"));
        assert!(!result.markdown.contains("Copyright 2024"));
    }

    #[test]
    fn convert_preserves_code_blocks() {
        let html = r#"<html><body>
            <pre><code class="language-rust">fn main() {
    println!("hello");
}</code></pre>
        </body></html>"#;

        let result = convert(html, &opts("https://example.com/code")).unwrap();
        assert!(result.markdown.contains("```rust"));
        assert!(result.markdown.contains("println!"));
    }

    #[test]
    fn convert_preserves_tables() {
        let html = r#"<html><body>
            <table>
                <thead><tr><th>Name</th><th>Value</th></tr></thead>
                <tbody>
                    <tr><td>foo</td><td>bar</td></tr>
                    <tr><td>baz</td><td>qux</td></tr>
                </tbody>
            </table>
        </body></html>"#;

        let result = convert(html, &opts("https://example.com/data")).unwrap();
        assert!(result.markdown.contains("| Name | Value |"));
        assert!(result.markdown.contains("| --- | --- |"));
        assert!(result.markdown.contains("| foo | bar |"));
    }

    #[test]
    fn convert_resolves_relative_links() {
        let html = r#"<html><body><p><a href="/api/reference">Reference</a></p></body></html>"#;
        let result = convert(html, &opts("https://docs.example.com/guide/intro")).unwrap();
        assert!(
            result
                .markdown
                .contains("[Reference](https://docs.example.com/api/reference)")
        );
    }

    #[test]
    fn convert_empty_body() {
        let result = convert("<html><body></body></html>", &opts("https://example.com/")).unwrap();
        assert_eq!(result.title, None);
        assert_eq!(result.markdown.trim(), "");
    }

    #[test]
    fn table_without_header_gets_blank_header_row() {
        let html = "<table><tr><td>a</td><td>b</td></tr></table>";
        let md = tables_to_markdown(html);
        assert!(md.contains("|  |  |"));
        assert!(md.contains("| a | b |"));
    }
}
