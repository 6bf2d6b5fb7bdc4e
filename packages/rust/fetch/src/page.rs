//! The page-fetch contract and URL-to-text conversion.

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use agency_markdown::ConvertOptions;
use agency_shared::Result;

/// Something that can produce the HTML of a web page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return the page's HTML.
    async fn fetch_html(&self, url: &Url) -> Result<String>;

    /// Short name for tracing.
    fn name(&self) -> &'static str;
}

/// Fetch `url` through `source` and convert the page to Markdown.
///
/// `main_content_only` narrows conversion to the page's main content
/// container when one exists.
#[instrument(skip(source), fields(page_source = source.name()))]
pub async fn fetch_url(
    source: &dyn PageSource,
    url: &Url,
    main_content_only: bool,
) -> Result<String> {
    let html = source.fetch_html(url).await?;

    let converted = agency_markdown::convert(
        &html,
        &ConvertOptions {
            source_url: Some(url.clone()),
            main_content_only,
        },
    )?;

    debug!(
        title = converted.title.as_deref().unwrap_or(""),
        html_len = html.len(),
        markdown_len = converted.markdown.len(),
        "page converted"
    );

    Ok(converted.markdown)
}
