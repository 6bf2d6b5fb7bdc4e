//! Context assembly: input tokens in, one context string out.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use agency_fetch::{PageSource, classify, fetch_file, fetch_url};
use agency_shared::{AgencyError, InputKind, Result};

/// Resolves input tokens into a single context string.
///
/// URL tokens are fetched through the injected [`PageSource`]; file tokens
/// are read from disk.
pub struct ContextAssembler {
    source: Arc<dyn PageSource>,
    main_content_only: bool,
}

impl ContextAssembler {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            main_content_only: false,
        }
    }

    /// Convert only each page's main content container.
    pub fn main_content_only(mut self, enabled: bool) -> Self {
        self.main_content_only = enabled;
        self
    }

    /// Assemble `tokens` in order.
    ///
    /// Each file or URL token contributes its text followed by `"\n"`. The
    /// first fetch error aborts the whole call. If any token is a plain
    /// term, everything gathered so far is dropped and the tokens are
    /// returned joined by single spaces.
    #[instrument(skip_all, fields(tokens = tokens.len()))]
    pub async fn assemble(&self, tokens: &[String]) -> Result<String> {
        let mut context = String::new();

        for token in tokens {
            let text = match classify(token) {
                InputKind::Url => {
                    let url = Url::parse(token)
                        .map_err(|e| AgencyError::Fetch(format!("{token}: {e}")))?;
                    fetch_url(self.source.as_ref(), &url, self.main_content_only).await?
                }
                InputKind::File => fetch_file(token)?,
                InputKind::Term => {
                    debug!(token = token.as_str(), "plain term, using the raw input line");
                    return Ok(tokens.join(" "));
                }
            };
            context.push_str(&text);
            context.push('\n');
        }

        info!(bytes = context.len(), "context assembled");
        Ok(context)
    }
}
