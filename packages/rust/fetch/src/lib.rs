//! Turning context tokens into text.
//!
//! This crate provides:
//! - [`classify`]: decides whether a token names files, a URL, or neither
//! - [`fetch_file`]: expands a glob and concatenates the matched files
//! - [`PageSource`]: the page-fetch contract, with a shared headless
//!   browser ([`BrowserSession`]) and a plain HTTP client ([`HttpPageSource`])
//! - [`fetch_url`]: fetches a page and converts it to Markdown

mod browser;
mod classify;
mod files;
mod http;
mod page;

pub use browser::{BrowserOptions, BrowserSession};
pub use classify::classify;
pub use files::fetch_file;
pub use http::HttpPageSource;
pub use page::{PageSource, fetch_url};

/// User-Agent string for page requests.
pub(crate) const USER_AGENT: &str = concat!("Agency/", env!("CARGO_PKG_VERSION"));
