//! Shared headless-browser page source.
//!
//! One Chromium process serves every fetch made through a [`BrowserSession`].
//! It is launched on the first fetch, reused while its connection is alive,
//! and relaunched on the next fetch once the connection has dropped. Each
//! fetch opens its own tab and closes it again, whether or not the fetch
//! succeeded. Shutting the browser down is up to the session's owner
//! ([`BrowserSession::shutdown`]).
//!
//! A fetch waits for `DOMContentLoaded`, not for the full `load` event or
//! network idle, and then reads the DOM as it stands.

use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use agency_shared::{AgencyError, Result};

use crate::page::PageSource;

/// Launch settings for the shared browser.
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Chrome/Chromium binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Pass `--no-sandbox` (needed in most containers).
    pub no_sandbox: bool,
}

/// A launched browser and the task pumping its CDP connection.
struct LiveBrowser {
    browser: Browser,
    connection: JoinHandle<()>,
}

/// A launched handle that can tell whether it is still usable.
trait Connected {
    fn is_connected(&self) -> bool;
}

impl Connected for LiveBrowser {
    /// The connection task ends when the browser goes away.
    fn is_connected(&self) -> bool {
        !self.connection.is_finished()
    }
}

/// Return the handle in `slot`, launching one first if the slot is empty or
/// its handle has disconnected. A failed launch leaves `slot` untouched.
async fn ensure_connected<'a, T, F, Fut>(slot: &'a mut Option<T>, launch: F) -> Result<&'a T>
where
    T: Connected,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if !slot.as_ref().is_some_and(T::is_connected) {
        if slot.is_some() {
            warn!("browser disconnected, relaunching");
        }
        *slot = Some(launch().await?);
    }
    slot.as_ref()
        .ok_or_else(|| AgencyError::Fetch("browser unavailable".into()))
}

/// Lazily launched, shared headless browser.
///
/// The mutex serializes launch and relaunch, so concurrent first fetches
/// never start two browsers.
pub struct BrowserSession {
    options: BrowserOptions,
    live: Mutex<Option<LiveBrowser>>,
}

impl BrowserSession {
    /// Create a session. Nothing is launched until the first fetch.
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            live: Mutex::new(None),
        }
    }

    /// Whether a browser is currently launched and connected.
    pub async fn is_connected(&self) -> bool {
        self.live
            .lock()
            .await
            .as_ref()
            .is_some_and(Connected::is_connected)
    }

    /// Close the browser, if one is running.
    pub async fn shutdown(&self) {
        let Some(mut current) = self.live.lock().await.take() else {
            return;
        };
        if let Err(e) = current.browser.close().await {
            warn!(error = %e, "failed to close browser");
        }
        current.connection.abort();
        info!("browser closed");
    }

    async fn launch(&self) -> Result<LiveBrowser> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if self.options.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder
            .build()
            .map_err(|e| AgencyError::Fetch(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AgencyError::Fetch(format!("failed to launch browser: {e}")))?;

        let connection = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser connection ended");
                    break;
                }
            }
        });

        info!(
            executable = ?self.options.chrome_executable,
            "browser launched"
        );
        Ok(LiveBrowser {
            browser,
            connection,
        })
    }

    /// Open a blank tab, launching or relaunching the browser first if needed.
    async fn open_page(&self) -> Result<Page> {
        let mut live = self.live.lock().await;
        let current = ensure_connected(&mut *live, || self.launch()).await?;
        current
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AgencyError::Fetch(format!("failed to open page: {e}")))
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let page = self.open_page().await?;
        let html = read_page(&page, url).await;

        if let Err(e) = page.close().await {
            warn!(error = %e, "failed to close page");
        }

        let html = html?;
        debug!(bytes = html.len(), "page rendered");
        Ok(html)
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

/// Navigate `page` to `url`, wait for `DOMContentLoaded`, and read back
/// the document.
async fn read_page(page: &Page, url: &Url) -> Result<String> {
    // Subscribe before navigating so the event cannot be missed.
    let mut dom_ready = page
        .event_listener::<EventDomContentEventFired>()
        .await
        .map_err(|e| AgencyError::Fetch(format!("{url}: failed to watch page events: {e}")))?;

    let navigation = page
        .execute(NavigateParams::new(url.as_str()))
        .await
        .map_err(|e| AgencyError::Fetch(format!("{url}: navigation failed: {e}")))?;
    if let Some(reason) = &navigation.result.error_text {
        return Err(AgencyError::Fetch(format!("{url}: navigation failed: {reason}")));
    }

    if dom_ready.next().await.is_none() {
        return Err(AgencyError::Fetch(format!("{url}: navigation did not complete")));
    }

    page.content()
        .await
        .map_err(|e| AgencyError::Fetch(format!("{url}: failed to read page: {e}")))
}
