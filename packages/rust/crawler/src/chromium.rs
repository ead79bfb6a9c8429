//! chromiumoxide-backed [`SessionDriver`] for map.kakao.com.
//!
//! Each session owns one headless Chromium process; the CDP handler stream
//! is driven by a spawned task for the session's lifetime. All site coupling
//! (selectors, the review-panel host) lives here and in [`crate::extract`].

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use reviewscout_shared::{CrawlConfig, Result, ScoutError, WaitPolicy};

use crate::session::{SessionDriver, SessionFactory};

/// Search box on the map landing page.
const SEARCH_INPUT: &str = r"#search\.keyword\.query";

/// Submit button next to the search box.
const SEARCH_SUBMIT: &str = r"#search\.keyword\.submit";

/// "Places" tab above the search results.
const PLACE_TAB: &str = r"#info\.main\.options > li:nth-of-type(2) > a";

/// Pagination links, including hidden placeholders.
const PAGE_LINKS: &str = r"#info\.search\.page div.pageWrap > a";

/// Host serving per-place detail pages; review panels open there.
const PANEL_HOST: &str = "place.map.kakao.com";

/// The no-results notice stays in the DOM; visibility is the signal.
const NO_RESULTS_VISIBLE_JS: &str = r#"(() => {
  const el = document.querySelector('#info\\.noPlace');
  return !!el && el.offsetParent !== null;
})()"#;

/// Hide the dimmed overlay that intercepts clicks after a search.
const HIDE_DIMMED_JS: &str = r#"(() => {
  const el = document.getElementById('dimmedLayer');
  if (el) { el.style.display = 'none'; }
  return true;
})()"#;

/// Click the "more reviews" expander; false when the control is gone.
const EXPAND_REVIEWS_JS: &str = r#"(() => {
  const more = Array.from(document.querySelectorAll('span'))
    .find((el) => el.textContent.includes('후기 더보기'));
  if (!more) { return false; }
  more.click();
  return true;
})()"#;

/// Chromium launch flags for a stable headless crawl profile.
const LAUNCH_ARGS: [&str; 6] = [
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-infobars",
    "--disable-blink-features=AutomationControlled",
    "--blink-settings=imagesEnabled=false",
];

/// How long to wait for the CDP handler task after closing the browser.
const HANDLER_SHUTDOWN: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// ChromiumFactory
// ---------------------------------------------------------------------------

/// Launches one headless Chromium per session.
pub struct ChromiumFactory {
    config: CrawlConfig,
}

impl ChromiumFactory {
    pub fn new(config: CrawlConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self) -> Result<Box<dyn SessionDriver>> {
        let session = ChromiumSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

// ---------------------------------------------------------------------------
// ChromiumSession
// ---------------------------------------------------------------------------

/// A live browser session. The listing page is the primary context; an open
/// review panel temporarily becomes the current one.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    panel: Option<Page>,
    search_url: String,
    wait: WaitPolicy,
    page_settle: Duration,
    panel_settle: Duration,
}

impl ChromiumSession {
    async fn launch(config: &CrawlConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .args(LAUNCH_ARGS)
            .build()
            .map_err(ScoutError::Session)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScoutError::session(format!("browser launch failed: {e}")))?;

        // The handler must be polled for the duration of the session or CDP
        // commands never resolve.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScoutError::session(format!("page open failed: {e}")))?;

        Ok(Self {
            browser,
            handler: handler_task,
            page,
            panel: None,
            search_url: config.search_url.clone(),
            wait: config.wait,
            page_settle: config.page_settle,
            panel_settle: config.panel_settle,
        })
    }

    /// The context lookups run against: the review panel while one is open,
    /// the listing page otherwise.
    fn current(&self) -> &Page {
        self.panel.as_ref().unwrap_or(&self.page)
    }

    /// Wait for `selector` on the current context under the bounded policy.
    async fn wait_for(&self, selector: &str) -> Result<Element> {
        for _ in 0..self.wait.attempts {
            if let Ok(el) = self.current().find_element(selector).await {
                return Ok(el);
            }
            tokio::time::sleep(self.wait.delay).await;
        }
        Err(ScoutError::session(format!(
            "timed out waiting for `{selector}`"
        )))
    }

    /// Wait until `selector` matches at least one element.
    async fn wait_for_all(&self, selector: &str) -> Result<Vec<Element>> {
        for _ in 0..self.wait.attempts {
            if let Ok(els) = self.current().find_elements(selector).await {
                if !els.is_empty() {
                    return Ok(els);
                }
            }
            tokio::time::sleep(self.wait.delay).await;
        }
        Err(ScoutError::session(format!(
            "timed out waiting for `{selector}`"
        )))
    }

    /// Evaluate a boolean-returning expression on the current context.
    async fn eval_bool(&self, js: &str) -> Result<bool> {
        let result = self
            .current()
            .evaluate_expression(js)
            .await
            .map_err(|e| ScoutError::session(format!("script evaluation failed: {e}")))?;
        result
            .into_value::<bool>()
            .map_err(|e| ScoutError::session(format!("unexpected script result: {e}")))
    }

    /// Find the freshly opened place-detail tab by its host.
    async fn adopt_panel(&self, listing_index: usize) -> Result<Page> {
        for _ in 0..self.wait.attempts {
            let pages = self
                .browser
                .pages()
                .await
                .map_err(|e| ScoutError::session(format!("page enumeration failed: {e}")))?;
            for page in pages {
                if let Ok(Some(url)) = page.url().await {
                    let is_panel =
                        Url::parse(&url).is_ok_and(|u| u.host_str() == Some(PANEL_HOST));
                    if is_panel {
                        return Ok(page);
                    }
                }
            }
            tokio::time::sleep(self.wait.delay).await;
        }
        Err(ScoutError::session(format!(
            "review panel for listing {listing_index} did not open"
        )))
    }
}

#[async_trait]
impl SessionDriver for ChromiumSession {
    async fn open_search(&mut self, query: &str) -> Result<()> {
        self.page
            .goto(self.search_url.clone())
            .await
            .map_err(|e| ScoutError::session(format!("navigation to search page failed: {e}")))?;

        let input = self.wait_for(SEARCH_INPUT).await?;
        input
            .click()
            .await
            .map_err(|e| ScoutError::session(format!("search input click failed: {e}")))?;
        input
            .type_str(query)
            .await
            .map_err(|e| ScoutError::session(format!("search input typing failed: {e}")))?;

        let submit = self.wait_for(SEARCH_SUBMIT).await?;
        submit
            .press_key("Enter")
            .await
            .map_err(|e| ScoutError::session(format!("search submit failed: {e}")))?;

        // The place tab renders behind a dimmed overlay; hide it first.
        self.wait_for(PLACE_TAB).await?;
        self.eval_bool(HIDE_DIMMED_JS).await?;
        let tab = self.wait_for(PLACE_TAB).await?;
        tab.click()
            .await
            .map_err(|e| ScoutError::session(format!("place tab click failed: {e}")))?;

        debug!(query, "search submitted");
        Ok(())
    }

    async fn total_pages(&mut self) -> Result<u32> {
        match self.eval_bool(NO_RESULTS_VISIBLE_JS).await {
            Ok(true) => return Ok(0),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "no-results probe failed, counting page links"),
        }

        let links = self.wait_for_all(PAGE_LINKS).await?;
        let mut pages = 0;
        for link in links {
            let class = link
                .attribute("class")
                .await
                .map_err(|e| ScoutError::session(format!("page link read failed: {e}")))?
                .unwrap_or_default();
            if !class.contains("HIDDEN") {
                pages += 1;
            }
        }
        Ok(pages)
    }

    async fn goto_page(&mut self, page: u32) -> Result<()> {
        let selector = format!(r"#info\.search\.page div.pageWrap > a:nth-of-type({page})");
        let link = self.wait_for(&selector).await?;
        link.click()
            .await
            .map_err(|e| ScoutError::session(format!("pagination click failed: {e}")))?;
        tokio::time::sleep(self.page_settle).await;
        Ok(())
    }

    async fn page_html(&mut self) -> Result<String> {
        self.current()
            .content()
            .await
            .map_err(|e| ScoutError::session(format!("page content read failed: {e}")))
    }

    async fn open_review_panel(&mut self, listing_index: usize) -> Result<()> {
        let selector = format!(
            r"#info\.search\.place\.list > li:nth-of-type({n}) > div:nth-of-type(5) > div:nth-of-type(4) > a:nth-of-type(1)",
            n = listing_index + 1
        );
        let link = self.wait_for(&selector).await?;
        link.click()
            .await
            .map_err(|e| ScoutError::session(format!("review link click failed: {e}")))?;

        let panel = self.adopt_panel(listing_index).await?;
        tokio::time::sleep(self.panel_settle).await;
        self.panel = Some(panel);
        Ok(())
    }

    async fn expand_reviews(&mut self) -> Result<bool> {
        self.eval_bool(EXPAND_REVIEWS_JS).await
    }

    async fn close_review_panel(&mut self) -> Result<()> {
        if let Some(panel) = self.panel.take() {
            if let Err(e) = panel.close().await {
                debug!(error = %e, "review panel close failed");
            }
        }
        self.wait_for("body").await?;
        Ok(())
    }

    async fn quit(mut self: Box<Self>) -> Result<()> {
        if let Some(panel) = self.panel.take() {
            let _ = panel.close().await;
        }
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        if tokio::time::timeout(HANDLER_SHUTDOWN, &mut self.handler)
            .await
            .is_err()
        {
            self.handler.abort();
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Normal teardown happens in quit(); this covers sessions dropped on
        // a panic path. The browser process itself is killed by its own Drop.
        self.handler.abort();
    }
}
