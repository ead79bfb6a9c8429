//! Browser session abstraction.
//!
//! [`SessionDriver`] is the seam between crawl logic and browser automation:
//! page workers drive the trait, [`crate::chromium::ChromiumSession`]
//! implements it against a real headless browser, and tests substitute
//! scripted fakes. [`SessionFactory`] hands each worker its own session; a
//! session is never shared across tasks.

use async_trait::async_trait;

use reviewscout_shared::Result;

/// One exclusive browser session, owned by a single worker for its lifetime.
///
/// The session tracks which browsing context is current: the listing page
/// after [`SessionDriver::open_search`], or a review panel between
/// [`SessionDriver::open_review_panel`] and
/// [`SessionDriver::close_review_panel`].
#[async_trait]
pub trait SessionDriver: Send {
    /// Navigate to the search page, submit `query`, and land on the
    /// place-list results view.
    async fn open_search(&mut self, query: &str) -> Result<()>;

    /// Result page count reported by the pagination control. Zero means the
    /// site answered with its "no results" notice.
    async fn total_pages(&mut self) -> Result<u32>;

    /// Activate the pagination link for `page` (1-based).
    async fn goto_page(&mut self, page: u32) -> Result<()>;

    /// Raw HTML of the current browsing context.
    async fn page_html(&mut self) -> Result<String>;

    /// Open the review panel for the listing at `listing_index` (0-based
    /// document position) and make it the current context.
    async fn open_review_panel(&mut self, listing_index: usize) -> Result<()>;

    /// Click the "more reviews" control once. `Ok(false)` means the control
    /// is absent and expansion is done.
    async fn expand_reviews(&mut self) -> Result<bool>;

    /// Close the review panel, if one is open, and return to the listing
    /// context.
    async fn close_review_panel(&mut self) -> Result<()>;

    /// Tear the session down, releasing the browser. Called exactly once on
    /// every worker exit path.
    async fn quit(self: Box<Self>) -> Result<()>;
}

/// Creates fresh sessions; the injection seam for the crawl engine.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Launch a new isolated session.
    async fn open(&self) -> Result<Box<dyn SessionDriver>>;
}
