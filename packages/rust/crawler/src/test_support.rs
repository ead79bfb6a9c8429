//! Scripted in-memory sessions for worker and engine tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use reviewscout_shared::{AppConfig, CrawlConfig, Result, ScoutError, WaitPolicy};

use crate::session::{SessionDriver, SessionFactory};

/// Canned behavior shared by every session a [`ScriptedFactory`] opens.
#[derive(Debug, Clone)]
pub(crate) struct SessionScript {
    pub total_pages: u32,
    pub listing_html: String,
    pub review_html: String,
    /// Successful "more reviews" clicks before the control disappears.
    pub more_clicks: u32,
    pub fail_open_search: bool,
    /// Fail the pagination click for this page number.
    pub fail_goto_page: Option<u32>,
    /// Fail opening the review panel for this listing index.
    pub fail_panel_for: Option<usize>,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self {
            total_pages: 1,
            listing_html: listing_page(&["고향집", "크레이지파스타"]),
            review_html: review_panel(&["면이 쫄깃해요"]),
            more_clicks: 0,
            fail_open_search: false,
            fail_goto_page: None,
            fail_panel_for: None,
        }
    }
}

/// Shared observation points for assertions.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub opened: AtomicUsize,
    pub quit: AtomicUsize,
    pub panels_opened: AtomicUsize,
    pub panels_closed: AtomicUsize,
    pub expand_clicks: AtomicUsize,
}

impl SessionCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn quit(&self) -> usize {
        self.quit.load(Ordering::SeqCst)
    }
    pub fn panels_opened(&self) -> usize {
        self.panels_opened.load(Ordering::SeqCst)
    }
    pub fn panels_closed(&self) -> usize {
        self.panels_closed.load(Ordering::SeqCst)
    }
    pub fn expand_clicks(&self) -> usize {
        self.expand_clicks.load(Ordering::SeqCst)
    }
}

pub(crate) struct ScriptedFactory {
    pub script: SessionScript,
    pub counters: Arc<SessionCounters>,
}

impl ScriptedFactory {
    pub fn new(script: SessionScript) -> Self {
        Self {
            script,
            counters: Arc::new(SessionCounters::default()),
        }
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn SessionDriver>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            counters: Arc::clone(&self.counters),
            panel_open: false,
            expands_done: 0,
        }))
    }
}

pub(crate) struct ScriptedSession {
    script: SessionScript,
    counters: Arc<SessionCounters>,
    panel_open: bool,
    expands_done: u32,
}

#[async_trait]
impl SessionDriver for ScriptedSession {
    async fn open_search(&mut self, _query: &str) -> Result<()> {
        if self.script.fail_open_search {
            return Err(ScoutError::session("scripted search failure"));
        }
        Ok(())
    }

    async fn total_pages(&mut self) -> Result<u32> {
        Ok(self.script.total_pages)
    }

    async fn goto_page(&mut self, page: u32) -> Result<()> {
        if self.script.fail_goto_page == Some(page) {
            return Err(ScoutError::session(format!(
                "scripted pagination failure on page {page}"
            )));
        }
        Ok(())
    }

    async fn page_html(&mut self) -> Result<String> {
        if self.panel_open {
            Ok(self.script.review_html.clone())
        } else {
            Ok(self.script.listing_html.clone())
        }
    }

    async fn open_review_panel(&mut self, listing_index: usize) -> Result<()> {
        if self.script.fail_panel_for == Some(listing_index) {
            return Err(ScoutError::session(format!(
                "scripted panel failure for listing {listing_index}"
            )));
        }
        self.counters.panels_opened.fetch_add(1, Ordering::SeqCst);
        self.panel_open = true;
        // The expander is a fresh control in every panel.
        self.expands_done = 0;
        Ok(())
    }

    async fn expand_reviews(&mut self) -> Result<bool> {
        if self.expands_done < self.script.more_clicks {
            self.expands_done += 1;
            self.counters.expand_clicks.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn close_review_panel(&mut self) -> Result<()> {
        if self.panel_open {
            self.counters.panels_closed.fetch_add(1, Ordering::SeqCst);
            self.panel_open = false;
        }
        Ok(())
    }

    async fn quit(self: Box<Self>) -> Result<()> {
        self.counters.quit.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A listing page with one complete PlaceItem per name.
pub(crate) fn listing_page(names: &[&str]) -> String {
    let items: String = names
        .iter()
        .map(|name| {
            format!(
                r##"
  <li class="PlaceItem">
    <div class="head_item"><strong class="tit_name"><a class="link_name" href="#">{name}</a></strong></div>
    <div class="rating"><span class="score"><em>4.0</em></span></div>
    <div class="info_item"><div class="addr"><p>서울 성동구 성수동 1-2</p></div></div>
  </li>"##
            )
        })
        .collect();
    format!(r#"<html><body><ul class="placelist">{items}</ul></body></html>"#)
}

/// A review panel with one complete entry per comment.
pub(crate) fn review_panel(comments: &[&str]) -> String {
    let items: String = comments
        .iter()
        .map(|comment| {
            format!(
                r##"
  <li>
    <a href="#"><div><div><span>닉네임</span><span>Lv.2</span></div></div></a>
    <div><span>후기</span><span>작성</span><span>4</span><span>평점</span><span>4.0</span></div>
    <div><span class="ico_star inner_star" style="width:80%"></span></div>
    <p class="txt_comment"><span>{comment}</span></p>
  </li>"##
            )
        })
        .collect();
    format!(r#"<html><body><ul class="list_evaluation">{items}</ul></body></html>"#)
}

/// Default runtime config with test-friendly delays.
pub(crate) fn test_config() -> CrawlConfig {
    let mut config = CrawlConfig::from(&AppConfig::default());
    config.wait = WaitPolicy {
        attempts: 2,
        delay: Duration::from_millis(1),
    };
    config.page_settle = Duration::from_millis(1);
    config.listing_settle = Duration::from_millis(1);
    config.panel_settle = Duration::from_millis(1);
    config.expand_delay = Duration::from_millis(1);
    config
}
