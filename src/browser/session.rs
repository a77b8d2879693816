use crate::core::{CrawlConfig, ScraperResult};
use crate::locator::SelectionRule;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Index of a page (tab) in the order the session discovered it. The page the
/// run started on is always `0`.
pub type PageId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub page: PageId,
    pub token: String,
}

impl ElementHandle {
    pub fn new(page: PageId, token: impl Into<String>) -> Self {
        Self {
            page,
            token: token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Document,
    Within(ElementHandle),
    Frame(ElementHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextKind {
    Document,
    Overlay,
    Region,
    Frame,
    NewTab,
}

/// Where the UI currently lives: which page, and which part of it queries
/// are scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiContext {
    pub page: PageId,
    pub scope: Scope,
    pub kind: ContextKind,
}

impl UiContext {
    pub fn document(page: PageId) -> Self {
        Self {
            page,
            scope: Scope::Document,
            kind: ContextKind::Document,
        }
    }

    pub fn new_tab(page: PageId) -> Self {
        Self {
            page,
            scope: Scope::Document,
            kind: ContextKind::NewTab,
        }
    }

    pub fn within(element: ElementHandle, kind: ContextKind) -> Self {
        Self {
            page: element.page,
            scope: Scope::Within(element),
            kind,
        }
    }

    pub fn frame(element: ElementHandle) -> Self {
        Self {
            page: element.page,
            scope: Scope::Frame(element),
            kind: ContextKind::Frame,
        }
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::document(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub element: ElementHandle,
    pub visible: bool,
    pub disabled: bool,
}

impl Candidate {
    pub fn is_interactable(&self) -> bool {
        self.visible && !self.disabled
    }
}

/// Last known page state, attached to aborted runs for diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
}

/// One exclusively owned browser process (or attached browser) and its pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &Url, timeout: Duration) -> ScraperResult<()>;
    /// `Ok(false)` when the wait ran out before the network went quiet.
    async fn wait_for_network_idle(&self, timeout: Duration) -> ScraperResult<bool>;
    async fn scroll_to_end(&self, page: PageId) -> ScraperResult<()>;
    async fn page_count(&self) -> ScraperResult<usize>;
    async fn query(&self, ctx: &UiContext, rule: &SelectionRule) -> ScraperResult<Vec<Candidate>>;
    async fn click(&self, element: &ElementHandle) -> ScraperResult<()>;
    async fn fill(&self, element: &ElementHandle, value: &str) -> ScraperResult<()>;
    async fn select_option(&self, element: &ElementHandle, value: &str) -> ScraperResult<()>;
    async fn read_value(&self, element: &ElementHandle) -> ScraperResult<String>;
    /// Writes the value straight into the DOM and fires input/change events.
    async fn force_value(&self, element: &ElementHandle, value: &str) -> ScraperResult<()>;
    async fn force_check(&self, element: &ElementHandle) -> ScraperResult<()>;
    async fn outer_html(&self, element: &ElementHandle) -> ScraperResult<String>;
    async fn snapshot(&self, page: PageId) -> ScraperResult<PageSnapshot>;
    /// Releases the browser. Calling it again is a no-op.
    async fn close(&mut self) -> ScraperResult<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &CrawlConfig) -> ScraperResult<Box<dyn BrowserSession>>;
}
