use super::discovery::discover_ws_endpoint;
use super::error::BrowserError;
use super::script;
use super::session::{
    BrowserLauncher, BrowserSession, Candidate, ElementHandle, PageId, PageSnapshot, UiContext,
};
use crate::core::{BrowserSource, CrawlConfig, ScraperError, ScraperResult};
use crate::locator::SelectionRule;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

const BLANK_PAGE: &str = "about:blank";

/// A Chrome/Chromium session driven over the DevTools protocol.
pub struct ChromiumSession {
    browser: Browser,
    pages: Mutex<Vec<Page>>,
    foreign_targets: Vec<TargetId>,
    handler_task: JoinHandle<()>,
    owns_process: bool,
    closed: bool,
}

impl ChromiumSession {
    pub async fn launch(config: &CrawlConfig) -> ScraperResult<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(config.timeouts.request)
            .args(config.launch_args.clone());

        if let BrowserSource::Launch {
            executable: Some(path),
        } = &config.browser
        {
            builder = builder.chrome_executable(path);
        }
        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;
        info!(
            "Launching browser (headless={}, args={:?})",
            config.headless, config.launch_args
        );
        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(BrowserError::from)?;

        Self::from_parts(browser, handler, true).await
    }

    pub async fn connect(ws_endpoint: &str) -> ScraperResult<Self> {
        info!("Attaching to running browser at {}", ws_endpoint);
        let (browser, handler) = Browser::connect(ws_endpoint.to_string())
            .await
            .map_err(BrowserError::from)?;

        Self::from_parts(browser, handler, false).await
    }

    async fn from_parts(browser: Browser, handler: Handler, owns_process: bool) -> ScraperResult<Self> {
        let handler_task = spawn_handler_task(handler);
        let page = browser
            .new_page(BLANK_PAGE)
            .await
            .map_err(BrowserError::from)?;

        // Tabs that existed before this run are never treated as ours.
        let foreign_targets = browser
            .pages()
            .await
            .map_err(BrowserError::from)?
            .into_iter()
            .map(|p| p.target_id().clone())
            .filter(|id| id != page.target_id())
            .collect();

        Ok(Self {
            browser,
            pages: Mutex::new(vec![page]),
            foreign_targets,
            handler_task,
            owns_process,
            closed: false,
        })
    }

    fn page(&self, id: PageId) -> ScraperResult<Page> {
        if self.closed {
            return Err(BrowserError::Closed.into());
        }
        self.pages
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| BrowserError::PageNotFound(id).into())
    }

    async fn eval<T: DeserializeOwned>(&self, page: PageId, js: String) -> ScraperResult<T> {
        let page = self.page(page)?;
        let params = EvaluateParams::builder()
            .expression(js)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Script)?;

        let result = page
            .evaluate_expression(params)
            .await
            .map_err(BrowserError::from)?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()).into())
    }

    async fn run_action(&self, element: &ElementHandle, js: String) -> ScraperResult<()> {
        let status: String = self.eval(element.page, js).await?;
        match status.as_str() {
            "ok" => Ok(()),
            "detached" => Err(BrowserError::ElementDetached(element.token.clone()).into()),
            other => Err(BrowserError::Script(format!("{} on {}", other, element.token)).into()),
        }
    }

    async fn eval_prefixed(&self, element: &ElementHandle, js: String, prefix: &str) -> ScraperResult<String> {
        let raw: String = self.eval(element.page, js).await?;
        match raw.strip_prefix(prefix) {
            Some(rest) => Ok(rest.to_string()),
            None => Err(BrowserError::ElementDetached(element.token.clone()).into()),
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close; aborting handler task");
            self.handler_task.abort();
        }
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("chromiumoxide handler event error: {}", e);
            }
        }
        debug!("chromiumoxide handler stream ended");
    })
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &Url, nav_timeout: Duration) -> ScraperResult<()> {
        let page = self.page(0)?;
        info!("Navigating to {}", url);
        match timeout(nav_timeout, page.goto(url.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::from(e).into()),
            Err(_) => Err(ScraperError::timeout(nav_timeout, format!("navigation to {}", url))),
        }
    }

    async fn wait_for_network_idle(&self, idle_timeout: Duration) -> ScraperResult<bool> {
        // The script bounds itself; the outer timeout only guards a hung evaluation.
        let guard = idle_timeout + Duration::from_secs(5);
        match timeout(guard, self.eval::<bool>(0, script::network_idle(idle_timeout))).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }

    async fn scroll_to_end(&self, page: PageId) -> ScraperResult<()> {
        let _: bool = self.eval(page, script::SCROLL_TO_END.to_string()).await?;
        Ok(())
    }

    async fn page_count(&self) -> ScraperResult<usize> {
        let all = self.browser.pages().await.map_err(BrowserError::from)?;
        let mut known = self.pages.lock();
        for page in all {
            let id = page.target_id();
            if self.foreign_targets.contains(id) || known.iter().any(|p| p.target_id() == id) {
                continue;
            }
            debug!("New page discovered: {:?}", id);
            known.push(page);
        }
        Ok(known.len())
    }

    async fn query(&self, ctx: &UiContext, rule: &SelectionRule) -> ScraperResult<Vec<Candidate>> {
        trace!("query page={} scope={:?} rule={}", ctx.page, ctx.scope, rule);
        self.eval(ctx.page, script::query(ctx.page, &ctx.scope, rule))
            .await
    }

    async fn click(&self, element: &ElementHandle) -> ScraperResult<()> {
        self.run_action(element, script::click(&element.token)).await
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.run_action(element, script::focus_and_clear(&element.token))
            .await?;
        let page = self.page(element.page)?;
        page.execute(InsertTextParams::new(value))
            .await
            .map_err(BrowserError::from)?;
        self.run_action(element, script::commit_input(&element.token))
            .await
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.run_action(element, script::select_option(&element.token, value))
            .await
    }

    async fn read_value(&self, element: &ElementHandle) -> ScraperResult<String> {
        self.eval_prefixed(element, script::read_value(&element.token), "value:")
            .await
    }

    async fn force_value(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.run_action(element, script::force_value(&element.token, value))
            .await
    }

    async fn force_check(&self, element: &ElementHandle) -> ScraperResult<()> {
        self.run_action(element, script::force_check(&element.token))
            .await
    }

    async fn outer_html(&self, element: &ElementHandle) -> ScraperResult<String> {
        self.eval_prefixed(element, script::outer_html(&element.token), "html:")
            .await
    }

    async fn snapshot(&self, page: PageId) -> ScraperResult<PageSnapshot> {
        let page = self.page(page)?;
        let url = page.url().await.map_err(BrowserError::from)?;
        let title = page.get_title().await.map_err(BrowserError::from)?;
        Ok(PageSnapshot {
            url: url.unwrap_or_default(),
            title: title.unwrap_or_default(),
        })
    }

    async fn close(&mut self) -> ScraperResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = if self.owns_process {
            info!("Closing browser");
            let closed = self
                .browser
                .close()
                .await
                .map(|_| ())
                .map_err(BrowserError::from);
            if let Err(e) = self.browser.wait().await {
                warn!("Failed waiting for browser process to exit: {}", e);
            }
            closed
        } else {
            info!("Closing pages opened in attached browser");
            let pages: Vec<Page> = self.pages.lock().drain(..).collect();
            let mut closed = Ok(());
            for page in pages {
                if let Err(e) = page.close().await {
                    closed = Err(BrowserError::from(e));
                }
            }
            closed
        };

        self.handler_task.abort();
        result.map_err(ScraperError::from)
    }
}

#[derive(Clone, Default)]
pub struct ChromiumLauncher {
    client: reqwest::Client,
}

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, config: &CrawlConfig) -> ScraperResult<Box<dyn BrowserSession>> {
        let session = match &config.browser {
            BrowserSource::Launch { .. } => ChromiumSession::launch(config).await?,
            BrowserSource::Connect { endpoint } => {
                let ws = discover_ws_endpoint(&self.client, endpoint).await?;
                ChromiumSession::connect(&ws).await?
            }
        };
        Ok(Box::new(session))
    }
}
