use super::retry::RetryConfig;
use super::{ScraperError, ScraperResult};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://shop.g2b.go.kr/";
pub const DEFAULT_QUERY: &str = "컴퓨터";
pub const DEFAULT_DATE_RANGE: &str = "3개월";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_OUTPUT: &str = "g2b_result.csv";

const DEFAULT_LAUNCH_ARGS: [&str; 4] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

#[derive(Debug, Clone, PartialEq)]
pub enum BrowserSource {
    /// Spawn a browser; `None` lets the driver look for a Chrome/Chromium install.
    Launch { executable: Option<PathBuf> },
    /// Attach to an already running browser through its DevTools endpoint.
    Connect { endpoint: Url },
}

impl Default for BrowserSource {
    fn default() -> Self {
        BrowserSource::Launch { executable: None }
    }
}

/// Bounded waits used by the pipeline. Every wait in a run is one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub navigation: Duration,
    pub network_idle: Duration,
    pub request: Duration,
    pub popup: Duration,
    pub popup_close: Duration,
    pub locate: Duration,
    pub context: Duration,
    pub results: Duration,
    pub query: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(60),
            network_idle: Duration::from_secs(15),
            request: Duration::from_secs(30),
            popup: Duration::from_secs(2),
            popup_close: Duration::from_millis(500),
            locate: Duration::from_secs(10),
            context: Duration::from_secs(30),
            results: Duration::from_secs(60),
            query: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Fixed pauses that let the portal's widget framework settle after a DOM
/// mutation. The portal exposes no readiness signal for these moments.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleDelays {
    pub after_load: Duration,
    pub after_popup_close: Duration,
    pub after_scroll: Duration,
    pub after_click: Duration,
    pub after_filter: Duration,
    pub after_search: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_load: Duration::from_secs(1),
            after_popup_close: Duration::from_millis(500),
            after_scroll: Duration::from_secs(2),
            after_click: Duration::from_secs(2),
            after_filter: Duration::from_secs(1),
            after_search: Duration::from_secs(2),
        }
    }
}

impl SettleDelays {
    pub fn none() -> Self {
        Self {
            after_load: Duration::ZERO,
            after_popup_close: Duration::ZERO,
            after_scroll: Duration::ZERO,
            after_click: Duration::ZERO,
            after_filter: Duration::ZERO,
            after_search: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: Url,
    pub query: String,
    pub date_range_label: String,
    pub page_size: u32,
    pub browser: BrowserSource,
    pub headless: bool,
    pub launch_args: Vec<String>,
    pub timeouts: Timeouts,
    pub settle: SettleDelays,
    pub retry: RetryConfig,
    pub max_popup_rounds: usize,
    pub abort_on_unverified_query: bool,
    pub output_path: PathBuf,
    pub write_preview: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            query: DEFAULT_QUERY.to_string(),
            date_range_label: DEFAULT_DATE_RANGE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            browser: BrowserSource::default(),
            headless: true,
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(|s| s.to_string()).collect(),
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
            retry: RetryConfig::default(),
            max_popup_rounds: 3,
            abort_on_unverified_query: false,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            write_preview: false,
        }
    }
}

impl CrawlConfig {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_browser(mut self, browser: BrowserSource) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_settle(mut self, settle: SettleDelays) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_popup_rounds(mut self, rounds: usize) -> Self {
        self.max_popup_rounds = rounds;
        self
    }

    pub fn with_abort_on_unverified_query(mut self, abort: bool) -> Self {
        self.abort_on_unverified_query = abort;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_preview(mut self, write_preview: bool) -> Self {
        self.write_preview = write_preview;
        self
    }

    pub fn validate(&self) -> ScraperResult<()> {
        if self.query.trim().is_empty() {
            return Err(ScraperError::ConfigError(
                "search query must not be empty".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(ScraperError::ConfigError(
                "page size must be positive".to_string(),
            ));
        }
        if self.date_range_label.trim().is_empty() {
            return Err(ScraperError::ConfigError(
                "date range label must not be empty".to_string(),
            ));
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ScraperError::ConfigError(format!(
                "unsupported base URL scheme: {}",
                self.base_url.scheme()
            )));
        }
        Ok(())
    }
}
