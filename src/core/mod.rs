mod config;
mod crawling;
mod errors;
pub mod pipeline;
pub mod retry;

pub use config::{
    BrowserSource, CrawlConfig, SettleDelays, Timeouts, DEFAULT_BASE_URL, DEFAULT_DATE_RANGE,
    DEFAULT_OUTPUT, DEFAULT_PAGE_SIZE, DEFAULT_QUERY,
};
pub use crawling::{Crawler, RunOutcome};
pub use errors::{ScraperError, ScraperResult};
