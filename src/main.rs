use anyhow::Context;
use clap::Parser;
use g2b_scraper::storage::ColumnLayout;
use g2b_scraper::{BrowserSource, CrawlConfig, Crawler, RunOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use url::Url;

/// Collects proposal notices from the G2B shopping mall into a CSV file.
#[derive(Debug, Parser)]
#[command(name = "g2b-scraper", version)]
struct Cli {
    /// Notice title search term.
    #[arg(long, default_value = g2b_scraper::core::DEFAULT_QUERY)]
    query: String,

    /// Portal landing page.
    #[arg(long, default_value = g2b_scraper::core::DEFAULT_BASE_URL)]
    base_url: Url,

    /// Rows requested per results page.
    #[arg(long, default_value_t = g2b_scraper::core::DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// CSV file the results are merged into.
    #[arg(long, default_value = g2b_scraper::core::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Chrome/Chromium executable. Looked up automatically when absent.
    #[arg(long, env = "CHROME_BIN")]
    browser: Option<PathBuf>,

    /// Attach to a running browser (DevTools HTTP or ws:// endpoint) instead of launching one.
    #[arg(long, conflicts_with = "browser")]
    connect: Option<Url>,

    /// Show the browser window.
    #[arg(long)]
    headful: bool,

    #[arg(long, default_value_t = 3)]
    max_popup_rounds: usize,

    /// Abort when the search term cannot be confirmed in the query field.
    #[arg(long)]
    strict_query: bool,

    /// Also write a fixed-width `.txt` preview next to the CSV.
    #[arg(long)]
    preview: bool,

    /// Print the run outcome as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> CrawlConfig {
        let browser = match self.connect {
            Some(endpoint) => BrowserSource::Connect { endpoint },
            None => BrowserSource::Launch {
                executable: self.browser,
            },
        };

        CrawlConfig::default()
            .with_query(self.query)
            .with_base_url(self.base_url)
            .with_page_size(self.page_size)
            .with_output(self.output)
            .with_browser(browser)
            .with_headless(!self.headful)
            .with_max_popup_rounds(self.max_popup_rounds)
            .with_abort_on_unverified_query(self.strict_query)
            .with_preview(self.preview)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("chromiumoxide", log::LevelFilter::Warn)
        .filter_module("tungstenite", log::LevelFilter::Warn)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let config = cli.into_config();

    let crawler = Crawler::from_config(&config);
    let outcome = crawler
        .run(&config)
        .await
        .context("scraping run failed")?;

    crawler.stats().print_summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome);
    }

    if let RunOutcome::Persisted { .. } = outcome {
        if let Some(rows) = crawler.sink().load().await? {
            println!("{}", ColumnLayout::default().render_table(&rows));
        }
    }

    Ok(if outcome.is_aborted() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}
