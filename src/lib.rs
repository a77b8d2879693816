pub mod browser;
pub mod core;
pub mod locator;
pub mod parser;
pub mod popup;
pub mod progress;
pub mod stats;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{BrowserLauncher, BrowserSession, ChromiumLauncher, UiContext};
pub use core::pipeline::{AbortReason, Stage, StageOutcome};
pub use core::{BrowserSource, CrawlConfig, Crawler, RunOutcome, ScraperError, ScraperResult};
pub use locator::{LocateResult, Resolver, SelectionRule, Target, TargetTable};
pub use parser::{extract, ExtractedTable};
pub use popup::{PopupSweep, SweepReport};
pub use progress::{LogProgress, ProgressSink};
pub use stats::StatsTracker;
pub use storage::{merge, CsvSink, NoticeRow, ResultSet, ResultSink};
