use crate::browser::{BrowserLauncher, ChromiumLauncher, PageSnapshot};
use crate::core::pipeline::{AbortReason, NavigationMachine, PipelineResult, Stage};
use crate::core::{CrawlConfig, ScraperError, ScraperResult};
use crate::progress::{LogProgress, ProgressSink};
use crate::stats::StatsTracker;
use crate::storage::{merge, CsvSink, ResultSink};
use futures::FutureExt;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Persisted {
        scraped: usize,
        total: usize,
        query_verified: bool,
    },
    /// The search ran and the grid was empty. The sink is untouched.
    NoResults,
    Aborted {
        reason: AbortReason,
        stage: Stage,
        detail: Option<PageSnapshot>,
    },
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Persisted {
                scraped,
                total,
                query_verified,
            } => {
                write!(f, "{} row(s) scraped, {} in sink", scraped, total)?;
                if !query_verified {
                    write!(f, " (query not verified)")?;
                }
                Ok(())
            }
            RunOutcome::NoResults => write!(f, "no results"),
            RunOutcome::Aborted {
                reason,
                stage,
                detail,
            } => {
                write!(f, "aborted at {}: {}", stage, reason)?;
                if let Some(page) = detail {
                    write!(f, " (last page: {} {:?})", page.url, page.title)?;
                }
                Ok(())
            }
        }
    }
}

pub struct Crawler {
    launcher: Box<dyn BrowserLauncher>,
    sink: Arc<dyn ResultSink>,
    stats: Arc<StatsTracker>,
    progress: Arc<dyn ProgressSink>,
}

impl Crawler {
    pub fn new(launcher: Box<dyn BrowserLauncher>, sink: Arc<dyn ResultSink>) -> Self {
        info!("Initializing crawler (sink: {})", sink.describe());
        Self {
            launcher,
            sink,
            stats: Arc::new(StatsTracker::new()),
            progress: Arc::new(LogProgress),
        }
    }

    /// Chromium browser and the CSV sink named by `config`.
    pub fn from_config(config: &CrawlConfig) -> Self {
        let sink = CsvSink::new(&config.output_path).with_preview(config.write_preview);
        Self::new(Box::new(ChromiumLauncher::new()), Arc::new(sink))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        Arc::clone(&self.stats)
    }

    pub fn sink(&self) -> Arc<dyn ResultSink> {
        Arc::clone(&self.sink)
    }

    pub async fn run(&self, config: &CrawlConfig) -> ScraperResult<RunOutcome> {
        config.validate()?;
        let run_id = Uuid::now_v7().to_string();
        self.stats.start_run(&run_id);
        info!("Starting run {} for query {:?}", run_id, config.query);

        let mut session = self.launcher.launch(config).await?;
        let machine = NavigationMachine::new(config, Arc::clone(&self.stats), Arc::clone(&self.progress));

        let driven = AssertUnwindSafe(machine.drive(session.as_ref()))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            error!("Failed to close browser session: {}", e);
        }
        drop(session);

        let result = match driven {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Pipeline panicked: {}", message);
                self.stats.finish();
                return Err(ScraperError::Panicked(message));
            }
        };

        let outcome = self.conclude(result).await;
        self.stats.finish();
        let outcome = outcome?;
        self.progress.run_finished(&outcome);
        Ok(outcome)
    }

    async fn conclude(&self, result: PipelineResult) -> ScraperResult<RunOutcome> {
        match result {
            PipelineResult::Extracted {
                table,
                query_verified,
            } => {
                let rows = table.into_notice_rows();
                let scraped = rows.len();

                let existing = self.sink.load().await?;
                debug!(
                    "Sink {} holds {} row(s) before merge",
                    self.sink.describe(),
                    existing.as_ref().map_or(0, Vec::len)
                );
                let merged = merge(existing, rows);
                self.sink.store(&merged).await?;
                self.stats.record_persisted(merged.len());

                Ok(RunOutcome::Persisted {
                    scraped,
                    total: merged.len(),
                    query_verified,
                })
            }
            PipelineResult::Aborted {
                reason: AbortReason::EmptyResultSet,
                ..
            } => {
                info!("Search returned no rows; sink left unchanged");
                Ok(RunOutcome::NoResults)
            }
            PipelineResult::Aborted {
                reason,
                stage,
                detail,
            } => {
                warn!("Run aborted at {}: {}; nothing persisted", stage, reason);
                Ok(RunOutcome::Aborted {
                    reason,
                    stage,
                    detail,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
