use crate::core::pipeline::{Stage, StageOutcome};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageStats {
    pub attempts: usize,
    pub retries: usize,
    pub outcome: Option<String>,
    pub retry_reasons: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub run_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub stages: HashMap<Stage, StageStats>,
    pub popups_dismissed: usize,
    pub popups_skipped: usize,
    pub rows_scraped: usize,
    pub rows_persisted: usize,
    pub query_verified: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<RunStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(RunStats {
                run_id: None,
                start_time: Utc::now(),
                end_time: None,
                stages: HashMap::new(),
                popups_dismissed: 0,
                popups_skipped: 0,
                rows_scraped: 0,
                rows_persisted: 0,
                query_verified: None,
            })),
        }
    }

    /// Clears counters from a previous run and stamps a new start time.
    pub fn start_run(&self, run_id: &str) {
        let mut stats = self.stats.write();
        stats.run_id = Some(run_id.to_string());
        stats.start_time = Utc::now();
        stats.end_time = None;
        stats.stages.clear();
        stats.popups_dismissed = 0;
        stats.popups_skipped = 0;
        stats.rows_scraped = 0;
        stats.rows_persisted = 0;
        stats.query_verified = None;
    }

    pub fn record_attempt(&self, stage: Stage) {
        self.stats.write().stages.entry(stage).or_default().attempts += 1;
    }

    pub fn record_retry(&self, stage: Stage, reason: String) {
        let mut stats = self.stats.write();
        let entry = stats.stages.entry(stage).or_default();
        entry.retries += 1;
        *entry.retry_reasons.entry(reason).or_insert(0) += 1;
    }

    pub fn record_stage_outcome(&self, stage: Stage, outcome: &StageOutcome) {
        self.stats.write().stages.entry(stage).or_default().outcome = Some(outcome.to_string());
    }

    pub fn record_popups(&self, dismissed: usize, skipped: usize) {
        let mut stats = self.stats.write();
        stats.popups_dismissed += dismissed;
        stats.popups_skipped += skipped;
    }

    pub fn record_query_verified(&self, verified: bool) {
        self.stats.write().query_verified = Some(verified);
    }

    pub fn record_rows(&self, scraped: usize) {
        self.stats.write().rows_scraped = scraped;
    }

    pub fn record_persisted(&self, total: usize) {
        self.stats.write().rows_persisted = total;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> RunStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nRun Statistics:");
        println!("===============");
        if let Some(run_id) = &stats.run_id {
            println!("Run: {}", run_id);
        }
        println!("Duration: {} seconds", duration.num_seconds());
        println!(
            "Popups: {} dismissed, {} skipped",
            stats.popups_dismissed, stats.popups_skipped
        );
        println!("Rows Scraped: {}", stats.rows_scraped);
        println!("Rows In Sink: {}", stats.rows_persisted);
        if let Some(verified) = stats.query_verified {
            println!("Query Verified: {}", verified);
        }

        println!("\nStages:");
        for stage in Stage::ORDER {
            if let Some(stage_stats) = stats.stages.get(&stage) {
                println!(
                    "  {}: {} attempt(s), {}",
                    stage,
                    stage_stats.attempts,
                    stage_stats.outcome.as_deref().unwrap_or("not finished")
                );
                for (reason, count) in &stage_stats.retry_reasons {
                    println!("    retry {}x: {}", count, reason);
                }
            }
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
