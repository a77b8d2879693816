use super::context::resolve_sublist_context;
use super::filters::apply_filters;
use super::stage::{AbortReason, Stage, StageOutcome};
use crate::browser::{BrowserSession, PageSnapshot, UiContext};
use crate::core::{CrawlConfig, ScraperError, ScraperResult};
use crate::locator::{LocateResult, Resolver, TargetTable};
use crate::parser::{extract, ExtractedTable};
use crate::popup::PopupSweep;
use crate::progress::{ProgressSink, StageStatus};
use crate::stats::StatsTracker;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Extracted {
        table: ExtractedTable,
        query_verified: bool,
    },
    Aborted {
        reason: AbortReason,
        stage: Stage,
        detail: Option<PageSnapshot>,
    },
}

#[derive(Debug, Default)]
struct RunState {
    ctx: UiContext,
    query_verified: bool,
    table: Option<ExtractedTable>,
}

/// Drives one browser session through the portal, stage by stage.
pub struct NavigationMachine<'a> {
    config: &'a CrawlConfig,
    resolver: Resolver,
    targets: TargetTable,
    sweep: PopupSweep,
    stats: Arc<StatsTracker>,
    progress: Arc<dyn ProgressSink>,
}

impl<'a> NavigationMachine<'a> {
    pub fn new(
        config: &'a CrawlConfig,
        stats: Arc<StatsTracker>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let resolver = Resolver::from_timeouts(&config.timeouts);
        let targets = TargetTable::new(config);
        let sweep = PopupSweep::new(resolver.clone(), &targets, config.settle.after_popup_close);

        Self {
            config,
            resolver,
            targets,
            sweep,
            stats,
            progress,
        }
    }

    pub async fn drive(&self, session: &dyn BrowserSession) -> ScraperResult<PipelineResult> {
        let mut state = RunState::default();
        let mut stage = Stage::Connected;

        while stage != Stage::Done {
            let outcome = match self.run_stage(session, stage, &mut state).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("{} failed after its retries: {}", stage, e);
                    StageOutcome::HardFailure(AbortReason::StageError)
                }
            };
            self.stats.record_stage_outcome(stage, &outcome);

            match outcome {
                StageOutcome::Success => {
                    self.progress.stage_completed(stage, StageStatus::Success);
                }
                StageOutcome::SoftFailure(reason) => {
                    warn!("{} degraded: {}", stage, reason);
                    self.progress.stage_completed(stage, StageStatus::SoftFailure);
                }
                StageOutcome::HardFailure(reason) => {
                    warn!("{} aborted the run: {}", stage, reason);
                    self.progress.stage_completed(stage, StageStatus::Aborted);
                    let detail = self.snapshot(session, &state.ctx).await;
                    return Ok(PipelineResult::Aborted {
                        reason,
                        stage,
                        detail,
                    });
                }
            }
            stage = stage.next();
        }

        let table = state.table.take().ok_or_else(|| {
            ScraperError::ExtractionError("results stage finished without a table".to_string())
        })?;
        Ok(PipelineResult::Extracted {
            table,
            query_verified: state.query_verified,
        })
    }

    async fn run_stage(
        &self,
        session: &dyn BrowserSession,
        stage: Stage,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let policy = self.config.retry.policy(stage);
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            self.stats.record_attempt(stage);
            debug!("{}: attempt {}/{}", stage, attempt + 1, max_attempts);
            let result = self.attempt(session, stage, state).await;

            let retry_reason = match &result {
                Ok(StageOutcome::Success) => None,
                Ok(StageOutcome::HardFailure(reason)) if !reason.is_retryable() => None,
                Ok(outcome) => Some(outcome.to_string()),
                Err(e) => Some(e.to_string()),
            };
            let Some(retry_reason) = retry_reason else {
                return result;
            };

            attempt += 1;
            if attempt >= max_attempts {
                return result;
            }

            let delay = policy.calculate_delay(attempt - 1);
            info!(
                "{}: retrying after {:?} ({}), attempt {}/{}",
                stage,
                delay,
                retry_reason,
                attempt + 1,
                max_attempts
            );
            self.stats.record_retry(stage, retry_reason);
            sleep(delay).await;
        }
    }

    async fn attempt(
        &self,
        session: &dyn BrowserSession,
        stage: Stage,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        match stage {
            Stage::Connected => self.connect(session, state).await,
            Stage::PopupsClear => self.clear_popups(session).await,
            Stage::SublistOpen => self.open_sublist(session, state).await,
            Stage::FiltersSet => self.set_filters(session, state).await,
            Stage::SearchSubmitted => self.submit_search(session, state).await,
            Stage::ResultsReady => self.collect_results(session, state).await,
            Stage::Done => Ok(StageOutcome::Success),
        }
    }

    async fn connect(
        &self,
        session: &dyn BrowserSession,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let timeouts = &self.config.timeouts;
        if let Err(e) = session.goto(&self.config.base_url, timeouts.navigation).await {
            warn!("Could not load {}: {}", self.config.base_url, e);
            return Ok(StageOutcome::HardFailure(AbortReason::ConnectFailed));
        }

        match session.wait_for_network_idle(timeouts.network_idle).await {
            Ok(true) => {}
            Ok(false) => debug!("Network still busy after {:?}, continuing", timeouts.network_idle),
            Err(e) => debug!("Network idle wait failed: {}", e),
        }
        sleep(self.config.settle.after_load).await;

        state.ctx = UiContext::document(0);
        Ok(StageOutcome::Success)
    }

    async fn clear_popups(&self, session: &dyn BrowserSession) -> ScraperResult<StageOutcome> {
        let report = self
            .sweep
            .sweep(session, &UiContext::document(0), self.config.max_popup_rounds)
            .await?;
        self.stats.record_popups(report.dismissed, report.skipped);

        if report.dismissed == 0 {
            return Ok(StageOutcome::SoftFailure(format!(
                "no popups dismissed ({} skipped)",
                report.skipped
            )));
        }
        Ok(StageOutcome::Success)
    }

    async fn open_sublist(
        &self,
        session: &dyn BrowserSession,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let document = UiContext::document(0);

        // The entry sits in the page footer and is only rendered once scrolled to.
        if let Err(e) = session.scroll_to_end(0).await {
            debug!("Scroll to page end failed: {}", e);
        }
        sleep(self.config.settle.after_scroll).await;

        let entry = match self
            .resolver
            .resolve(session, &document, &self.targets.proposal_list_entry)
            .await?
        {
            LocateResult::Found {
                element,
                rule_index,
            } => {
                debug!("Proposal list entry matched rule #{}", rule_index);
                element
            }
            LocateResult::NotFound => {
                return Ok(StageOutcome::HardFailure(AbortReason::SublistEntryNotFound))
            }
        };

        let pages_before = session.page_count().await?;
        session.click(&entry).await?;
        sleep(self.config.settle.after_click).await;

        let timeouts = &self.config.timeouts;
        match resolve_sublist_context(
            &self.resolver,
            &self.targets,
            session,
            pages_before,
            timeouts.context,
            timeouts.poll_interval,
        )
        .await?
        {
            Some(ctx) => {
                state.ctx = ctx;
                Ok(StageOutcome::Success)
            }
            None => Ok(StageOutcome::HardFailure(AbortReason::SublistContextNotFound)),
        }
    }

    async fn set_filters(
        &self,
        session: &dyn BrowserSession,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let report = apply_filters(
            &self.resolver,
            &self.targets,
            session,
            &state.ctx,
            self.config,
        )
        .await;
        state.query_verified = report.query_verified;
        self.stats.record_query_verified(report.query_verified);

        if !report.query_verified {
            if self.config.abort_on_unverified_query {
                return Ok(StageOutcome::HardFailure(AbortReason::QueryNotApplied));
            }
            warn!(
                "Search query {:?} could not be verified; results may be unfiltered",
                self.config.query
            );
        }

        if report.all_applied() {
            Ok(StageOutcome::Success)
        } else {
            Ok(StageOutcome::SoftFailure(format!(
                "filters not applied: {}",
                report.missing().join(", ")
            )))
        }
    }

    async fn submit_search(
        &self,
        session: &dyn BrowserSession,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let trigger = match self
            .resolver
            .resolve(session, &state.ctx, &self.targets.search_trigger)
            .await?
        {
            LocateResult::Found { element, .. } => element,
            LocateResult::NotFound => {
                return Ok(StageOutcome::HardFailure(AbortReason::SearchTriggerNotFound))
            }
        };

        session.click(&trigger).await?;
        if let Ok(false) = session
            .wait_for_network_idle(self.config.timeouts.network_idle)
            .await
        {
            debug!("Network still busy after search, continuing");
        }
        sleep(self.config.settle.after_search).await;
        Ok(StageOutcome::Success)
    }

    async fn collect_results(
        &self,
        session: &dyn BrowserSession,
        state: &mut RunState,
    ) -> ScraperResult<StageOutcome> {
        let grid = match self
            .resolver
            .resolve(session, &state.ctx, &self.targets.results_grid)
            .await?
        {
            LocateResult::Found { element, .. } => element,
            LocateResult::NotFound => {
                return Ok(StageOutcome::HardFailure(AbortReason::NoResultsGridFound))
            }
        };

        let html = session.outer_html(&grid).await?;
        let table = extract(&html)?;
        self.stats.record_rows(table.rows.len());
        info!(
            "Results grid holds {} row(s) across {} column(s)",
            table.rows.len(),
            table.header.len()
        );

        if table.rows.is_empty() {
            return Ok(StageOutcome::HardFailure(AbortReason::EmptyResultSet));
        }
        state.table = Some(table);
        Ok(StageOutcome::Success)
    }

    async fn snapshot(&self, session: &dyn BrowserSession, ctx: &UiContext) -> Option<PageSnapshot> {
        match session.snapshot(ctx.page).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("Could not capture page {}: {}", ctx.page, e);
                session.snapshot(0).await.ok()
            }
        }
    }
}
