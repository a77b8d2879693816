use super::rule::SelectionRule;
use super::target::{LocateResult, Target};
use crate::browser::{BrowserSession, Candidate, ElementHandle, UiContext};
use crate::core::{ScraperError, ScraperResult, Timeouts};
use log::{debug, trace};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

/// Walks a target's rules in order and returns the first visible, enabled
/// match. Never clicks or otherwise mutates the page.
#[derive(Debug, Clone)]
pub struct Resolver {
    poll_interval: Duration,
    query_timeout: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_timeouts(&Timeouts::default())
    }
}

impl Resolver {
    pub fn new(poll_interval: Duration, query_timeout: Duration) -> Self {
        Self {
            poll_interval,
            query_timeout,
        }
    }

    pub fn from_timeouts(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.poll_interval, timeouts.query)
    }

    pub async fn resolve(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        target: &Target,
    ) -> ScraperResult<LocateResult> {
        let found = self.first_matching_rule(session, ctx, target).await?;
        Ok(match found {
            Some((rule_index, mut candidates)) => LocateResult::Found {
                element: candidates.remove(0),
                rule_index,
            },
            None => LocateResult::NotFound,
        })
    }

    /// Every interactable candidate across all rules, in rule order and
    /// without duplicates.
    pub async fn resolve_all(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        target: &Target,
    ) -> ScraperResult<Vec<ElementHandle>> {
        self.resolve_all_except(session, ctx, target, &HashSet::new())
            .await
    }

    /// Like [`Resolver::resolve_all`], ignoring `exclude`. Keeps polling while
    /// only excluded elements are present.
    pub async fn resolve_all_except(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        target: &Target,
        exclude: &HashSet<ElementHandle>,
    ) -> ScraperResult<Vec<ElementHandle>> {
        let deadline = Instant::now() + target.timeout;
        let mut passes = 0usize;

        loop {
            passes += 1;
            let mut seen: HashSet<ElementHandle> = HashSet::new();
            let mut found = Vec::new();
            for (index, rule) in target.rules.iter().enumerate() {
                let Ok(usable) = self.query_rule(session, ctx, target, index, rule).await else {
                    continue;
                };
                for element in usable {
                    if !exclude.contains(&element) && seen.insert(element.clone()) {
                        found.push(element);
                    }
                }
            }

            if !found.is_empty() {
                debug!(
                    "{}: {} candidate(s) across all rules after {} pass(es)",
                    target.name,
                    found.len(),
                    passes
                );
                return Ok(found);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("{}: nothing to collect after {} pass(es)", target.name, passes);
                return Ok(found);
            }
            sleep(std::cmp::min(self.poll_interval, deadline - now)).await;
        }
    }

    async fn first_matching_rule(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        target: &Target,
    ) -> ScraperResult<Option<(usize, Vec<ElementHandle>)>> {
        let deadline = Instant::now() + target.timeout;
        let mut passes = 0usize;
        let mut last_error: Option<ScraperError> = None;

        loop {
            passes += 1;
            for (index, rule) in target.rules.iter().enumerate() {
                let usable = match self.query_rule(session, ctx, target, index, rule).await {
                    Ok(usable) => usable,
                    Err(e) => {
                        last_error = Some(e);
                        continue;
                    }
                };

                if !usable.is_empty() {
                    debug!(
                        "{}: matched by rule #{} ({}) after {} pass(es), {} candidate(s)",
                        target.name,
                        index,
                        rule.kind(),
                        passes,
                        usable.len()
                    );
                    return Ok(Some((index, usable)));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                match last_error {
                    Some(e) => debug!(
                        "{}: not found after {} pass(es), last error: {}",
                        target.name, passes, e
                    ),
                    None => debug!("{}: not found after {} pass(es)", target.name, passes),
                }
                return Ok(None);
            }
            sleep(std::cmp::min(self.poll_interval, deadline - now)).await;
        }
    }

    /// Visible, enabled candidates of one rule. Query failures and query
    /// timeouts come back as `Err` so callers can treat them as no match.
    async fn query_rule(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        target: &Target,
        index: usize,
        rule: &SelectionRule,
    ) -> ScraperResult<Vec<ElementHandle>> {
        trace!("{}: trying rule #{} {}", target.name, index, rule);
        match timeout(self.query_timeout, session.query(ctx, rule)).await {
            Ok(Ok(candidates)) => Ok(candidates
                .into_iter()
                .filter(Candidate::is_interactable)
                .map(|c| c.element)
                .collect()),
            Ok(Err(e)) => {
                debug!("{}: rule #{} query failed: {}", target.name, index, e);
                Err(e)
            }
            Err(_) => {
                debug!(
                    "{}: rule #{} query exceeded {:?}",
                    target.name, index, self.query_timeout
                );
                Err(ScraperError::timeout(
                    self.query_timeout,
                    format!("{} rule #{}", target.name, index),
                ))
            }
        }
    }
}
