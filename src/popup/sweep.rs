use crate::browser::{BrowserSession, ContextKind, ElementHandle, UiContext};
use crate::core::{CrawlConfig, ScraperResult};
use crate::locator::{LocateResult, Resolver, Target, TargetTable};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub dismissed: usize,
    /// Overlays that could not be closed. Each is counted once.
    pub skipped: usize,
    pub rounds: usize,
}

/// Closes notice overlays that cover the portal's landing page.
#[derive(Debug, Clone)]
pub struct PopupSweep {
    resolver: Resolver,
    overlay: Target,
    dont_show_again: Target,
    close: Target,
    settle: Duration,
}

impl PopupSweep {
    pub fn new(resolver: Resolver, targets: &TargetTable, settle: Duration) -> Self {
        Self {
            resolver,
            overlay: targets.notice_overlay.clone(),
            dont_show_again: targets.overlay_dont_show_again.clone(),
            close: targets.overlay_close.clone(),
            settle,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            Resolver::from_timeouts(&config.timeouts),
            &TargetTable::new(config),
            config.settle.after_popup_close,
        )
    }

    pub async fn sweep(
        &self,
        session: &dyn BrowserSession,
        ctx: &UiContext,
        max_rounds: usize,
    ) -> ScraperResult<SweepReport> {
        let mut report = SweepReport::default();
        let mut stuck: HashSet<ElementHandle> = HashSet::new();

        for round in 1..=max_rounds {
            let overlays = self
                .resolver
                .resolve_all_except(session, ctx, &self.overlay, &stuck)
                .await?;

            if overlays.is_empty() {
                debug!("Popup sweep round {}: no overlays left", round);
                break;
            }
            report.rounds = round;

            let mut dismissed_this_round = 0;
            for overlay in overlays {
                match self.dismiss(session, &overlay).await {
                    Ok(true) => dismissed_this_round += 1,
                    Ok(false) => {
                        warn!("Overlay {} has no usable close control, skipping", overlay.token);
                        stuck.insert(overlay);
                    }
                    Err(e) => {
                        warn!("Failed to dismiss overlay {}: {}", overlay.token, e);
                        stuck.insert(overlay);
                    }
                }
            }

            report.dismissed += dismissed_this_round;
            if dismissed_this_round == 0 {
                break;
            }
        }

        report.skipped = stuck.len();
        info!(
            "Popup sweep finished: {} dismissed, {} skipped in {} round(s)",
            report.dismissed, report.skipped, report.rounds
        );
        Ok(report)
    }

    async fn dismiss(&self, session: &dyn BrowserSession, overlay: &ElementHandle) -> ScraperResult<bool> {
        let scope = UiContext::within(overlay.clone(), ContextKind::Overlay);

        if let LocateResult::Found { element, .. } = self
            .resolver
            .resolve(session, &scope, &self.dont_show_again)
            .await?
        {
            if let Err(e) = session.click(&element).await {
                debug!("Could not tick 'don't show again' on {}: {}", overlay.token, e);
            }
        }

        match self.resolver.resolve(session, &scope, &self.close).await? {
            LocateResult::Found {
                element,
                rule_index,
            } => {
                session.click(&element).await?;
                debug!("Closed overlay {} via close rule #{}", overlay.token, rule_index);
                sleep(self.settle).await;
                Ok(true)
            }
            LocateResult::NotFound => Ok(false),
        }
    }
}
