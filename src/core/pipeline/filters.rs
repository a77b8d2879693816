use crate::browser::{BrowserSession, UiContext};
use crate::core::{CrawlConfig, ScraperResult};
use crate::locator::{LocateResult, Resolver, TargetTable};
use log::{debug, warn};
use serde::Serialize;
use tokio::time::sleep;

/// What each of the three independent filter steps achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub date_range_set: bool,
    pub query_verified: bool,
    pub page_size_set: bool,
}

impl FilterReport {
    pub fn all_applied(&self) -> bool {
        self.date_range_set && self.query_verified && self.page_size_set
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.date_range_set {
            missing.push("date range");
        }
        if !self.query_verified {
            missing.push("query");
        }
        if !self.page_size_set {
            missing.push("page size");
        }
        missing
    }
}

pub(super) async fn apply_filters(
    resolver: &Resolver,
    targets: &TargetTable,
    session: &dyn BrowserSession,
    ctx: &UiContext,
    config: &CrawlConfig,
) -> FilterReport {
    let date_range_set = step("date range", set_date_range(resolver, targets, session, ctx)).await;
    sleep(config.settle.after_filter).await;

    let query_verified = step(
        "query",
        set_query(resolver, targets, session, ctx, &config.query),
    )
    .await;
    sleep(config.settle.after_filter).await;

    let page_size_set = step(
        "page size",
        set_page_size(resolver, targets, session, ctx, config.page_size),
    )
    .await;
    sleep(config.settle.after_filter).await;

    FilterReport {
        date_range_set,
        query_verified,
        page_size_set,
    }
}

async fn step<F>(name: &str, fut: F) -> bool
where
    F: std::future::Future<Output = ScraperResult<bool>>,
{
    match fut.await {
        Ok(applied) => applied,
        Err(e) => {
            warn!("Filter step '{}' failed: {}", name, e);
            false
        }
    }
}

async fn set_date_range(
    resolver: &Resolver,
    targets: &TargetTable,
    session: &dyn BrowserSession,
    ctx: &UiContext,
) -> ScraperResult<bool> {
    let element = match resolver.resolve(session, ctx, &targets.date_range).await? {
        LocateResult::Found { element, .. } => element,
        LocateResult::NotFound => return Ok(false),
    };

    if let Err(e) = session.click(&element).await {
        debug!("Date range click failed ({}), checking through the DOM", e);
        session.force_check(&element).await?;
    }
    Ok(true)
}

async fn set_query(
    resolver: &Resolver,
    targets: &TargetTable,
    session: &dyn BrowserSession,
    ctx: &UiContext,
    query: &str,
) -> ScraperResult<bool> {
    let element = match resolver.resolve(session, ctx, &targets.query_input).await? {
        LocateResult::Found { element, .. } => element,
        LocateResult::NotFound => return Ok(false),
    };

    session.fill(&element, query).await?;
    if session.read_value(&element).await? == query {
        return Ok(true);
    }

    debug!("Typed query did not stick, writing it through the DOM");
    session.force_value(&element, query).await?;
    Ok(session.read_value(&element).await? == query)
}

async fn set_page_size(
    resolver: &Resolver,
    targets: &TargetTable,
    session: &dyn BrowserSession,
    ctx: &UiContext,
    page_size: u32,
) -> ScraperResult<bool> {
    let element = match resolver.resolve(session, ctx, &targets.page_size).await? {
        LocateResult::Found { element, .. } => element,
        LocateResult::NotFound => return Ok(false),
    };

    let wanted = page_size.to_string();
    if let Err(e) = session.select_option(&element, &wanted).await {
        debug!("Page size selection failed ({}), writing it through the DOM", e);
        session.force_value(&element, &wanted).await?;
    }
    Ok(session.read_value(&element).await? == wanted)
}
