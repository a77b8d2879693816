use crate::browser::{BrowserSession, ContextKind, PageId, UiContext};
use crate::core::ScraperResult;
use crate::locator::{LocateResult, Resolver, TargetTable};
use log::{debug, info};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Works out where the proposal-notice list opened after its entry was
/// clicked. Candidates are polled together until `wait` runs out, in priority
/// order: a new tab, an overlay container, an iframe, an in-page region. The
/// plain document is accepted only on the last pass, and only when the query
/// input is already usable there.
pub(super) async fn resolve_sublist_context(
    resolver: &Resolver,
    targets: &TargetTable,
    session: &dyn BrowserSession,
    pages_before: usize,
    wait: Duration,
    poll_interval: Duration,
) -> ScraperResult<Option<UiContext>> {
    let document = UiContext::document(0);
    let deadline = Instant::now() + wait;

    loop {
        let pages = session.page_count().await?;
        if pages > pages_before {
            let page: PageId = pages - 1;
            info!("Proposal list opened in new tab (page {})", page);
            return Ok(Some(UiContext::new_tab(page)));
        }

        if let LocateResult::Found { element, .. } = resolver
            .resolve(session, &document, &targets.proposal_list_popup.immediate())
            .await?
        {
            info!("Proposal list opened as overlay {}", element.token);
            return Ok(Some(UiContext::within(element, ContextKind::Overlay)));
        }

        if let LocateResult::Found { element, .. } = resolver
            .resolve(session, &document, &targets.proposal_list_frame.immediate())
            .await?
        {
            info!("Proposal list opened in iframe {}", element.token);
            return Ok(Some(UiContext::frame(element)));
        }

        if let LocateResult::Found { element, .. } = resolver
            .resolve(session, &document, &targets.proposal_list_region.immediate())
            .await?
        {
            info!("Proposal list rendered in page region {}", element.token);
            return Ok(Some(UiContext::within(element, ContextKind::Region)));
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(std::cmp::min(poll_interval, deadline - now)).await;
    }

    let inline = resolver
        .resolve(session, &document, &targets.query_input.immediate())
        .await?;
    if inline.is_found() {
        info!("Proposal list search form is part of the main document");
        return Ok(Some(document));
    }

    debug!("No proposal list context after {:?}", wait);
    Ok(None)
}
