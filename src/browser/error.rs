use super::session::PageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("DevTools endpoint discovery failed: {0}")]
    Discovery(String),
    #[error("Page {0} is not open")]
    PageNotFound(PageId),
    #[error("Element {0} is no longer attached")]
    ElementDetached(String),
    #[error("Element {0} is not interactable")]
    NotInteractable(String),
    #[error("Script failed: {0}")]
    Script(String),
    #[error("Browser session already closed")]
    Closed,
}
