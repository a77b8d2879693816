pub mod chromium;
pub mod discovery;
mod error;
pub mod mock_browser;
mod script;
mod session;

pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use error::BrowserError;
pub use mock_browser::{MockAction, MockBrowser, MockElement, MockLauncher};
pub use session::{
    BrowserLauncher, BrowserSession, Candidate, ContextKind, ElementHandle, PageId, PageSnapshot,
    Scope, UiContext,
};

#[cfg(test)]
mod tests;
