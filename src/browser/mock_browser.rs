use super::error::BrowserError;
use super::session::{
    BrowserLauncher, BrowserSession, Candidate, ElementHandle, PageId, PageSnapshot, Scope,
    UiContext,
};
use crate::core::{CrawlConfig, ScraperError, ScraperResult};
use crate::locator::SelectionRule;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Side effect applied when a mock element is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    Show(String),
    Hide(String),
    Remove(String),
    /// Opens the next page (tab); its elements become queryable.
    OpenPage,
}

/// An element of the in-memory page model. Keys double as element tokens.
#[derive(Debug, Clone)]
pub struct MockElement {
    pub key: String,
    pub page: PageId,
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub parent: Option<String>,
    pub visible: bool,
    pub disabled: bool,
    pub value: String,
    pub checked: bool,
    pub options: Vec<String>,
    pub html: Option<String>,
    pub on_click: Vec<MockAction>,
    pub ignores_input: bool,
    pub locked: bool,
    pub click_fails: bool,
}

impl MockElement {
    pub fn new(key: &str, tag: &str) -> Self {
        Self {
            key: key.to_string(),
            page: 0,
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            visible: true,
            disabled: false,
            value: String::new(),
            checked: false,
            options: Vec::new(),
            html: None,
            on_click: Vec::new(),
            ignores_input: false,
            locked: false,
            click_fails: false,
        }
    }

    pub fn on_page(mut self, page: PageId) -> Self {
        self.page = page;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn inside(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = Some(html.to_string());
        self
    }

    pub fn on_click(mut self, action: MockAction) -> Self {
        self.on_click.push(action);
        self
    }

    /// Typed input is dropped; forced writes still land.
    pub fn ignoring_input(mut self) -> Self {
        self.ignores_input = true;
        self
    }

    /// Neither typed nor forced writes change the value.
    pub fn locked(mut self) -> Self {
        self.ignores_input = true;
        self.locked = true;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn handle(&self) -> ElementHandle {
        ElementHandle::new(self.page, self.key.clone())
    }
}

#[derive(Debug, Default)]
struct MockState {
    elements: Vec<MockElement>,
    open_pages: usize,
    url: String,
    title: String,
    failing_navigation: bool,
    failing_launch: bool,
    failing_outer_html: bool,
    panic_on_click: Option<String>,
    launch_calls: usize,
    close_calls: usize,
    navigations: Vec<String>,
    query_log: Vec<String>,
    click_log: Vec<String>,
    fill_log: Vec<(String, String)>,
}

impl MockState {
    fn find(&self, key: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.key == key)
    }

    fn is_descendant(&self, element: &MockElement, ancestor: &str) -> bool {
        let mut current = element.parent.as_deref();
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.find(key).and_then(|e| e.parent.as_deref());
        }
        false
    }

    fn effectively_visible(&self, element: &MockElement) -> bool {
        let mut current = Some(element);
        while let Some(el) = current {
            if !el.visible {
                return false;
            }
            current = el.parent.as_deref().and_then(|key| self.find(key));
        }
        true
    }

    fn has_matching_ancestor(&self, element: &MockElement, rule: &SelectionRule) -> bool {
        let container = match rule {
            SelectionRule::Within { container, .. } => container,
            _ => return true,
        };
        let mut current = element.parent.as_deref().and_then(|key| self.find(key));
        while let Some(el) = current {
            if container.matches(&el.tag, |name| el.attr_value(name)) {
                return true;
            }
            current = el.parent.as_deref().and_then(|key| self.find(key));
        }
        false
    }

    fn matches_rule(&self, element: &MockElement, rule: &SelectionRule) -> bool {
        match rule {
            SelectionRule::Attribute(pattern) => {
                pattern.matches(&element.tag, |name| element.attr_value(name))
            }
            SelectionRule::Text { tag, text } => {
                let tag_ok = tag.as_deref().map_or(true, |t| t == element.tag);
                let shown = if element.text.is_empty() {
                    &element.value
                } else {
                    &element.text
                };
                tag_ok && text.matches(shown)
            }
            SelectionRule::Within { element: pattern, .. } => {
                pattern.matches(&element.tag, |name| element.attr_value(name))
                    && self.has_matching_ancestor(element, rule)
            }
            SelectionRule::ClassFragment { tag, fragment } => {
                let tag_ok = tag.as_deref().map_or(true, |t| t == element.tag);
                tag_ok
                    && element
                        .attr_value("class")
                        .map_or(false, |class| class.contains(fragment.as_str()))
            }
        }
    }

    fn apply(&mut self, action: &MockAction) {
        match action {
            MockAction::Show(key) => {
                if let Some(el) = self.find_mut(key) {
                    el.visible = true;
                }
            }
            MockAction::Hide(key) => {
                if let Some(el) = self.find_mut(key) {
                    el.visible = false;
                }
            }
            MockAction::Remove(key) => {
                let doomed: Vec<String> = self
                    .elements
                    .iter()
                    .filter(|e| e.key == *key || self.is_descendant(e, key))
                    .map(|e| e.key.clone())
                    .collect();
                self.elements.retain(|e| !doomed.contains(&e.key));
            }
            MockAction::OpenPage => self.open_pages += 1,
        }
    }
}

/// Scriptable in-memory browser. Clones share state, so a test can keep one
/// handle while the crawler owns another.
#[derive(Debug, Clone)]
pub struct MockBrowser {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    pub fn new() -> Self {
        let state = MockState {
            open_pages: 1,
            url: "about:blank".to_string(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_element(self, element: MockElement) -> Self {
        self.state.lock().elements.push(element);
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        self.state.lock().title = title.to_string();
        self
    }

    pub fn failing_navigation(self) -> Self {
        self.state.lock().failing_navigation = true;
        self
    }

    pub fn failing_launch(self) -> Self {
        self.state.lock().failing_launch = true;
        self
    }

    pub fn failing_outer_html(self) -> Self {
        self.state.lock().failing_outer_html = true;
        self
    }

    pub fn panicking_on_click(self, key: &str) -> Self {
        self.state.lock().panic_on_click = Some(key.to_string());
        self
    }

    pub fn launcher(&self) -> MockLauncher {
        MockLauncher {
            browser: self.clone(),
        }
    }

    pub fn launch_calls(&self) -> usize {
        self.state.lock().launch_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    /// `Display` rendering of every rule queried, in order.
    pub fn query_log(&self) -> Vec<String> {
        self.state.lock().query_log.clone()
    }

    pub fn click_log(&self) -> Vec<String> {
        self.state.lock().click_log.clone()
    }

    pub fn fill_log(&self) -> Vec<(String, String)> {
        self.state.lock().fill_log.clone()
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.state.lock().find(key).map(|e| e.value.clone())
    }

    pub fn is_checked(&self, key: &str) -> bool {
        self.state.lock().find(key).map_or(false, |e| e.checked)
    }

    pub fn is_visible(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .find(key)
            .map_or(false, |e| state.effectively_visible(e))
    }

    pub fn handle(&self, key: &str) -> Option<ElementHandle> {
        self.state.lock().find(key).map(MockElement::handle)
    }

    fn with_live_element<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&mut MockElement) -> ScraperResult<T>,
    ) -> ScraperResult<T> {
        let mut state = self.state.lock();
        match state.find_mut(&element.token) {
            Some(el) if el.page == element.page => f(el),
            _ => Err(BrowserError::ElementDetached(element.token.clone()).into()),
        }
    }
}

#[async_trait]
impl BrowserSession for MockBrowser {
    async fn goto(&self, url: &Url, timeout: Duration) -> ScraperResult<()> {
        let mut state = self.state.lock();
        state.navigations.push(url.to_string());
        if state.failing_navigation {
            return Err(ScraperError::timeout(timeout, format!("navigation to {}", url)));
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> ScraperResult<bool> {
        Ok(true)
    }

    async fn scroll_to_end(&self, page: PageId) -> ScraperResult<()> {
        if page >= self.state.lock().open_pages {
            return Err(BrowserError::PageNotFound(page).into());
        }
        Ok(())
    }

    async fn page_count(&self) -> ScraperResult<usize> {
        Ok(self.state.lock().open_pages)
    }

    async fn query(&self, ctx: &UiContext, rule: &SelectionRule) -> ScraperResult<Vec<Candidate>> {
        let mut state = self.state.lock();
        state.query_log.push(rule.to_string());
        if ctx.page >= state.open_pages {
            return Err(BrowserError::PageNotFound(ctx.page).into());
        }

        let scope_root = match &ctx.scope {
            Scope::Document => None,
            Scope::Within(handle) | Scope::Frame(handle) => {
                if state.find(&handle.token).is_none() {
                    return Err(BrowserError::ElementDetached(handle.token.clone()).into());
                }
                Some(handle.token.as_str())
            }
        };

        Ok(state
            .elements
            .iter()
            .filter(|e| e.page == ctx.page)
            .filter(|e| scope_root.map_or(true, |root| state.is_descendant(e, root)))
            .filter(|e| state.matches_rule(e, rule))
            .map(|e| Candidate {
                element: e.handle(),
                visible: state.effectively_visible(e),
                disabled: e.disabled,
            })
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> ScraperResult<()> {
        let actions = {
            let mut state = self.state.lock();
            state.click_log.push(element.token.clone());
            if state.panic_on_click.as_deref() == Some(element.token.as_str()) {
                drop(state);
                panic!("scripted panic while clicking {}", element.token);
            }
            let el = match state.find_mut(&element.token) {
                Some(el) if el.page == element.page => el,
                _ => return Err(BrowserError::ElementDetached(element.token.clone()).into()),
            };
            if el.click_fails {
                return Err(BrowserError::NotInteractable(element.token.clone()).into());
            }
            let checkable = matches!(el.attr_value("type"), Some("radio" | "checkbox"));
            if el.tag == "input" && checkable {
                el.checked = true;
            }
            el.on_click.clone()
        };

        let mut state = self.state.lock();
        for action in &actions {
            state.apply(action);
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.state
            .lock()
            .fill_log
            .push((element.token.clone(), value.to_string()));
        self.with_live_element(element, |el| {
            if !el.ignores_input {
                el.value = value.to_string();
            }
            Ok(())
        })
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.with_live_element(element, |el| {
            if !el.options.iter().any(|o| o == value) {
                return Err(BrowserError::Script(format!("missing-option on {}", el.key)).into());
            }
            el.value = value.to_string();
            Ok(())
        })
    }

    async fn read_value(&self, element: &ElementHandle) -> ScraperResult<String> {
        self.with_live_element(element, |el| Ok(el.value.clone()))
    }

    async fn force_value(&self, element: &ElementHandle, value: &str) -> ScraperResult<()> {
        self.with_live_element(element, |el| {
            if !el.locked {
                el.value = value.to_string();
            }
            Ok(())
        })
    }

    async fn force_check(&self, element: &ElementHandle) -> ScraperResult<()> {
        self.with_live_element(element, |el| {
            el.checked = true;
            Ok(())
        })
    }

    async fn outer_html(&self, element: &ElementHandle) -> ScraperResult<String> {
        if self.state.lock().failing_outer_html {
            return Err(BrowserError::Script("outerHTML unavailable".to_string()).into());
        }
        self.with_live_element(element, |el| {
            Ok(el
                .html
                .clone()
                .unwrap_or_else(|| format!("<{0}>{1}</{0}>", el.tag, el.text)))
        })
    }

    async fn snapshot(&self, page: PageId) -> ScraperResult<PageSnapshot> {
        let state = self.state.lock();
        if page >= state.open_pages {
            return Err(BrowserError::PageNotFound(page).into());
        }
        Ok(PageSnapshot {
            url: state.url.clone(),
            title: state.title.clone(),
        })
    }

    async fn close(&mut self) -> ScraperResult<()> {
        self.state.lock().close_calls += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockLauncher {
    browser: MockBrowser,
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self, _config: &CrawlConfig) -> ScraperResult<Box<dyn BrowserSession>> {
        {
            let mut state = self.browser.state.lock();
            state.launch_calls += 1;
            if state.failing_launch {
                return Err(BrowserError::Launch("scripted launch failure".to_string()).into());
            }
        }
        Ok(Box::new(self.browser.clone()))
    }
}
