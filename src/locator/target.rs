use super::rule::SelectionRule;
use crate::browser::ElementHandle;
use std::time::Duration;

/// A semantic UI element with its ordered fallback rules.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: &'static str,
    pub rules: Vec<SelectionRule>,
    pub timeout: Duration,
}

impl Target {
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            rules: Vec::new(),
            timeout,
        }
    }

    pub fn rule(mut self, rule: SelectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Single pass over the rules, no waiting.
    pub fn immediate(&self) -> Self {
        self.clone().with_timeout(Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateResult {
    Found {
        element: ElementHandle,
        rule_index: usize,
    },
    NotFound,
}

impl LocateResult {
    pub fn is_found(&self) -> bool {
        matches!(self, LocateResult::Found { .. })
    }

    pub fn into_element(self) -> Option<ElementHandle> {
        match self {
            LocateResult::Found { element, .. } => Some(element),
            LocateResult::NotFound => None,
        }
    }
}
