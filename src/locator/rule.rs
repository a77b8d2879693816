use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl AttrOp {
    fn css_operator(&self) -> &'static str {
        match self {
            AttrOp::Equals => "=",
            AttrOp::Contains => "*=",
            AttrOp::StartsWith => "^=",
            AttrOp::EndsWith => "$=",
        }
    }

    fn matches(&self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            AttrOp::Contains => actual.contains(expected),
            AttrOp::StartsWith => actual.starts_with(expected),
            AttrOp::EndsWith => actual.ends_with(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrFilter {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrFilter {
    fn to_css(&self) -> String {
        format!(
            "[{}{}{}]",
            self.name,
            self.op.css_operator(),
            css_quote(&self.value)
        )
    }
}

/// A tag plus attribute constraints, rendered as a compound CSS selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPattern {
    pub tag: Option<String>,
    pub attrs: Vec<AttrFilter>,
}

impl ElementPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    fn with_attr(mut self, name: &str, op: AttrOp, value: &str) -> Self {
        self.attrs.push(AttrFilter {
            name: name.to_string(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn attr_eq(self, name: &str, value: &str) -> Self {
        self.with_attr(name, AttrOp::Equals, value)
    }

    pub fn attr_contains(self, name: &str, value: &str) -> Self {
        self.with_attr(name, AttrOp::Contains, value)
    }

    pub fn attr_prefix(self, name: &str, value: &str) -> Self {
        self.with_attr(name, AttrOp::StartsWith, value)
    }

    pub fn attr_suffix(self, name: &str, value: &str) -> Self {
        self.with_attr(name, AttrOp::EndsWith, value)
    }

    pub fn to_css(&self) -> String {
        let mut css = match (&self.tag, self.attrs.is_empty()) {
            (Some(tag), _) => tag.clone(),
            (None, true) => "*".to_string(),
            (None, false) => String::new(),
        };
        for attr in &self.attrs {
            css.push_str(&attr.to_css());
        }
        css
    }

    /// Evaluates the pattern against an element described by its tag name and
    /// an attribute lookup.
    pub fn matches<'a, F>(&self, tag: &str, attr: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attrs.iter().all(|filter| {
            attr(&filter.name)
                .map(|actual| filter.op.matches(actual, &filter.value))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Exact(String),
    Contains(String),
    /// Regular expression, matched against whitespace-collapsed text.
    Pattern(String),
}

impl TextMatch {
    pub fn matches(&self, text: &str) -> bool {
        let text = collapse_whitespace(text);
        match self {
            TextMatch::Exact(expected) => text == collapse_whitespace(expected),
            TextMatch::Contains(fragment) => text.contains(&collapse_whitespace(fragment)),
            TextMatch::Pattern(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(&text))
                .unwrap_or(false),
        }
    }

    /// JavaScript predicate over an already collapsed text value `t`.
    pub fn to_js_predicate(&self) -> String {
        match self {
            TextMatch::Exact(expected) => {
                format!("(t) => t === {}", js_string(&collapse_whitespace(expected)))
            }
            TextMatch::Contains(fragment) => format!(
                "(t) => t.includes({})",
                js_string(&collapse_whitespace(fragment))
            ),
            TextMatch::Pattern(pattern) => format!(
                "(t) => {{ try {{ return new RegExp({}).test(t); }} catch (_) {{ return false; }} }}",
                js_string(pattern)
            ),
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Exact(s) => write!(f, "={:?}", s),
            TextMatch::Contains(s) => write!(f, "~{:?}", s),
            TextMatch::Pattern(s) => write!(f, "/{}/", s),
        }
    }
}

/// One concrete way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRule {
    Attribute(ElementPattern),
    Text {
        tag: Option<String>,
        text: TextMatch,
    },
    Within {
        container: ElementPattern,
        element: ElementPattern,
    },
    ClassFragment {
        tag: Option<String>,
        fragment: String,
    },
}

impl SelectionRule {
    pub fn attribute(pattern: ElementPattern) -> Self {
        SelectionRule::Attribute(pattern)
    }

    pub fn text_exact(tag: Option<&str>, text: &str) -> Self {
        SelectionRule::Text {
            tag: tag.map(str::to_ascii_lowercase),
            text: TextMatch::Exact(text.to_string()),
        }
    }

    pub fn text_contains(tag: Option<&str>, text: &str) -> Self {
        SelectionRule::Text {
            tag: tag.map(str::to_ascii_lowercase),
            text: TextMatch::Contains(text.to_string()),
        }
    }

    pub fn text_pattern(tag: Option<&str>, pattern: &str) -> Self {
        SelectionRule::Text {
            tag: tag.map(str::to_ascii_lowercase),
            text: TextMatch::Pattern(pattern.to_string()),
        }
    }

    pub fn within(container: ElementPattern, element: ElementPattern) -> Self {
        SelectionRule::Within { container, element }
    }

    pub fn class_fragment(tag: Option<&str>, fragment: &str) -> Self {
        SelectionRule::ClassFragment {
            tag: tag.map(str::to_ascii_lowercase),
            fragment: fragment.to_string(),
        }
    }

    /// CSS selector for the candidate set; text rules are narrowed further
    /// by [`SelectionRule::text_filter`].
    pub fn css(&self) -> String {
        match self {
            SelectionRule::Attribute(pattern) => pattern.to_css(),
            SelectionRule::Text { tag, .. } => tag.clone().unwrap_or_else(|| "*".to_string()),
            SelectionRule::Within { container, element } => {
                format!("{} {}", container.to_css(), element.to_css())
            }
            SelectionRule::ClassFragment { tag, fragment } => {
                let pattern = match tag {
                    Some(tag) => ElementPattern::tag(tag),
                    None => ElementPattern::any(),
                };
                pattern.attr_contains("class", fragment).to_css()
            }
        }
    }

    pub fn text_filter(&self) -> Option<&TextMatch> {
        match self {
            SelectionRule::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SelectionRule::Attribute(_) => "attribute",
            SelectionRule::Text { .. } => "text",
            SelectionRule::Within { .. } => "structural",
            SelectionRule::ClassFragment { .. } => "class",
        }
    }
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text_filter() {
            Some(text) => write!(f, "{}:{}{}", self.kind(), self.css(), text),
            None => write!(f, "{}:{}", self.kind(), self.css()),
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn css_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Renders a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
