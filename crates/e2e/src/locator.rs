//! Deferred element references
//!
//! A [`Locator`] is a chain of selector segments that the Playwright bridge
//! rebuilds with `page.locator`, `getByRole`, `getByText`, `filter` and `nth`.
//! Building a locator never touches a page; resolution happens when an action
//! or query is performed, so every call sees the DOM as it is at that moment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How text is matched against element content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum TextMatch {
    /// Case-insensitive substring, Playwright's default.
    Substring(String),
    /// Whole-string, case-sensitive match.
    Exact(String),
    /// JavaScript regular expression source (without slashes).
    Regex(String),
}

impl TextMatch {
    fn describe(&self) -> String {
        match self {
            TextMatch::Substring(s) => format!("'{}'", s),
            TextMatch::Exact(s) => format!("'{}', {{ exact: true }}", s),
            TextMatch::Regex(r) => format!("/{}/", r),
        }
    }
}

/// One step of a locator chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Css {
        selector: String,
    },
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<TextMatch>,
    },
    Text {
        text: TextMatch,
    },
    HasText {
        text: TextMatch,
    },
    Nth {
        index: usize,
    },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Css { selector } => write!(f, "locator('{}')", selector),
            Segment::Role { role, name: None } => write!(f, "getByRole('{}')", role),
            Segment::Role { role, name: Some(TextMatch::Exact(n)) } => {
                write!(f, "getByRole('{}', {{ name: '{}', exact: true }})", role, n)
            }
            Segment::Role { role, name: Some(TextMatch::Substring(n)) } => {
                write!(f, "getByRole('{}', {{ name: '{}' }})", role, n)
            }
            Segment::Role { role, name: Some(TextMatch::Regex(r)) } => {
                write!(f, "getByRole('{}', {{ name: /{}/i }})", role, r)
            }
            Segment::Text { text } => write!(f, "getByText({})", text.describe()),
            Segment::HasText { text: TextMatch::Exact(s) } => {
                write!(f, "filter({{ hasText: /^{}$/ }})", s)
            }
            Segment::HasText { text } => write!(f, "filter({{ hasText: {} }})", text.describe()),
            Segment::Nth { index: 0 } => write!(f, "first()"),
            Segment::Nth { index } => write!(f, "nth({})", index),
        }
    }
}

/// A deferred, immutable reference to zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    fn root(segment: Segment) -> Self {
        Self { segments: vec![segment] }
    }

    fn push(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// `page.locator(css)`
    pub fn css(selector: impl Into<String>) -> Self {
        Self::root(Segment::Css { selector: selector.into() })
    }

    /// `page.locator('#id')`
    pub fn id(id: &str) -> Self {
        Self::css(format!("#{}", id))
    }

    /// `page.locator('[data-test="..."]')`
    pub fn test_id(value: &str) -> Self {
        Self::css(format!("[data-test=\"{}\"]", value))
    }

    /// `page.getByRole(role)`
    pub fn role(role: impl Into<String>) -> Self {
        Self::root(Segment::Role { role: role.into(), name: None })
    }

    /// `page.getByRole(role, { name })`, substring match on the accessible name.
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::root(Segment::Role {
            role: role.into(),
            name: Some(TextMatch::Substring(name.into())),
        })
    }

    /// `page.getByRole(role, { name, exact: true })`
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::root(Segment::Role {
            role: role.into(),
            name: Some(TextMatch::Exact(name.into())),
        })
    }

    /// `page.getByRole(role, { name: /pattern/i })`
    pub fn role_matching(role: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::root(Segment::Role {
            role: role.into(),
            name: Some(TextMatch::Regex(pattern.into())),
        })
    }

    /// `page.getByText(text)`
    pub fn text(text: impl Into<String>) -> Self {
        Self::root(Segment::Text { text: TextMatch::Substring(text.into()) })
    }

    /// `page.getByText(text, { exact: true })`
    pub fn text_exact(text: impl Into<String>) -> Self {
        Self::root(Segment::Text { text: TextMatch::Exact(text.into()) })
    }

    /// Scope a CSS selector inside this locator.
    pub fn locator(self, selector: impl Into<String>) -> Self {
        self.push(Segment::Css { selector: selector.into() })
    }

    /// Scope a role query inside this locator.
    pub fn get_by_role(self, role: impl Into<String>, name: Option<TextMatch>) -> Self {
        self.push(Segment::Role { role: role.into(), name })
    }

    /// Keep only elements whose text matches.
    pub fn filter_text(self, text: TextMatch) -> Self {
        self.push(Segment::HasText { text })
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn nth(self, index: usize) -> Self {
        self.push(Segment::Nth { index })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_like_playwright() {
        let loc = Locator::css(".ant-modal-body")
            .get_by_role("button", Some(TextMatch::Substring("Create Performance Review".into())));
        assert_eq!(
            loc.to_string(),
            "locator('.ant-modal-body').getByRole('button', { name: 'Create Performance Review' })"
        );

        let loc = Locator::css("div")
            .filter_text(TextMatch::Regex("^Search Reviewer$".into()))
            .nth(2);
        assert_eq!(loc.to_string(), "locator('div').filter({ hasText: /^Search Reviewer$/ }).nth(2)");

        assert_eq!(Locator::role("switch").first().to_string(), "getByRole('switch').first()");
    }

    #[test]
    fn serializes_as_segment_chain() {
        let loc = Locator::role_exact("link", "Reviews");
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "kind": "role", "role": "link", "name": { "mode": "exact", "value": "Reviews" } }
            ])
        );

        let back: Locator = serde_json::from_value(json).unwrap();
        assert_eq!(back, loc);
    }

    #[test]
    fn builders_do_not_share_state() {
        let base = Locator::role("switch");
        let a = base.clone().nth(1);
        let b = base.clone().nth(4);
        assert_eq!(base.segments().len(), 1);
        assert_ne!(a, b);
    }
}
