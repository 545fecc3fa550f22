//! Condition-based assertions
//!
//! Each assertion re-queries the page until the condition holds or the
//! timeout elapses, then fails with the last value it observed.

use std::future::Future;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::time::sleep;

use crate::driver::{Page, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;

/// Default timeout for assertions (5 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Interval between re-checks (100ms)
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one probe of the page.
pub enum Probe<T> {
    Done(T),
    Pending(String),
}

/// Re-run `probe` until it reports `Done` or `timeout` elapses.
///
/// On timeout returns `Err(last observation)` inside `Ok`, so callers can
/// choose the error kind. Driver errors abort immediately.
pub async fn poll_until<T, F, Fut>(timeout: Duration, mut probe: F) -> E2eResult<Result<T, String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Probe<T>>>,
{
    let start = Instant::now();
    loop {
        let observed = match probe().await? {
            Probe::Done(value) => return Ok(Ok(value)),
            Probe::Pending(observed) => observed,
        };
        if start.elapsed() >= timeout {
            return Ok(Err(observed));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Wait for a page marker; a miss means the flow is on the wrong page or step.
pub async fn marker<P: Page + ?Sized>(page: &P, locator: &Locator, timeout: Duration) -> E2eResult<()> {
    match page.wait_for(locator, WaitState::Visible, timeout).await {
        Err(E2eError::Timeout(_)) => Err(E2eError::Precondition {
            marker: locator.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
        other => other,
    }
}

/// Entry point: `expect(page, locator).to_be_visible().await`
pub fn expect<P: Page + ?Sized>(page: &P, locator: Locator) -> Expect<'_, P> {
    Expect {
        page,
        locator,
        timeout: DEFAULT_TIMEOUT,
    }
}

pub struct Expect<'a, P: Page + ?Sized> {
    page: &'a P,
    locator: Locator,
    timeout: Duration,
}

impl<'a, P: Page + ?Sized> Expect<'a, P> {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fail(&self, what: &str, observed: &str) -> E2eError {
        E2eError::AssertionFailed(format!(
            "expected {} {} within {} ms, observed {}",
            self.locator,
            what,
            self.timeout.as_millis(),
            observed
        ))
    }

    async fn wait_state(&self, state: WaitState) -> E2eResult<()> {
        match self.page.wait_for(&self.locator, state, self.timeout).await {
            Err(E2eError::Timeout(_)) => Err(self.fail(&format!("to be {}", state.as_str()), "otherwise")),
            other => other,
        }
    }

    pub async fn to_be_visible(&self) -> E2eResult<()> {
        self.wait_state(WaitState::Visible).await
    }

    pub async fn to_be_hidden(&self) -> E2eResult<()> {
        self.wait_state(WaitState::Hidden).await
    }

    pub async fn to_be_attached(&self) -> E2eResult<()> {
        self.wait_state(WaitState::Attached).await
    }

    pub async fn to_have_count(&self, expected: usize) -> E2eResult<()> {
        let (page, locator) = (self.page, &self.locator);
        let outcome = poll_until(self.timeout, move || async move {
            let count = page.count(locator).await?;
            Ok(if count == expected {
                Probe::Done(())
            } else {
                Probe::Pending(format!("count {}", count))
            })
        })
        .await?;
        outcome.map_err(|observed| self.fail(&format!("to have count {}", expected), &observed))
    }

    /// Wait until at least `min` elements match; returns the count seen.
    pub async fn count_at_least(&self, min: usize) -> E2eResult<usize> {
        let (page, locator) = (self.page, &self.locator);
        let outcome = poll_until(self.timeout, move || async move {
            let count = page.count(locator).await?;
            Ok(if count >= min {
                Probe::Done(count)
            } else {
                Probe::Pending(format!("count {}", count))
            })
        })
        .await?;
        outcome.map_err(|observed| self.fail(&format!("to have at least {} match(es)", min), &observed))
    }

    async fn text_probe(&self, matches: impl Fn(&str) -> bool) -> E2eResult<Result<(), String>> {
        let (page, locator, matches) = (self.page, &self.locator, &matches);
        poll_until(self.timeout, move || async move {
            match page.inner_text(locator).await {
                Ok(text) if matches(text.trim()) => Ok(Probe::Done(())),
                Ok(text) => Ok(Probe::Pending(format!("text '{}'", text.trim()))),
                Err(E2eError::ElementNotFound { .. }) => Ok(Probe::Pending("no element".to_string())),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn to_have_text(&self, expected: &str) -> E2eResult<()> {
        self.text_probe(|text| text == expected)
            .await?
            .map_err(|observed| self.fail(&format!("to have text '{}'", expected), &observed))
    }

    pub async fn to_contain_text(&self, expected: &str) -> E2eResult<()> {
        self.text_probe(|text| text.contains(expected))
            .await?
            .map_err(|observed| self.fail(&format!("to contain text '{}'", expected), &observed))
    }

    pub async fn to_have_value(&self, expected: &str) -> E2eResult<()> {
        let (page, locator) = (self.page, &self.locator);
        let outcome = poll_until(self.timeout, move || async move {
            match page.input_value(locator).await {
                Ok(value) if value == expected => Ok(Probe::Done(())),
                Ok(value) => Ok(Probe::Pending(format!("value '{}'", value))),
                Err(E2eError::ElementNotFound { .. }) => Ok(Probe::Pending("no element".to_string())),
                Err(e) => Err(e),
            }
        })
        .await?;
        outcome.map_err(|observed| self.fail(&format!("to have value '{}'", expected), &observed))
    }

    async fn enabled_probe(&self, want: bool) -> E2eResult<Result<(), String>> {
        let (page, locator) = (self.page, &self.locator);
        poll_until(self.timeout, move || async move {
            if page.count(locator).await? == 0 {
                return Ok(Probe::Pending("no element".to_string()));
            }
            let enabled = page.is_enabled(locator).await?;
            Ok(if enabled == want {
                Probe::Done(())
            } else if enabled {
                Probe::Pending("enabled".to_string())
            } else {
                Probe::Pending("disabled".to_string())
            })
        })
        .await
    }

    pub async fn to_be_enabled(&self) -> E2eResult<()> {
        self.enabled_probe(true)
            .await?
            .map_err(|observed| self.fail("to be enabled", &observed))
    }

    pub async fn to_be_disabled(&self) -> E2eResult<()> {
        self.enabled_probe(false)
            .await?
            .map_err(|observed| self.fail("to be disabled", &observed))
    }

    pub async fn to_have_attribute(&self, name: &str, expected: &str) -> E2eResult<()> {
        let (page, locator) = (self.page, &self.locator);
        let outcome = poll_until(self.timeout, move || async move {
            match page.get_attribute(locator, name).await {
                Ok(Some(value)) if value == expected => Ok(Probe::Done(())),
                Ok(Some(value)) => Ok(Probe::Pending(format!("{}='{}'", name, value))),
                Ok(None) => Ok(Probe::Pending(format!("no {} attribute", name))),
                Err(E2eError::ElementNotFound { .. }) => Ok(Probe::Pending("no element".to_string())),
                Err(e) => Err(e),
            }
        })
        .await?;
        outcome.map_err(|observed| self.fail(&format!("to have {}='{}'", name, expected), &observed))
    }
}

/// Wait until the page URL matches `pattern`.
pub async fn expect_url<P: Page + ?Sized>(page: &P, pattern: &Regex, timeout: Duration) -> E2eResult<()> {
    let outcome = poll_until(timeout, move || async move {
        let url = page.url().await?;
        Ok(if pattern.is_match(&url) {
            Probe::Done(())
        } else {
            Probe::Pending(url)
        })
    })
    .await?;
    outcome.map_err(|url| {
        E2eError::AssertionFailed(format!("expected URL matching /{}/, got {}", pattern, url))
    })
}

/// Wait until the page URL no longer contains `fragment`.
pub async fn expect_url_not_containing<P: Page + ?Sized>(
    page: &P,
    fragment: &str,
    timeout: Duration,
) -> E2eResult<()> {
    let outcome = poll_until(timeout, move || async move {
        let url = page.url().await?;
        Ok(if url.contains(fragment) {
            Probe::Pending(url)
        } else {
            Probe::Done(())
        })
    })
    .await?;
    outcome.map_err(|url| {
        E2eError::AssertionFailed(format!("expected URL without '{}', got {}", fragment, url))
    })
}

pub async fn expect_title<P: Page + ?Sized>(page: &P, pattern: &Regex, timeout: Duration) -> E2eResult<()> {
    let outcome = poll_until(timeout, move || async move {
        let title = page.title().await?;
        Ok(if pattern.is_match(&title) {
            Probe::Done(())
        } else {
            Probe::Pending(title)
        })
    })
    .await?;
    outcome.map_err(|title| {
        E2eError::AssertionFailed(format!("expected title matching /{}/, got '{}'", pattern, title))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakePage;
    use crate::error::FailureKind;

    const SHORT: Duration = Duration::from_millis(150);

    #[tokio::test]
    async fn count_assertion_reports_last_observation() {
        let page = FakePage::new();
        let items = Locator::css(".cart_item");
        page.with_state(|s| s.show(&items).count = 2);

        expect(&page, items.clone()).timeout(SHORT).to_have_count(2).await.unwrap();

        let err = expect(&page, items).timeout(SHORT).to_have_count(1).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::AssertionFailed);
        assert!(err.to_string().contains("observed count 2"), "{}", err);
    }

    #[tokio::test]
    async fn text_assertions_trim_and_tolerate_missing_elements() {
        let page = FakePage::new();
        let title = Locator::css(".title");

        let err = expect(&page, title.clone()).timeout(SHORT).to_have_text("Products").await.unwrap_err();
        assert!(err.to_string().contains("no element"));

        page.with_state(|s| s.show(&title).text = " Products \n".to_string());
        expect(&page, title.clone()).timeout(SHORT).to_have_text("Products").await.unwrap();
        expect(&page, title).timeout(SHORT).to_contain_text("Prod").await.unwrap();
    }

    #[tokio::test]
    async fn disabled_and_value_checks() {
        let page = FakePage::new();
        let button = Locator::id("login-button");
        page.with_state(|s| s.show(&button).enabled = false);

        expect(&page, button.clone()).timeout(SHORT).to_be_disabled().await.unwrap();
        assert!(expect(&page, button).timeout(SHORT).to_be_enabled().await.is_err());

        let input = Locator::id("user-name");
        page.show(&input);
        expect(&page, input).timeout(SHORT).to_have_value("").await.unwrap();
    }

    #[tokio::test]
    async fn marker_miss_is_a_precondition_failure() {
        let page = FakePage::new();
        let err = marker(&page, &Locator::text("Configure steps"), SHORT).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Precondition);
    }

    #[tokio::test]
    async fn url_expectations() {
        let page = FakePage::new();
        page.goto("https://www.saucedemo.com/inventory.html").await.unwrap();

        expect_url(&page, &Regex::new("inventory.html").unwrap(), SHORT).await.unwrap();
        expect_url_not_containing(&page, "checkout-complete.html", SHORT).await.unwrap();
        let err = expect_url(&page, &Regex::new("cart.html").unwrap(), SHORT).await.unwrap_err();
        assert!(err.to_string().contains("inventory.html"));
    }
}
