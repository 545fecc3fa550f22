//! Scenario runner: executes suites against pages from a [`PageFactory`]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::UiflowConfig;
use crate::driver::{Page, PageFactory};
use crate::error::{E2eError, E2eResult};
use crate::expect::{expect, expect_url, expect_url_not_containing, DEFAULT_TIMEOUT};
use crate::flows::storefront::StorefrontFlow;
use crate::flows::{ReviewCycleFlow, ReviewerMapping};
use crate::registry::{Pick, StorefrontElement};
use crate::spec::{Filter, ReviewCall, StoreCall, SuiteSpec, TestSpec, TestStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    /// Failure classification, e.g. `precondition` or `timeout`
    pub failure_kind: Option<String>,
    /// Innermost flow operation that failed
    pub failed_operation: Option<String>,
}

impl TestResult {
    fn skipped(suite: &SuiteSpec, test: &TestSpec, reason: &str) -> Self {
        Self {
            suite: suite.name.clone(),
            name: test.name.clone(),
            status: TestStatus::Skipped,
            duration_ms: 0,
            steps: vec![],
            error: Some(reason.to_string()),
            failure_kind: None,
            failed_operation: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main scenario runner
pub struct TestRunner {
    factory: Arc<dyn PageFactory>,
    config: UiflowConfig,
    filter: Filter,
}

impl TestRunner {
    pub fn new(factory: Arc<dyn PageFactory>, config: UiflowConfig) -> Self {
        Self {
            factory,
            config,
            filter: Filter::default(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &UiflowConfig {
        &self.config
    }

    /// Load, filter and run every suite in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let suites = SuiteSpec::load_all(&self.config.runner.specs_dir)?;
        for suite in &suites {
            suite.validate()?;
        }
        let suites = self.filter.apply(suites);
        self.run_suites(&suites).await
    }

    /// Run a list of suites
    pub async fn run_suites(&self, suites: &[SuiteSpec]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let total: usize = suites.iter().map(|s| s.tests.len()).sum();

        info!("Running {} test(s) in {} suite(s) [run {}]", total, suites.len(), run_id);

        let mut results = Vec::with_capacity(total);
        for suite in suites {
            results.extend(self.run_suite(suite).await);
        }

        let passed = results.iter().filter(|r| r.status == TestStatus::Passed).count();
        let failed = results.iter().filter(|r| r.status == TestStatus::Failed).count();
        let skipped = results.iter().filter(|r| r.status == TestStatus::Skipped).count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            run_id,
            started_at,
            total,
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run one suite. Serial suites stop at the first failure and report the
    /// remaining tests as skipped.
    pub async fn run_suite(&self, suite: &SuiteSpec) -> Vec<TestResult> {
        info!("Suite: {} ({} test(s))", suite.name, suite.tests.len());

        if suite.serial {
            let mut results = Vec::with_capacity(suite.tests.len());
            let mut broken: Option<String> = None;
            for test in &suite.tests {
                if let Some(failed) = &broken {
                    let reason = format!("skipped after '{}' failed", failed);
                    warn!("- {} ({})", test.name, reason);
                    results.push(TestResult::skipped(suite, test, &reason));
                    continue;
                }
                let result = self.run_test(suite, test).await;
                if !result.passed() {
                    broken = Some(test.name.clone());
                }
                results.push(result);
            }
            return results;
        }

        let workers = self.config.runner.workers.max(1);
        stream::iter(suite.tests.iter())
            .map(|test| self.run_test(suite, test))
            .buffered(workers)
            .collect()
            .await
    }

    /// Run a single test on a fresh page
    pub async fn run_test(&self, suite: &SuiteSpec, test: &TestSpec) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {} / {}", suite.name, test.name);

        let viewport = suite.viewport.unwrap_or(self.config.browser.viewport);
        let limit = Duration::from_millis(
            test.timeout_ms
                .or(suite.timeout_ms)
                .unwrap_or(self.config.runner.default_test_timeout_ms),
        );

        let mut steps = Vec::new();
        let outcome = match self.factory.new_page(viewport).await {
            Ok(page) => {
                let ctx = StepContext::new(&*page, suite, &self.config);
                let ran = tokio::time::timeout(limit, ctx.run(suite, test, &mut steps)).await;
                if let Err(e) = page.close().await {
                    warn!("Failed to close page for '{}': {}", test.name, e);
                }
                match ran {
                    Ok(result) => result,
                    Err(_) => Err(E2eError::Timeout(format!(
                        "test '{}' exceeded {} ms",
                        test.name,
                        limit.as_millis()
                    ))),
                }
            }
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => {
                info!("✓ {} ({} ms)", test.name, duration_ms);
                TestResult {
                    suite: suite.name.clone(),
                    name: test.name.clone(),
                    status: TestStatus::Passed,
                    duration_ms,
                    steps,
                    error: None,
                    failure_kind: None,
                    failed_operation: None,
                }
            }
            Err(e) => {
                error!("✗ {} - {}", test.name, e);
                TestResult {
                    suite: suite.name.clone(),
                    name: test.name.clone(),
                    status: TestStatus::Failed,
                    duration_ms,
                    steps,
                    error: Some(e.to_string()),
                    failure_kind: Some(e.kind().as_str().to_string()),
                    failed_operation: e.operation().map(str::to_string),
                }
            }
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        let output_dir = &self.config.runner.output_dir;
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Everything a step needs: the page, the suite's base URL and the config.
struct StepContext<'a> {
    page: &'a dyn Page,
    base_url: String,
    config: &'a UiflowConfig,
}

impl<'a> StepContext<'a> {
    fn new(page: &'a dyn Page, suite: &SuiteSpec, config: &'a UiflowConfig) -> Self {
        let base_url = suite
            .base_url
            .as_deref()
            .map(|b| config.targets.expand(b))
            .unwrap_or_else(|| config.targets.storefront_url.clone());
        Self { page, base_url, config }
    }

    async fn run(&self, suite: &SuiteSpec, test: &TestSpec, results: &mut Vec<StepResult>) -> E2eResult<()> {
        for step in suite.before_each.iter().chain(test.steps.iter()) {
            let start = Instant::now();
            let step_name = step.name();
            debug!("Executing step: {}", step_name);

            let outcome = self.execute(step).await;
            results.push(StepResult {
                step_name: step_name.clone(),
                success: outcome.is_ok(),
                duration_ms: start.elapsed().as_millis() as u64,
                error: outcome.as_ref().err().map(|e| e.to_string()),
            });
            outcome?;
        }
        Ok(())
    }

    fn action_timeout(&self, timeout_ms: Option<u64>) -> Duration {
        timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.flow.action())
    }

    fn url(&self, url: &str) -> String {
        let url = self.config.targets.expand(url);
        if url.starts_with("http://") || url.starts_with("https://") {
            return url;
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    async fn execute(&self, step: &TestStep) -> E2eResult<()> {
        let page = self.page;
        match step {
            TestStep::Navigate { url } => page.goto(&self.url(url)).await,
            TestStep::Click { target, timeout_ms } => {
                page.click(&target.resolve()?, self.action_timeout(*timeout_ms)).await
            }
            TestStep::Fill { target, value, timeout_ms } => {
                page.fill(&target.resolve()?, value, self.action_timeout(*timeout_ms))
                    .await
            }
            TestStep::Hover { target } => {
                page.hover(&target.resolve()?, self.action_timeout(None)).await
            }
            TestStep::Wait { target, state, timeout_ms } => {
                page.wait_for(&target.resolve()?, *state, Duration::from_millis(*timeout_ms))
                    .await
            }
            TestStep::Expect {
                target,
                visible,
                text,
                contains_text,
                value,
                count,
                enabled,
                attribute,
                timeout_ms,
            } => {
                let timeout = timeout_ms.map(Duration::from_millis).unwrap_or(DEFAULT_TIMEOUT);
                let check = expect(page, target.resolve()?).timeout(timeout);
                match visible {
                    Some(true) => check.to_be_visible().await?,
                    Some(false) => check.to_be_hidden().await?,
                    None => {}
                }
                if let Some(text) = text {
                    check.to_have_text(text).await?;
                }
                if let Some(fragment) = contains_text {
                    check.to_contain_text(fragment).await?;
                }
                if let Some(value) = value {
                    check.to_have_value(value).await?;
                }
                if let Some(count) = count {
                    check.to_have_count(*count).await?;
                }
                match enabled {
                    Some(true) => check.to_be_enabled().await?,
                    Some(false) => check.to_be_disabled().await?,
                    None => {}
                }
                if let Some(attribute) = attribute {
                    check.to_have_attribute(&attribute.name, &attribute.value).await?;
                }
                Ok(())
            }
            TestStep::ExpectUrl { matches, not_contains, timeout_ms } => {
                let timeout = timeout_ms.map(Duration::from_millis).unwrap_or(DEFAULT_TIMEOUT);
                if let Some(pattern) = matches {
                    let pattern = Regex::new(&self.config.targets.expand(pattern))?;
                    expect_url(page, &pattern, timeout).await?;
                }
                if let Some(fragment) = not_contains {
                    expect_url_not_containing(page, fragment, timeout).await?;
                }
                Ok(())
            }
            TestStep::Reload => page.reload().await,
            TestStep::GoBack => page.go_back().await,
            TestStep::Viewport(viewport) => page.set_viewport(*viewport).await,
            TestStep::Log { message } => {
                info!("[TEST LOG] {}", message);
                Ok(())
            }
            TestStep::ReviewCycle(call) => self.review_cycle(call).await,
            TestStep::Storefront(call) => self.storefront(call).await,
        }
    }

    async fn review_cycle(&self, call: &ReviewCall) -> E2eResult<()> {
        let flow = ReviewCycleFlow::with_timeouts(self.page, self.config.flow);
        match call {
            ReviewCall::NavigateToReviews => flow.navigate_to_reviews().await,
            ReviewCall::StartNewCycle => flow.start_new_cycle().await,
            ReviewCall::FillTitle { title } => flow.fill_title(title).await,
            ReviewCall::ConfigureReviews(options) => flow.configure_reviews(*options).await,
            ReviewCall::ConfigureGoals => flow.configure_goals().await,
            ReviewCall::CreateSelfReviewForm => flow.create_self_review_form().await,
            ReviewCall::CreatePeerReviewForm => flow.create_peer_review_form().await,
            ReviewCall::AddReviewees { count } => flow.add_reviewees(*count).await,
            ReviewCall::AddReviewerMapping { reviewer, reviewee } => {
                let defaults = ReviewerMapping::default();
                let mapping = ReviewerMapping {
                    reviewer: reviewer.as_deref().map(Pick::parse).unwrap_or(defaults.reviewer),
                    reviewee: reviewee.as_deref().map(Pick::parse).unwrap_or(defaults.reviewee),
                };
                flow.add_reviewer_mapping_with(mapping).await
            }
            ReviewCall::SaveAsDraft { title } => flow.save_as_draft(title.as_deref()).await,
            ReviewCall::GoToStep { step } => flow.go_to_step(*step).await,
            ReviewCall::GoToVerifyStep => flow.go_to_verify_step().await,
            ReviewCall::OpenDraft { title } => flow.open_draft(title.as_deref()).await,
            ReviewCall::VerifyFormHasQuestions => flow.verify_form_has_questions().await,
            ReviewCall::EditForm => flow.edit_form().await,
            ReviewCall::CreateReviewCycleExplicitly => flow.create_review_cycle_explicitly().await,
            ReviewCall::VerifyPhaseStatus { status } => flow.verify_phase_status(status).await,
            ReviewCall::ExitCreationFlow => flow.exit_creation_flow().await,
        }
    }

    async fn storefront(&self, call: &StoreCall) -> E2eResult<()> {
        let flow = StorefrontFlow::with_base_url(self.page, &self.base_url, self.config.flow);
        let page = self.page;
        match call {
            StoreCall::OpenLoginPage => flow.open_login_page().await,
            StoreCall::Login { username, password } => flow.login(username, password).await,
            StoreCall::LoginStandardUser => flow.login_standard_user().await,
            StoreCall::ExpectLoginError { contains } => {
                let text = flow.login_error_text().await?;
                if text.contains(contains.as_str()) {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "expected login error containing '{}', got '{}'",
                        contains, text
                    )))
                }
            }
            StoreCall::AddFirstProduct => flow.add_first_product().await,
            StoreCall::OpenCart => flow.open_cart().await,
            StoreCall::RemoveFirstFromCart => flow.remove_first_from_cart().await,
            StoreCall::ExpectCartCount { count } => {
                expect(page, StorefrontElement::CartItem.locator())
                    .to_have_count(*count)
                    .await
            }
            StoreCall::ExpectCartBadge { text } => {
                let badge = expect(page, StorefrontElement::CartBadge.locator());
                match text {
                    Some(text) => badge.to_have_text(text).await,
                    None => badge.to_be_hidden().await,
                }
            }
            StoreCall::OpenFirstProduct => flow.open_first_product().await,
            StoreCall::BackToProducts => flow.back_to_products().await,
            StoreCall::ProceedToCheckout => flow.proceed_to_checkout().await,
            StoreCall::FillCheckoutInfo(info) => flow.fill_checkout_info(info).await,
            StoreCall::ContinueCheckout => flow.continue_checkout().await,
            StoreCall::FinishOrder => flow.finish_order().await,
            StoreCall::CompleteOrder(info) => flow.complete_order(info).await,
            StoreCall::OpenMenu => flow.open_menu().await,
            StoreCall::CloseMenu => flow.close_menu().await,
            StoreCall::Logout => flow.logout().await,
            StoreCall::ScrollToFooter => flow.scroll_to_footer().await,
            StoreCall::ExpectSocialHref { network, contains } => {
                let href = flow.social_link_href(*network).await?;
                if href.contains(contains.as_str()) {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "expected {:?} link to contain '{}', got '{}'",
                        network, contains, href
                    )))
                }
            }
            StoreCall::ExpectSocialPopup { network, not_contains } => {
                let url = flow.open_social_link(*network).await?;
                if url.contains(not_contains.as_str()) {
                    Err(E2eError::AssertionFailed(format!(
                        "{:?} link opened '{}', which contains '{}'",
                        network, url, not_contains
                    )))
                } else {
                    Ok(())
                }
            }
            StoreCall::ExpectCentered { child, parent, tolerance_px } => {
                let (child, parent) = (child.resolve()?, parent.resolve()?);
                expect(page, child.clone()).to_be_visible().await?;
                let offset = flow.horizontal_center_offset(&child, &parent).await?;
                if offset <= *tolerance_px {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "{} is {:.1}px off the center of {} (tolerance {}px)",
                        child, offset, parent, tolerance_px
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::driver::fake::{Action, FakeFactory, FakePage};
    use crate::error::FailureKind;
    use crate::registry::ReviewCycleElement;

    fn runner(page: &FakePage, config: UiflowConfig) -> (TestRunner, Arc<Mutex<usize>>) {
        let created = Arc::new(Mutex::new(0));
        let factory = FakeFactory {
            page: page.clone(),
            created: created.clone(),
        };
        (TestRunner::new(Arc::new(factory), config), created)
    }

    fn fast_config() -> UiflowConfig {
        let mut config = UiflowConfig::default();
        config.flow.marker_ms = 150;
        config.flow.action_ms = 150;
        config.flow.settle_ms = 150;
        config
    }

    const SERIAL: &str = r##"
name: review cycle drafts
serial: true
base_url: "${review_url}"
tests:
  - name: first
    steps:
      - action: log
        message: hello
  - name: second
    steps:
      - action: click
        selector: "#missing"
        timeout_ms: 100
  - name: third
    steps:
      - action: reload
"##;

    #[tokio::test]
    async fn serial_suite_skips_after_first_failure() {
        let page = FakePage::new();
        let (runner, created) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(SERIAL).unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();

        assert_eq!((result.passed, result.failed, result.skipped), (1, 1, 1));
        assert!(!result.success());
        let statuses: Vec<_> = result.results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [TestStatus::Passed, TestStatus::Failed, TestStatus::Skipped]);
        assert_eq!(result.results[1].failure_kind.as_deref(), Some("not_found"));
        assert!(result.results[2].error.as_deref().unwrap().contains("'second'"));
        assert_eq!(*created.lock(), 2);
        assert!(!page.actions().contains(&Action::Reload));
    }

    #[tokio::test]
    async fn independent_tests_all_run() {
        let page = FakePage::new();
        let mut config = fast_config();
        config.runner.workers = 2;
        let (runner, created) = runner(&page, config);
        let suite = SuiteSpec::from_yaml(&SERIAL.replace("serial: true", "serial: false")).unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();

        assert_eq!((result.passed, result.failed, result.skipped), (2, 1, 0));
        let names: Vec<_> = result.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(*created.lock(), 3);
    }

    #[tokio::test]
    async fn before_each_runs_on_every_page_and_urls_resolve() {
        let page = FakePage::new();
        page.show(&StorefrontElement::Title.locator());
        let (runner, _) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(
            r#"
name: nav
base_url: "${storefront_url}"
before_each:
  - action: navigate
    url: /inventory.html
tests:
  - name: a
    steps:
      - action: expect
        locator: store.title
        visible: true
  - name: b
    steps:
      - action: navigate
        url: https://example.test/abs
"#,
        )
        .unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();
        assert!(result.success());

        let gotos: Vec<_> = page
            .actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Goto(url) => Some(url),
                _ => None,
            })
            .collect();
        assert_eq!(
            gotos,
            [
                "https://www.saucedemo.com/inventory.html",
                "https://www.saucedemo.com/inventory.html",
                "https://example.test/abs",
            ]
        );
        assert_eq!(result.results[0].steps.len(), 2);
    }

    #[tokio::test]
    async fn flow_failures_report_kind_and_operation() {
        let page = FakePage::new();
        let (runner, _) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(
            r#"
name: review
base_url: "${review_url}"
tests:
  - name: navigate
    steps:
      - action: review_cycle
        call: navigate_to_reviews
"#,
        )
        .unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();
        let failed = &result.results[0];
        assert_eq!(failed.failure_kind.as_deref(), Some(FailureKind::Precondition.as_str()));
        assert_eq!(failed.failed_operation.as_deref(), Some("navigate_to_reviews"));
        assert!(failed.error.as_deref().unwrap().starts_with("Failed to navigate to reviews"));
    }

    #[tokio::test]
    async fn slow_tests_hit_the_test_timeout() {
        let page = FakePage::new();
        let (runner, _) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(
            r#"
name: slow
tests:
  - name: waits too long
    timeout_ms: 50
    steps:
      - action: expect
        selector: ".never"
        visible: true
        timeout_ms: 2000
"#,
        )
        .unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();
        let failed = &result.results[0];
        assert_eq!(failed.status, TestStatus::Failed);
        assert_eq!(failed.failure_kind.as_deref(), Some("timeout"));
        assert!(failed.error.as_deref().unwrap().contains("exceeded 50 ms"));
        assert!(failed.duration_ms < 2000, "took {} ms", failed.duration_ms);
    }

    const EXIT_WITHOUT_SAVING: &str = r#"
name: exit
base_url: "${review_url}"
tests:
  - name: leaves no draft behind
    steps:
      - action: review_cycle
        call: exit_creation_flow
      - action: review_cycle
        call: navigate_to_reviews
      - action: expect
        locator: review.draft_title
        params: ["TC08 Exit Test Cycle"]
        count: 0
        timeout_ms: 300
"#;

    fn open_wizard_page() -> FakePage {
        let page = FakePage::new();
        let close = ReviewCycleElement::CloseModalButton.locator();
        let layout = ReviewCycleElement::CreationLayout.locator();
        let save = ReviewCycleElement::SaveAsDraftButton.locator();
        let draft = ReviewCycleElement::DraftTitle("TC08 Exit Test Cycle".to_string()).locator();
        for el in [&close, &layout, &save] {
            page.show(el);
        }
        page.show(&ReviewCycleElement::ReviewsNav.locator());
        page.on_click(&close, move |s| s.hide(&layout));
        page.on_click(&save, move |s| {
            s.show(&draft);
        });
        page
    }

    #[tokio::test]
    async fn exiting_the_wizard_leaves_no_draft() {
        let page = open_wizard_page();
        let (runner, _) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(EXIT_WITHOUT_SAVING).unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();

        assert!(result.success(), "{:?}", result.results[0].error);
        assert_eq!(page.clicked(&ReviewCycleElement::SaveAsDraftButton.locator()), 0);
    }

    #[tokio::test]
    async fn leftover_draft_fails_the_exit_check() {
        let page = open_wizard_page();
        page.show(&ReviewCycleElement::DraftTitle("TC08 Exit Test Cycle".to_string()).locator());
        let (runner, _) = runner(&page, fast_config());
        let suite = SuiteSpec::from_yaml(EXIT_WITHOUT_SAVING).unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();

        let failed = &result.results[0];
        assert_eq!(failed.status, TestStatus::Failed);
        assert_eq!(failed.failure_kind.as_deref(), Some("assertion_failed"));
    }

    #[tokio::test]
    async fn results_are_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::new();
        let mut config = fast_config();
        config.runner.output_dir = dir.path().join("out");
        let (runner, _) = runner(&page, config);
        let suite = SuiteSpec::from_yaml(SERIAL).unwrap();

        let result = runner.run_suites(&[suite]).await.unwrap();
        let path = runner.write_results(&result).unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["run_id"], result.run_id.to_string());
        assert_eq!(written["results"][2]["status"], "skipped");
        assert_eq!(written["total"], 3);
    }
}
