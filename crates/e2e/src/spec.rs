//! Declarative YAML scenario suites

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::driver::{Viewport, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::flows::review_cycle::DEFAULT_REVIEWEES;
use crate::flows::{CheckoutInfo, ReviewOptions, SocialNetwork, WizardStep};
use crate::locator::Locator;
use crate::registry;

/// A suite of related test cases parsed from one YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering; every test inherits them
    #[serde(default)]
    pub tags: Vec<String>,

    /// Base for relative `navigate` URLs. `${storefront_url}` and
    /// `${review_url}` expand to the configured targets.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Run tests in order and skip the rest after the first failure.
    #[serde(default)]
    pub serial: bool,

    /// Per-test timeout for every test in the suite
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Steps run before each test, on the test's own page
    #[serde(default)]
    pub before_each: Vec<TestStep>,

    pub tests: Vec<TestSpec>,

    /// File the suite was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    pub steps: Vec<TestStep>,
}

/// Element addressed by registry name or raw CSS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    #[serde(default, deserialize_with = "scalars", skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl Target {
    pub fn resolve(&self) -> E2eResult<Locator> {
        let base = match (&self.locator, &self.selector) {
            (Some(name), None) => registry::resolve(name, &self.params)?,
            (None, Some(css)) => Locator::css(css.clone()),
            (Some(_), Some(_)) => {
                return Err(E2eError::SpecParse(
                    "target has both 'locator' and 'selector'".to_string(),
                ))
            }
            (None, None) => {
                return Err(E2eError::SpecParse(
                    "target needs 'locator' or 'selector'".to_string(),
                ))
            }
        };
        Ok(match self.nth {
            Some(index) => base.nth(index),
            None => base,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.locator, &self.selector) {
            (Some(name), _) if self.params.is_empty() => write!(f, "{}", name)?,
            (Some(name), _) => write!(f, "{}({})", name, self.params.join(", "))?,
            (None, Some(css)) => write!(f, "{}", css)?,
            (None, None) => write!(f, "?")?,
        }
        if let Some(index) = self.nth {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

/// Registry parameters may be written as bare YAML numbers.
fn scalars<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    let raw = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|s| match s {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: String,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL, absolute or relative to the suite base
    Navigate { url: String },

    Click {
        #[serde(flatten)]
        target: Target,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    Fill {
        #[serde(flatten)]
        target: Target,
        value: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    Hover {
        #[serde(flatten)]
        target: Target,
    },

    /// Wait for an element to reach a state
    Wait {
        #[serde(flatten)]
        target: Target,
        #[serde(default)]
        state: WaitState,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Assert something about an element
    Expect {
        #[serde(flatten)]
        target: Target,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        contains_text: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert on the page URL
    ExpectUrl {
        #[serde(default)]
        matches: Option<String>,
        #[serde(default)]
        not_contains: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    Reload,

    GoBack,

    Viewport(Viewport),

    /// Log a message (for debugging)
    Log { message: String },

    ReviewCycle(ReviewCall),

    Storefront(StoreCall),
}

fn default_wait_timeout() -> u64 {
    5000
}

fn default_reviewees() -> usize {
    DEFAULT_REVIEWEES
}

fn default_tolerance() -> f64 {
    5.0
}

/// Review-cycle flow operations callable from a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ReviewCall {
    NavigateToReviews,
    StartNewCycle,
    FillTitle { title: String },
    ConfigureReviews(ReviewOptions),
    ConfigureGoals,
    CreateSelfReviewForm,
    CreatePeerReviewForm,
    AddReviewees {
        #[serde(default = "default_reviewees")]
        count: usize,
    },
    /// Positions 0 and 10 unless a reviewer or reviewee is given
    AddReviewerMapping {
        #[serde(default)]
        reviewer: Option<String>,
        #[serde(default)]
        reviewee: Option<String>,
    },
    SaveAsDraft {
        #[serde(default)]
        title: Option<String>,
    },
    GoToStep { step: u8 },
    GoToVerifyStep,
    OpenDraft {
        #[serde(default)]
        title: Option<String>,
    },
    VerifyFormHasQuestions,
    EditForm,
    CreateReviewCycleExplicitly,
    VerifyPhaseStatus { status: String },
    ExitCreationFlow,
}

/// Storefront flow operations callable from a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum StoreCall {
    OpenLoginPage,
    Login { username: String, password: String },
    LoginStandardUser,
    ExpectLoginError { contains: String },
    AddFirstProduct,
    OpenCart,
    RemoveFirstFromCart,
    ExpectCartCount { count: usize },
    /// Badge text, or no badge at all when omitted
    ExpectCartBadge {
        #[serde(default)]
        text: Option<String>,
    },
    OpenFirstProduct,
    BackToProducts,
    ProceedToCheckout,
    FillCheckoutInfo(CheckoutInfo),
    ContinueCheckout,
    FinishOrder,
    CompleteOrder(CheckoutInfo),
    OpenMenu,
    CloseMenu,
    Logout,
    ScrollToFooter,
    ExpectSocialHref { network: SocialNetwork, contains: String },
    ExpectSocialPopup { network: SocialNetwork, not_contains: String },
    ExpectCentered {
        child: Target,
        parent: Target,
        #[serde(default = "default_tolerance")]
        tolerance_px: f64,
    },
}

impl TestStep {
    /// Short label used in results and logs
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::Click { target, .. } => format!("click:{}", target),
            TestStep::Fill { target, .. } => format!("fill:{}", target),
            TestStep::Hover { target } => format!("hover:{}", target),
            TestStep::Wait { target, state, .. } => format!("wait:{}:{}", target, state.as_str()),
            TestStep::Expect { target, .. } => format!("expect:{}", target),
            TestStep::ExpectUrl { .. } => "expect_url".to_string(),
            TestStep::Reload => "reload".to_string(),
            TestStep::GoBack => "go_back".to_string(),
            TestStep::Viewport(v) => format!("viewport:{}x{}", v.width, v.height),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
            TestStep::ReviewCycle(call) => format!("review_cycle:{}", call.name()),
            TestStep::Storefront(call) => format!("storefront:{}", call.name()),
        }
    }

    /// Catch mistakes that would otherwise only surface mid-run.
    pub fn validate(&self) -> E2eResult<()> {
        match self {
            TestStep::Click { target, .. }
            | TestStep::Fill { target, .. }
            | TestStep::Hover { target }
            | TestStep::Wait { target, .. } => {
                target.resolve()?;
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
                ..
            } => {
                target.resolve()?;
                let any = visible.is_some()
                    || text.is_some()
                    || contains_text.is_some()
                    || value.is_some()
                    || count.is_some()
                    || enabled.is_some()
                    || attribute.is_some();
                if !any {
                    return Err(E2eError::SpecParse(format!("{} asserts nothing", self.name())));
                }
            }
            TestStep::ExpectUrl { matches, not_contains, .. } => {
                if matches.is_none() && not_contains.is_none() {
                    return Err(E2eError::SpecParse("expect_url needs 'matches' or 'not_contains'".to_string()));
                }
                if let Some(pattern) = matches {
                    Regex::new(pattern)?;
                }
            }
            TestStep::ReviewCycle(ReviewCall::GoToStep { step }) => {
                if WizardStep::from_number(*step).is_none() {
                    return Err(E2eError::SpecParse(format!("wizard step {} is outside 1..=6", step)));
                }
            }
            TestStep::Storefront(StoreCall::ExpectCentered { child, parent, .. }) => {
                child.resolve()?;
                parent.resolve()?;
            }
            _ => {}
        }
        Ok(())
    }
}

impl ReviewCall {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewCall::NavigateToReviews => "navigate_to_reviews",
            ReviewCall::StartNewCycle => "start_new_cycle",
            ReviewCall::FillTitle { .. } => "fill_title",
            ReviewCall::ConfigureReviews(_) => "configure_reviews",
            ReviewCall::ConfigureGoals => "configure_goals",
            ReviewCall::CreateSelfReviewForm => "create_self_review_form",
            ReviewCall::CreatePeerReviewForm => "create_peer_review_form",
            ReviewCall::AddReviewees { .. } => "add_reviewees",
            ReviewCall::AddReviewerMapping { .. } => "add_reviewer_mapping",
            ReviewCall::SaveAsDraft { .. } => "save_as_draft",
            ReviewCall::GoToStep { .. } => "go_to_step",
            ReviewCall::GoToVerifyStep => "go_to_verify_step",
            ReviewCall::OpenDraft { .. } => "open_draft",
            ReviewCall::VerifyFormHasQuestions => "verify_form_has_questions",
            ReviewCall::EditForm => "edit_form",
            ReviewCall::CreateReviewCycleExplicitly => "create_review_cycle_explicitly",
            ReviewCall::VerifyPhaseStatus { .. } => "verify_phase_status",
            ReviewCall::ExitCreationFlow => "exit_creation_flow",
        }
    }
}

impl StoreCall {
    pub fn name(&self) -> &'static str {
        match self {
            StoreCall::OpenLoginPage => "open_login_page",
            StoreCall::Login { .. } => "login",
            StoreCall::LoginStandardUser => "login_standard_user",
            StoreCall::ExpectLoginError { .. } => "expect_login_error",
            StoreCall::AddFirstProduct => "add_first_product",
            StoreCall::OpenCart => "open_cart",
            StoreCall::RemoveFirstFromCart => "remove_first_from_cart",
            StoreCall::ExpectCartCount { .. } => "expect_cart_count",
            StoreCall::ExpectCartBadge { .. } => "expect_cart_badge",
            StoreCall::OpenFirstProduct => "open_first_product",
            StoreCall::BackToProducts => "back_to_products",
            StoreCall::ProceedToCheckout => "proceed_to_checkout",
            StoreCall::FillCheckoutInfo(_) => "fill_checkout_info",
            StoreCall::ContinueCheckout => "continue_checkout",
            StoreCall::FinishOrder => "finish_order",
            StoreCall::CompleteOrder(_) => "complete_order",
            StoreCall::OpenMenu => "open_menu",
            StoreCall::CloseMenu => "close_menu",
            StoreCall::Logout => "logout",
            StoreCall::ScrollToFooter => "scroll_to_footer",
            StoreCall::ExpectSocialHref { .. } => "expect_social_href",
            StoreCall::ExpectSocialPopup { .. } => "expect_social_popup",
            StoreCall::ExpectCentered { .. } => "expect_centered",
        }
    }
}

impl SuiteSpec {
    /// Parse a suite from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut suite = Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))?;
        suite.source = Some(path.to_path_buf());
        Ok(suite)
    }

    /// Load all suites from a directory, in file name order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::Config(format!("specs directory {} does not exist", dir.display())));
        }

        let mut suites = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            suites.push(Self::from_file(entry.path())?);
        }

        Ok(suites)
    }

    /// Check names are unique and every step can be resolved.
    pub fn validate(&self) -> E2eResult<()> {
        let location = |test: &str, step: &TestStep, e: E2eError| {
            E2eError::SpecParse(format!("{} / {} / {}: {}", self.name, test, step.name(), e))
        };

        if self.tests.is_empty() {
            return Err(E2eError::SpecParse(format!("suite '{}' has no tests", self.name)));
        }

        for step in &self.before_each {
            step.validate().map_err(|e| location("before_each", step, e))?;
        }

        let mut seen = HashSet::new();
        for test in &self.tests {
            if !seen.insert(test.name.as_str()) {
                return Err(E2eError::SpecParse(format!(
                    "suite '{}' has two tests named '{}'",
                    self.name, test.name
                )));
            }
            for step in &test.steps {
                step.validate().map_err(|e| location(&test.name, step, e))?;
            }
        }
        Ok(())
    }

    /// Does this test carry `tag`, directly or through its suite?
    pub fn has_tag(&self, test: &TestSpec, tag: &str) -> bool {
        self.tags.iter().chain(test.tags.iter()).any(|t| t == tag)
    }
}

/// Selects which tests to run
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub tag: Option<String>,
    /// Substring of the test name
    pub name: Option<String>,
}

impl Filter {
    pub fn matches(&self, suite: &SuiteSpec, test: &TestSpec) -> bool {
        let tag_ok = self.tag.as_deref().map_or(true, |tag| suite.has_tag(test, tag));
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| test.name.contains(name));
        tag_ok && name_ok
    }

    /// Apply to a set of suites, dropping suites left with no tests.
    pub fn apply(&self, suites: Vec<SuiteSpec>) -> Vec<SuiteSpec> {
        suites
            .into_iter()
            .filter_map(|mut suite| {
                let tests = std::mem::take(&mut suite.tests);
                suite.tests = tests.into_iter().filter(|t| self.matches(&suite, t)).collect();
                (!suite.tests.is_empty()).then_some(suite)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKOUT: &str = r#"
name: checkout
description: Checkout page tests
tags: [saucedemo, checkout]
base_url: "${storefront_url}"
before_each:
  - action: storefront
    call: login_standard_user
  - action: storefront
    call: add_first_product
tests:
  - name: TC069 - checkout blocked when first name is missing
    tags: [validation]
    steps:
      - action: storefront
        call: proceed_to_checkout
      - action: storefront
        call: fill_checkout_info
        last: Shaik
        postal: "500001"
      - action: click
        locator: store.continue
      - action: expect
        locator: store.error
        visible: true
      - action: expect_url
        matches: checkout-step-one\.html
  - name: TC071 - cart keeps item
    steps:
      - action: expect
        selector: .cart_item
        nth: 0
        count: 1
"#;

    #[test]
    fn parses_suite_with_flow_calls() {
        let suite = SuiteSpec::from_yaml(CHECKOUT).unwrap();
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.before_each.len(), 2);
        assert!(!suite.serial);

        match &suite.tests[0].steps[1] {
            TestStep::Storefront(StoreCall::FillCheckoutInfo(info)) => {
                assert_eq!(info.first, None);
                assert_eq!(info.postal.as_deref(), Some("500001"));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(suite.tests[0].steps[2].name(), "click:store.continue");
        suite.validate().unwrap();
    }

    #[test]
    fn review_calls_take_defaults() {
        let yaml = r#"
- action: review_cycle
  call: configure_reviews
  goals: true
- action: review_cycle
  call: add_reviewees
- action: review_cycle
  call: add_reviewer_mapping
  reviewee: Jane Doe
- action: review_cycle
  call: save_as_draft
  title: TC01 Draft Review Cycle
"#;
        let steps: Vec<TestStep> = serde_yaml::from_str(yaml).unwrap();
        match &steps[0] {
            TestStep::ReviewCycle(ReviewCall::ConfigureReviews(options)) => {
                assert!(options.self_review && options.peer_review && options.goals);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert!(matches!(
            steps[1],
            TestStep::ReviewCycle(ReviewCall::AddReviewees { count: 4 })
        ));
        match &steps[2] {
            TestStep::ReviewCycle(ReviewCall::AddReviewerMapping { reviewer, reviewee }) => {
                assert_eq!(reviewer, &None);
                assert_eq!(reviewee.as_deref(), Some("Jane Doe"));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(steps[3].name(), "review_cycle:save_as_draft");
    }

    #[test]
    fn targets_accept_numeric_params() {
        let step: TestStep = serde_yaml::from_str(
            "{ action: click, locator: review.reviewee_plus, params: [2] }",
        )
        .unwrap();
        match step {
            TestStep::Click { target, .. } => {
                assert_eq!(target.params, vec!["2".to_string()]);
                assert_eq!(target.resolve().unwrap().to_string(), "getByRole('button', { name: 'plus' }).nth(2)");
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn validation_catches_bad_steps() {
        let bad_target = TestStep::Click {
            target: Target { locator: Some("store.nope".into()), ..Default::default() },
            timeout_ms: None,
        };
        assert!(bad_target.validate().is_err());

        let both = Target {
            locator: Some("store.title".into()),
            selector: Some(".title".into()),
            ..Default::default()
        };
        assert!(both.resolve().is_err());

        let step_seven = TestStep::ReviewCycle(ReviewCall::GoToStep { step: 7 });
        assert!(step_seven.validate().is_err());

        let empty_expect: TestStep = serde_yaml::from_str("{ action: expect, selector: .title }").unwrap();
        assert!(empty_expect.validate().is_err());
    }

    #[test]
    fn exit_scenario_checks_that_no_draft_remains() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios/review-cycle/save-as-draft.yaml");
        let suite = SuiteSpec::from_file(&path).unwrap();
        let exit = suite.tests.iter().find(|t| t.name.starts_with("TC08")).unwrap();

        match exit.steps.last().unwrap() {
            TestStep::Expect { target, count, .. } => {
                assert_eq!(target.locator.as_deref(), Some("review.draft_title"));
                assert_eq!(target.params, vec!["TC08 Exit Test Cycle".to_string()]);
                assert_eq!(*count, Some(0));
            }
            other => panic!("unexpected final step {:?}", other),
        }
        assert!(!exit.steps.iter().any(|step| matches!(
            step,
            TestStep::ReviewCycle(ReviewCall::SaveAsDraft { .. })
        )));
    }

    #[test]
    fn duplicate_test_names_are_rejected() {
        let yaml = r#"
name: dup
tests:
  - name: same
    steps: [{ action: reload }]
  - name: same
    steps: [{ action: go_back }]
"#;
        let suite = SuiteSpec::from_yaml(yaml).unwrap();
        let err = suite.validate().unwrap_err();
        assert!(err.to_string().contains("two tests named 'same'"));
    }

    #[test]
    fn filter_by_inherited_tag_and_name() {
        let suite = SuiteSpec::from_yaml(CHECKOUT).unwrap();

        let by_tag = Filter { tag: Some("validation".into()), name: None };
        let kept = by_tag.apply(vec![suite.clone()]);
        assert_eq!(kept[0].tests.len(), 1);

        let by_suite_tag = Filter { tag: Some("saucedemo".into()), name: Some("TC071".into()) };
        let kept = by_suite_tag.apply(vec![suite.clone()]);
        assert_eq!(kept[0].tests[0].name, "TC071 - cart keeps item");

        let none = Filter { tag: Some("review".into()), name: None };
        assert!(none.apply(vec![suite]).is_empty());
    }

    #[test]
    fn loads_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), CHECKOUT.replace("name: checkout", "name: second")).unwrap();
        std::fs::write(dir.path().join("a.yml"), CHECKOUT).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let suites = SuiteSpec::load_all(dir.path()).unwrap();
        let names: Vec<_> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["checkout", "second"]);
        assert!(suites[0].source.as_ref().unwrap().ends_with("a.yml"));
    }
}
