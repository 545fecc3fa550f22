//! uiflow E2E framework
//!
//! Drives two web applications through Playwright:
//! - a review-cycle wizard (create, configure, save and reopen drafts)
//! - the saucedemo storefront (login, cart, checkout, menu, footer)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Scenario Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── PageFactory::new_page() -> Box<dyn Page>             │
//! │    ├── run_suite(SuiteSpec) -> Vec<TestResult>              │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Flows                                                      │
//! │    ├── ReviewCycleFlow (wizard steps 1..=6)                 │
//! │    └── StorefrontFlow                                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  registry (semantic names) -> Locator -> Page               │
//! │  PlaywrightBrowser: node bridge, JSON lines over stdio      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod expect;
pub mod flows;
pub mod locator;
pub mod playwright;
pub mod preflight;
pub mod registry;
pub mod runner;
pub mod spec;

pub use config::UiflowConfig;
pub use driver::{Page, PageFactory, Viewport};
pub use error::{E2eError, E2eResult, FailureKind};
pub use flows::{ReviewCycleFlow, StorefrontFlow};
pub use locator::Locator;
pub use playwright::{Browser, PlaywrightBrowser, PlaywrightConfig};
pub use runner::{TestResult, TestRunner, TestStatus, TestSuiteResult};
pub use spec::{Filter, SuiteSpec, TestSpec, TestStep};
