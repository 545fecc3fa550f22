//! `uiflow run`: execute scenario suites in a real browser

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};
use uiflow_e2e::spec::Filter;
use uiflow_e2e::{Browser, PlaywrightBrowser, TestResult, TestRunner, TestStatus, UiflowConfig};

use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Scenario suites directory
    #[arg(long)]
    pub specs: Option<PathBuf>,

    /// Only run tests carrying this tag (suite tags count)
    #[arg(long)]
    pub tag: Option<String>,

    /// Only run tests whose name contains this text
    #[arg(long)]
    pub name: Option<String>,

    /// Tests of a non-serial suite to run at once
    #[arg(long)]
    pub workers: Option<usize>,

    /// Browser engine: chromium, firefox or webkit
    #[arg(long)]
    pub browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for test-results.json
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut UiflowConfig) {
        if let Some(specs) = &self.specs {
            config.runner.specs_dir = specs.clone();
        }
        if let Some(workers) = self.workers {
            config.runner.workers = workers.max(1);
        }
        if let Some(browser) = self.browser {
            config.browser.browser = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = &self.output {
            config.runner.output_dir = output.clone();
        }
    }

    fn filter(&self) -> Filter {
        Filter {
            tag: self.tag.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Serialize)]
struct FailureRow<'a> {
    suite: &'a str,
    test: &'a str,
    kind: &'a str,
    operation: &'a str,
    error: &'a str,
}

impl TableDisplay for FailureRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Test", "Kind", "Operation", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.to_string(),
            self.test.to_string(),
            self.kind.to_string(),
            self.operation.to_string(),
            self.error.to_string(),
        ]
    }
}

impl<'a> From<&'a TestResult> for FailureRow<'a> {
    fn from(r: &'a TestResult) -> Self {
        Self {
            suite: &r.suite,
            test: &r.name,
            kind: r.failure_kind.as_deref().unwrap_or("-"),
            operation: r.failed_operation.as_deref().unwrap_or("-"),
            error: r.error.as_deref().unwrap_or(""),
        }
    }
}

/// Returns whether every selected test passed.
pub async fn execute(args: RunArgs, config_path: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);

    let browser = PlaywrightBrowser::launch(config.browser.clone())
        .await
        .context("launching browser")?;
    let browser = Arc::new(browser);
    let runner = TestRunner::new(browser.clone(), config).with_filter(args.filter());

    let outcome = runner.run_all().await;
    if let Err(e) = browser.close().await {
        warn!("Browser did not shut down cleanly: {}", e);
    }
    let results = outcome.context("running scenarios")?;
    let path = runner.write_results(&results)?;

    if output::print_structured(&results, format) {
        return Ok(results.success());
    }

    let failures: Vec<FailureRow> = results
        .results
        .iter()
        .filter(|r| r.status == TestStatus::Failed)
        .map(FailureRow::from)
        .collect();
    if !failures.is_empty() {
        output::print_list(&failures, format);
    }

    let summary = format!(
        "{} passed, {} failed, {} skipped in {:.1}s",
        results.passed,
        results.failed,
        results.skipped,
        results.duration_ms as f64 / 1000.0
    );
    if results.success() {
        output::print_success(&summary.green().to_string());
    } else {
        output::print_error(&summary.red().to_string());
    }
    info!("Run {} results: {}", results.run_id, path.display());

    Ok(results.success())
}
