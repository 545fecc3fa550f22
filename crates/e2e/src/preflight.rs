//! Environment checks run before a scenario run

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::UiflowConfig;
use crate::error::{E2eError, E2eResult};
use crate::playwright::check_playwright_installed;
use crate::spec::SuiteSpec;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { name: name.into(), ok: true, detail: detail.into() }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { name: name.into(), ok: false, detail: detail.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightReport {
    pub checks: Vec<Check>,
}

impl PreflightReport {
    pub fn ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.ok)
    }
}

/// Check Playwright, every target URL and the scenario directory.
///
/// Individual failures are recorded in the report; only a broken HTTP
/// client is returned as an error.
pub async fn run(config: &UiflowConfig) -> E2eResult<PreflightReport> {
    let mut report = PreflightReport::default();

    report.checks.push(match check_playwright_installed(&config.browser).await {
        Ok(()) => Check::pass("playwright", "playwright resolves from node"),
        Err(e) => Check::fail("playwright", e.to_string()),
    });

    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    for (name, url) in config.targets.all() {
        report.checks.push(check_target(&client, name, url).await);
    }

    report.checks.push(check_specs(config));

    for check in &report.checks {
        if check.ok {
            info!("✓ {} - {}", check.name, check.detail);
        } else {
            warn!("✗ {} - {}", check.name, check.detail);
        }
    }
    Ok(report)
}

async fn check_target(client: &reqwest::Client, name: &str, url: &str) -> Check {
    let label = format!("target:{}", name);
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => {
            Check::pass(label, format!("{} answered {}", url, resp.status()))
        }
        Ok(resp) => Check::fail(label, format!("{} answered {}", url, resp.status())),
        Err(e) => Check::fail(label, format!("{} unreachable: {}", url, e)),
    }
}

fn check_specs(config: &UiflowConfig) -> Check {
    let dir = &config.runner.specs_dir;
    let loaded = SuiteSpec::load_all(dir).and_then(|suites| {
        suites.iter().try_for_each(SuiteSpec::validate)?;
        Ok(suites)
    });
    match loaded {
        Ok(suites) if suites.is_empty() => {
            Check::fail("specs", format!("no suites in {}", dir.display()))
        }
        Ok(suites) => {
            let tests: usize = suites.iter().map(|s| s.tests.len()).sum();
            Check::pass(
                "specs",
                format!("{} suite(s), {} test(s) in {}", suites.len(), tests, dir.display()),
            )
        }
        Err(E2eError::SpecParse(msg)) => Check::fail("specs", msg),
        Err(e) => Check::fail("specs", e.to_string()),
    }
}
