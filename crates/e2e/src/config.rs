//! Runner configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::flows::review_cycle::REVIEW_DEMO_URL;
use crate::flows::storefront::STOREFRONT_URL;
use crate::flows::FlowTimeouts;
use crate::playwright::PlaywrightConfig;

/// Top-level configuration, usually `uiflow.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiflowConfig {
    /// Browser launch settings
    pub browser: PlaywrightConfig,

    /// Scenario runner settings
    pub runner: RunnerSettings,

    /// Flow wait bounds
    pub flow: FlowTimeouts,

    /// Applications under test
    pub targets: Targets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Scenario suites directory
    pub specs_dir: PathBuf,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Tests of a non-serial suite run this many at a time
    pub workers: usize,

    /// Per-test timeout when neither the test nor its suite sets one
    pub default_test_timeout_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            workers: 1,
            default_test_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub storefront_url: String,
    pub review_url: String,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            storefront_url: STOREFRONT_URL.to_string(),
            review_url: REVIEW_DEMO_URL.to_string(),
        }
    }
}

impl Targets {
    /// Replace `${storefront_url}` and `${review_url}` in `value`.
    pub fn expand(&self, value: &str) -> String {
        value
            .replace("${storefront_url}", &self.storefront_url)
            .replace("${review_url}", &self.review_url)
    }

    /// Name and URL of every target, for preflight checks
    pub fn all(&self) -> [(&'static str, &str); 2] {
        [
            ("storefront", self.storefront_url.as_str()),
            ("review", self.review_url.as_str()),
        ]
    }
}

impl UiflowConfig {
    /// Load configuration from file; a missing file means defaults.
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.check()?;
            Ok(config)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| E2eError::Config(format!("cannot serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn check(&self) -> E2eResult<()> {
        if self.runner.workers == 0 {
            return Err(E2eError::Config("runner.workers must be at least 1".to_string()));
        }
        if self.browser.viewport.width == 0 || self.browser.viewport.height == 0 {
            return Err(E2eError::Config("browser.viewport must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playwright::Browser;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = UiflowConfig::load(&dir.path().join("uiflow.toml")).unwrap();
        assert_eq!(config, UiflowConfig::default());
        assert_eq!(config.flow.marker_ms, 10_000);
        assert_eq!(config.targets.storefront_url, "https://www.saucedemo.com/");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uiflow.toml");
        std::fs::write(
            &path,
            r#"
[browser]
browser = "webkit"

[runner]
workers = 4

[flow]
marker_ms = 20000
"#,
        )
        .unwrap();

        let config = UiflowConfig::load(&path).unwrap();
        assert_eq!(config.browser.browser, Browser::Webkit);
        assert!(config.browser.headless);
        assert_eq!(config.runner.workers, 4);
        assert_eq!(config.runner.specs_dir, PathBuf::from("scenarios"));
        assert_eq!(config.flow.marker_ms, 20_000);
        assert_eq!(config.flow.action_ms, 5_000);
    }

    #[test]
    fn rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uiflow.toml");
        std::fs::write(&path, "[runner]\nworkers = 0\n").unwrap();
        assert!(matches!(UiflowConfig::load(&path), Err(E2eError::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/uiflow.toml");
        let mut config = UiflowConfig::default();
        config.targets.review_url = "https://review.example.test/".to_string();

        config.save(&path).unwrap();
        assert_eq!(UiflowConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn expands_target_placeholders() {
        let targets = Targets::default();
        assert_eq!(targets.expand("${storefront_url}"), STOREFRONT_URL);
        assert_eq!(targets.expand("plain"), "plain");
    }
}
