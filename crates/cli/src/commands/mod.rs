//! CLI Commands

pub mod check;
pub mod locators;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use uiflow_e2e::UiflowConfig;

/// Load the configuration file, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> anyhow::Result<UiflowConfig> {
    UiflowConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}
