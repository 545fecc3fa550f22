//! `uiflow validate`: parse suites and report what they contain

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use uiflow_e2e::SuiteSpec;

use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ValidateArgs {
    /// Scenario suites directory (defaults to the configured one)
    #[arg(long)]
    pub specs: Option<PathBuf>,
}

#[derive(Serialize)]
struct SuiteRow {
    suite: String,
    tests: usize,
    serial: bool,
    file: String,
}

impl TableDisplay for SuiteRow {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Tests", "Serial", "File"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.tests.to_string(),
            if self.serial { "yes" } else { "no" }.to_string(),
            self.file.clone(),
        ]
    }
}

fn summarize(dir: &Path) -> anyhow::Result<Vec<SuiteRow>> {
    let suites = SuiteSpec::load_all(dir).with_context(|| format!("loading {}", dir.display()))?;
    suites
        .iter()
        .map(|suite| {
            suite.validate()?;
            Ok(SuiteRow {
                suite: suite.name.clone(),
                tests: suite.tests.len(),
                serial: suite.serial,
                file: suite
                    .source
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

pub fn execute(args: ValidateArgs, config_path: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let dir = match args.specs {
        Some(dir) => dir,
        None => super::load_config(config_path)?.runner.specs_dir,
    };
    let rows = summarize(&dir)?;
    output::print_list(&rows, format);

    let tests: usize = rows.iter().map(|r| r.tests).sum();
    output::print_success(&format!("{} suite(s), {} test(s) valid", rows.len(), tests));
    Ok(true)
}
