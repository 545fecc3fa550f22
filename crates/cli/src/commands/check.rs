//! `uiflow check`: preflight before a run

use std::path::Path;

use serde::Serialize;
use uiflow_e2e::preflight::{self, Check};

use crate::output::{self, pass_mark, OutputFormat, TableDisplay};

#[derive(Serialize)]
struct CheckRow<'a>(&'a Check);

impl TableDisplay for CheckRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["", "Check", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![pass_mark(self.0.ok), self.0.name.clone(), self.0.detail.clone()]
    }
}

pub async fn execute(config_path: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let config = super::load_config(config_path)?;
    let report = preflight::run(&config).await?;

    let rows: Vec<CheckRow> = report.checks.iter().map(CheckRow).collect();
    output::print_list(&rows, format);

    if report.ok() {
        output::print_success("Ready to run");
    } else {
        output::print_warning(&format!("{} check(s) failed", report.failures().count()));
    }
    Ok(report.ok())
}
