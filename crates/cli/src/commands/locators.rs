//! `uiflow locators`: print the locator registry

use clap::{Args, ValueEnum};
use serde::Serialize;
use uiflow_e2e::registry;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum App {
    Review,
    Storefront,
}

impl App {
    fn prefix(&self) -> &'static str {
        match self {
            App::Review => "review.",
            App::Storefront => "store.",
        }
    }
}

#[derive(Args)]
pub struct LocatorsArgs {
    /// Only list one application's elements
    #[arg(long)]
    pub app: Option<App>,
}

#[derive(Serialize)]
struct LocatorRow {
    name: String,
    params: Vec<String>,
    locator: String,
}

impl TableDisplay for LocatorRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Params", "Locator"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.params.join(", "), self.locator.clone()]
    }
}

fn rows(app: Option<App>) -> Vec<LocatorRow> {
    registry::entries()
        .into_iter()
        .filter(|e| app.map_or(true, |a| e.name.starts_with(a.prefix())))
        .map(|e| {
            // Parameterized entries are shown with their parameter names in place.
            let locator = if e.params.is_empty() {
                registry::resolve(e.name, &[])
                    .map(|l| l.to_string())
                    .unwrap_or_else(|err| err.to_string())
            } else {
                format!("<{}>", e.params.join(", "))
            };
            LocatorRow {
                name: e.name.to_string(),
                params: e.params.iter().map(|p| p.to_string()).collect(),
                locator,
            }
        })
        .collect()
}

pub fn execute(args: LocatorsArgs, format: OutputFormat) -> anyhow::Result<bool> {
    print_list(&rows(args.app), format);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_app() {
        let store = rows(Some(App::Storefront));
        assert!(!store.is_empty());
        assert!(store.iter().all(|r| r.name.starts_with("store.")));

        let all = rows(None);
        assert!(all.len() > store.len());
        assert!(all.iter().any(|r| r.name == "review.save_and_continue"));
    }
}
