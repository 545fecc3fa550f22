//! Shared setup for live browser tests.

use std::sync::Once;

use uiflow_e2e::playwright::check_playwright_installed;
use uiflow_e2e::{PlaywrightBrowser, PlaywrightConfig};

static LOGGING: Once = Once::new();

pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Launch a headless browser, or `None` when Playwright is not installed.
pub async fn browser() -> Option<PlaywrightBrowser> {
    init_logging();
    let config = PlaywrightConfig::default();
    if check_playwright_installed(&config).await.is_err() {
        eprintln!("Skipping: playwright not resolvable from node");
        return None;
    }
    Some(PlaywrightBrowser::launch(config).await.expect("launch browser"))
}
