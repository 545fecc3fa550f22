//! Live review-cycle wizard tests against the public interactive demo.
//!
//! Marked ignored because they need node, Playwright and network access,
//! and because they leave drafts behind in the demo account.

mod common;

use uiflow_e2e::flows::review_cycle::REVIEW_DEMO_URL;
use uiflow_e2e::flows::{FlowTimeouts, ReviewCycleFlow};
use uiflow_e2e::{FailureKind, Page, PageFactory, Viewport};

fn wizard_viewport() -> Viewport {
    Viewport { width: 1440, height: 900 }
}

#[tokio::test]
#[ignore]
async fn title_only_draft_can_be_saved_from_verify_step() {
    let Some(browser) = common::browser().await else {
        return;
    };
    let page = browser.new_page(wizard_viewport()).await.expect("new page");
    page.goto(REVIEW_DEMO_URL).await.unwrap();
    let flow = ReviewCycleFlow::with_timeouts(&*page, FlowTimeouts::default());

    let title = format!("uiflow draft {}", std::process::id());
    flow.navigate_to_reviews().await.unwrap();
    flow.start_new_cycle().await.unwrap();
    flow.fill_title(&title).await.unwrap();
    flow.go_to_verify_step().await.unwrap();
    flow.save_as_draft(Some(&title)).await.unwrap();

    browser.close().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn missing_reviews_nav_is_a_precondition_failure() {
    let Some(browser) = common::browser().await else {
        return;
    };
    let page = browser.new_page(wizard_viewport()).await.expect("new page");
    page.goto("about:blank").await.unwrap();
    let timeouts = FlowTimeouts {
        marker_ms: 1_000,
        ..FlowTimeouts::default()
    };
    let flow = ReviewCycleFlow::with_timeouts(&*page, timeouts);

    let err = flow.navigate_to_reviews().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Precondition);
    assert!(err.to_string().starts_with("Failed to navigate to reviews"));

    browser.close().await.unwrap();
}
