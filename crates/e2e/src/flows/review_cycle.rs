//! Review-cycle creation wizard
//!
//! Drives the six-step "create performance review" wizard of the review SaaS:
//! Title, Configure, Forms, Reviewees, Reviewers, Verify. Each operation checks
//! the marker of the step it expects to act on, performs its clicks, and then
//! waits on an observable signal instead of sleeping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{operation, FlowTimeouts};
use crate::driver::{LoadState, Page, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::expect::{self, expect, poll_until, Probe};
use crate::registry::{Pick, ReviewCycleElement as El, ReviewSwitch, VERIFY_PAGE_TEXT};

const CONFIGURE_MARKER: &str = "Configure steps of this review cycle";

/// Interactive demo of the review SaaS, signed in as a demo admin.
pub const REVIEW_DEMO_URL: &str = "https://api.demo.peoplebox.ai/demo/try_interactive_demo?account_id=1147";

/// Reviewees added when a scenario does not say otherwise.
pub const DEFAULT_REVIEWEES: usize = 4;

/// Wizard steps, numbered as the stepper shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Title = 1,
    Configure = 2,
    Forms = 3,
    Reviewees = 4,
    Reviewers = 5,
    Verify = 6,
}

impl WizardStep {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::Title),
            2 => Some(WizardStep::Configure),
            3 => Some(WizardStep::Forms),
            4 => Some(WizardStep::Reviewees),
            5 => Some(WizardStep::Reviewers),
            6 => Some(WizardStep::Verify),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Text that is only visible on this step.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            WizardStep::Configure => Some(CONFIGURE_MARKER),
            WizardStep::Forms => Some("Create customizable review forms with relevant questions"),
            WizardStep::Reviewees => Some("Select reviewees who will be a part of this review."),
            WizardStep::Verify => Some(VERIFY_PAGE_TEXT),
            WizardStep::Title | WizardStep::Reviewers => None,
        }
    }
}

/// Independent toggles for the "Configure" step. An absent toggle is left
/// untouched on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewOptions {
    #[serde(rename = "self")]
    pub self_review: bool,
    #[serde(rename = "peer")]
    pub peer_review: bool,
    pub goals: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            self_review: true,
            peer_review: true,
            goals: false,
        }
    }
}

impl ReviewOptions {
    /// Switches to flip, in the order the page lists them.
    pub fn switches(&self) -> Vec<ReviewSwitch> {
        let mut switches = Vec::new();
        if self.self_review {
            switches.push(ReviewSwitch::SelfReview);
        }
        if self.peer_review {
            switches.push(ReviewSwitch::PeerReview);
        }
        if self.goals {
            switches.push(ReviewSwitch::Goals);
        }
        switches
    }
}

/// Which reviewer is mapped to which reviewee on the "Reviewers" step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerMapping {
    pub reviewer: Pick,
    pub reviewee: Pick,
}

impl Default for ReviewerMapping {
    /// First reviewer, eleventh reviewee of the alphabetical result list.
    fn default() -> Self {
        Self {
            reviewer: Pick::Position(0),
            reviewee: Pick::Position(10),
        }
    }
}

/// Flow controller for one page showing the review SaaS.
pub struct ReviewCycleFlow<'a, P: Page + ?Sized> {
    page: &'a P,
    timeouts: FlowTimeouts,
}

impl<'a, P: Page + ?Sized> ReviewCycleFlow<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self::with_timeouts(page, FlowTimeouts::default())
    }

    pub fn with_timeouts(page: &'a P, timeouts: FlowTimeouts) -> Self {
        Self { page, timeouts }
    }

    pub fn page(&self) -> &'a P {
        self.page
    }

    async fn click(&self, element: El) -> E2eResult<()> {
        let locator = element.locator();
        debug!("click {}", locator);
        self.page.click(&locator, self.timeouts.action()).await
    }

    async fn marker(&self, element: El) -> E2eResult<()> {
        expect::marker(self.page, &element.locator(), self.timeouts.marker()).await
    }

    async fn step_marker(&self, step: WizardStep) -> E2eResult<()> {
        match step.marker() {
            Some(text) => self.marker(El::MarkerText(text.to_string())).await,
            None => Ok(()),
        }
    }

    /// Wait for a short-lived control (menu item, popup row) to show up.
    async fn appear(&self, element: El) -> E2eResult<()> {
        expect::marker(self.page, &element.locator(), self.timeouts.action()).await
    }

    async fn settle(&self) -> E2eResult<()> {
        self.page
            .wait_for_load_state(LoadState::DomContentLoaded, self.timeouts.settle())
            .await
    }

    async fn save_and_continue(&self) -> E2eResult<()> {
        let button = El::SaveAndContinueButton.locator();
        self.page.scroll_into_view(&button, self.timeouts.action()).await?;
        self.page.click(&button, self.timeouts.action()).await
    }

    /// Flip one switch and wait until the page reflects the new state.
    async fn toggle(&self, switch: ReviewSwitch) -> E2eResult<()> {
        self.appear(El::Switch(switch)).await?;
        let locator = El::Switch(switch).locator();
        let before = self.page.get_attribute(&locator, "aria-checked").await?;
        debug!("toggle {:?} (aria-checked: {:?})", switch, before);
        self.page.click(&locator, self.timeouts.action()).await?;

        let Some(before) = before else {
            return self.settle().await;
        };
        let page = self.page;
        let locator = &locator;
        let before = before.as_str();
        let outcome = poll_until(self.timeouts.action(), move || async move {
            let now = page.get_attribute(locator, "aria-checked").await?;
            Ok(match now {
                Some(now) if now != before => Probe::Done(()),
                other => Probe::Pending(format!("aria-checked {:?}", other)),
            })
        })
        .await?;
        outcome.map_err(|observed| {
            E2eError::AssertionFailed(format!("{} did not change state, {}", locator, observed))
        })
    }

    /// Open "Create Form" > "Create From Scratch" and press the builder's
    /// Add buttons at the given positions.
    async fn build_form_from_scratch(&self, add_buttons: &[usize]) -> E2eResult<()> {
        self.click(El::CreateFormButton).await?;
        self.appear(El::CreateFromScratchButton).await?;
        self.click(El::CreateFromScratchButton).await?;
        for &index in add_buttons {
            self.click(El::FormBuilderAdd(index)).await?;
        }
        expect(self.page, El::FormQuestionCard.locator())
            .timeout(self.timeouts.action())
            .count_at_least(1)
            .await?;
        Ok(())
    }

    pub async fn navigate_to_reviews(&self) -> E2eResult<()> {
        operation("navigate_to_reviews", async {
            self.marker(El::ReviewsNav).await?;
            self.click(El::ReviewsNav).await?;
            self.settle().await
        })
        .await
    }

    pub async fn start_new_cycle(&self) -> E2eResult<()> {
        operation("start_new_cycle", async {
            self.marker(El::CreateNewCycleButton).await?;
            self.click(El::CreateNewCycleButton).await?;
            self.appear(El::CreatePerformanceReviewButton).await?;
            self.click(El::CreatePerformanceReviewButton).await?;
            self.marker(El::TitleInput).await
        })
        .await
    }

    pub async fn fill_title(&self, title: &str) -> E2eResult<()> {
        operation("fill_title", async {
            self.marker(El::TitleInput).await?;
            let input = El::TitleInput.locator();
            self.page.fill(&input, title, self.timeouts.action()).await?;
            expect(self.page, input)
                .timeout(self.timeouts.action())
                .to_have_value(title)
                .await?;
            self.save_and_continue().await?;
            self.step_marker(WizardStep::Configure).await
        })
        .await
    }

    pub async fn configure_reviews(&self, options: ReviewOptions) -> E2eResult<()> {
        operation("configure_reviews", async {
            self.step_marker(WizardStep::Configure).await?;
            info!("Configuring review steps: {:?}", options);

            for switch in options.switches() {
                match switch {
                    ReviewSwitch::Goals => self.configure_goals().await?,
                    other => self.toggle(other).await?,
                }
            }

            self.save_and_continue().await?;
            let configure = El::MarkerText(CONFIGURE_MARKER.to_string());
            expect(self.page, configure.locator())
                .timeout(self.timeouts.marker())
                .to_be_hidden()
                .await
        })
        .await
    }

    /// Enable goal linking and attach every goal cycle.
    pub async fn configure_goals(&self) -> E2eResult<()> {
        operation("configure_goals", async {
            self.toggle(ReviewSwitch::Goals).await?;
            self.click(El::GoalCycleDropdown).await?;
            self.appear(El::SelectAllGoalCycles).await?;
            self.click(El::SelectAllGoalCycles).await?;
            self.appear(El::AllCyclesSelectedHelper).await?;
            self.click(El::AllCyclesSelectedHelper).await
        })
        .await
    }

    pub async fn create_self_review_form(&self) -> E2eResult<()> {
        operation("create_self_review_form", async {
            self.step_marker(WizardStep::Forms).await?;
            info!("Creating self review form");
            self.build_form_from_scratch(&[0, 5]).await?;
            self.click(El::SelfFormSectionAdd).await?;
            self.save_and_continue().await?;
            self.marker(El::CreateFormButton).await
        })
        .await
    }

    pub async fn create_peer_review_form(&self) -> E2eResult<()> {
        operation("create_peer_review_form", async {
            info!("Creating peer review form");
            self.build_form_from_scratch(&[0, 1]).await?;
            self.save_and_continue().await?;

            // The peer form needs a second Save & Continue to leave the Forms step.
            let button = El::SaveAndContinueButton.locator();
            expect(self.page, button.clone())
                .timeout(self.timeouts.marker())
                .to_be_enabled()
                .await?;
            self.page.click(&button, self.timeouts.action()).await
        })
        .await
    }

    pub async fn add_reviewees(&self, count: usize) -> E2eResult<()> {
        operation("add_reviewees", async {
            self.step_marker(WizardStep::Reviewees).await?;
            info!("Adding {} reviewee(s)", count);
            for index in 0..count {
                self.click(El::RevieweePlusButton(index)).await?;
            }
            if count > 0 {
                self.click(El::RevieweeCommitButton).await?;
            }
            self.save_and_continue().await
        })
        .await
    }

    pub async fn add_reviewer_mapping(&self) -> E2eResult<()> {
        self.add_reviewer_mapping_with(ReviewerMapping::default()).await
    }

    pub async fn add_reviewer_mapping_with(&self, mapping: ReviewerMapping) -> E2eResult<()> {
        operation("add_reviewer_mapping", async {
            self.marker(El::AddReviewersButton).await?;
            self.click(El::AddReviewersButton).await?;

            self.appear(El::SearchReviewerField).await?;
            self.click(El::SearchReviewerField).await?;
            self.appear(El::SearchResult(mapping.reviewer.clone())).await?;
            self.click(El::SearchResult(mapping.reviewer.clone())).await?;

            self.click(El::SearchRevieweeField).await?;
            self.appear(El::SearchResult(mapping.reviewee.clone())).await?;
            self.click(El::SearchResult(mapping.reviewee.clone())).await?;

            self.click(El::AddMappingButton).await?;
            self.save_and_continue().await
        })
        .await
    }

    /// Save the wizard as a draft; with a title, also check the draft list
    /// shows it.
    pub async fn save_as_draft(&self, title: Option<&str>) -> E2eResult<()> {
        operation("save_as_draft", async {
            self.appear(El::SaveAsDraftButton).await?;
            self.click(El::SaveAsDraftButton).await?;
            match title {
                Some(title) => {
                    expect(self.page, El::DraftTitle(title.to_string()).locator().first())
                        .timeout(self.timeouts.marker())
                        .to_be_visible()
                        .await
                }
                None => self.settle().await,
            }
        })
        .await
    }

    pub async fn go_to_step(&self, step: u8) -> E2eResult<()> {
        operation("go_to_step", async {
            let target = WizardStep::from_number(step).ok_or_else(|| {
                E2eError::InvalidArgument(format!("wizard step {} is outside 1..=6", step))
            })?;
            self.click(El::StepNav(step)).await?;
            let arrived = match target {
                WizardStep::Verify => El::VerifyPageText,
                other => match other.marker() {
                    Some(text) => El::MarkerText(text.to_string()),
                    None => return self.settle().await,
                },
            };
            expect(self.page, arrived.locator())
                .timeout(self.timeouts.marker())
                .to_be_visible()
                .await
        })
        .await
    }

    pub async fn go_to_verify_step(&self) -> E2eResult<()> {
        self.go_to_step(WizardStep::Verify.number()).await
    }

    /// Open a draft by exact title, or the first draft in the list.
    pub async fn open_draft(&self, title: Option<&str>) -> E2eResult<()> {
        operation("open_draft", async {
            let target = match title {
                Some(title) => El::DraftTitle(title.to_string()).locator().first(),
                None => El::DraftListItems.locator().first(),
            };
            self.page.click(&target, self.timeouts.marker()).await?;
            self.page
                .wait_for(&El::CreationLayout.locator(), WaitState::Attached, self.timeouts.marker())
                .await
        })
        .await
    }

    pub async fn verify_form_has_questions(&self) -> E2eResult<()> {
        operation("verify_form_has_questions", async {
            let cards = El::FormQuestionCard.locator();
            self.page
                .wait_for(&cards, WaitState::Attached, self.timeouts.marker())
                .await?;
            let questions = self.page.count(&cards).await?;
            if questions == 0 {
                return Err(E2eError::AssertionFailed(
                    "expected the form to contain at least one question".to_string(),
                ));
            }
            debug!("form has {} question(s)", questions);
            Ok(())
        })
        .await
    }

    pub async fn edit_form(&self) -> E2eResult<()> {
        operation("edit_form", async {
            self.click(El::EditFormButton).await?;
            self.marker(El::SaveAndContinueButton).await
        })
        .await
    }

    /// Finalize the cycle from the Verify step. The result is no longer a draft.
    pub async fn create_review_cycle_explicitly(&self) -> E2eResult<()> {
        operation("create_review_cycle_explicitly", async {
            self.click(El::CreateReviewCycleButton).await?;
            expect(self.page, El::CreateReviewCycleButton.locator())
                .timeout(self.timeouts.marker())
                .to_be_hidden()
                .await
        })
        .await
    }

    pub async fn verify_phase_status(&self, status: &str) -> E2eResult<()> {
        operation("verify_phase_status", async {
            self.click(El::PhasesTab).await?;
            expect(self.page, El::StatusText(status.to_string()).locator())
                .timeout(self.timeouts.marker())
                .to_be_visible()
                .await
        })
        .await
    }

    /// Close the creation modal without saving, confirming a discard prompt
    /// if the application shows one.
    pub async fn exit_creation_flow(&self) -> E2eResult<()> {
        operation("exit_creation_flow", async {
            self.click(El::CloseModalButton).await?;

            let page = self.page;
            let action = self.timeouts.action();
            let layout = &El::CreationLayout.locator();
            let discard = &El::ConfirmDiscardButton.locator();
            let outcome = poll_until(self.timeouts.marker(), move || async move {
                if !page.is_visible(layout).await? {
                    return Ok(Probe::Done(()));
                }
                if page.is_visible(discard).await? {
                    warn!("Discard confirmation shown, confirming");
                    page.click(discard, action).await?;
                }
                Ok(Probe::Pending("creation modal still open".to_string()))
            })
            .await?;
            outcome.map_err(|observed| E2eError::AssertionFailed(format!("exit failed: {}", observed)))
        })
        .await
    }
}
