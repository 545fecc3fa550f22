//! Locator registry for the two applications under test
//!
//! Every selector the flows and scenario specs rely on lives here, keyed by a
//! stable semantic name. A markup change in either application is a change
//! to this file and nowhere else.

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, TextMatch};

/// Marker shown on the terminal "Verify" step of the review-cycle wizard.
pub const VERIFY_PAGE_TEXT: &str =
    "You are good to go. Just review your choices and you are good to go.";

/// Result rows of the reviewer/reviewee search popups.
pub const SEARCH_RESULT_CSS: &str = ".fw-500.fs-smedium.ellipsis";

/// Question cards in the review form builder.
pub const QUESTION_CARD_CSS: &str = ".draggable-question-card";

/// Feature switches on the "Configure" step.
///
/// The page exposes the switches without accessible names, so they are
/// addressed by document order: self review first, peer review second,
/// goals fifth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewSwitch {
    SelfReview,
    PeerReview,
    Goals,
}

impl ReviewSwitch {
    pub fn ordinal(&self) -> usize {
        match self {
            ReviewSwitch::SelfReview => 0,
            ReviewSwitch::PeerReview => 1,
            ReviewSwitch::Goals => 4,
        }
    }
}

/// Which row to take from a search result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// Row at a position in the result list, which the application orders
    /// alphabetically by display name.
    Position(usize),
    /// Row whose text equals the given name.
    Named(String),
}

impl Pick {
    /// A number picks by position, anything else by name.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(index) => Pick::Position(index),
            Err(_) => Pick::Named(raw.to_string()),
        }
    }
}

/// Review-cycle (performance review SaaS) element catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCycleElement {
    ReviewsNav,
    CreateNewCycleButton,
    CreatePerformanceReviewButton,
    TitleInput,
    SaveAndContinueButton,
    SaveAsDraftButton,
    CreateFormButton,
    CreateFromScratchButton,
    AddQuestionButton(usize),
    AddReviewersButton,
    VerifyPageText,
    StepNav(u8),
    Switch(ReviewSwitch),
    GoalCycleDropdown,
    SelectAllGoalCycles,
    AllCyclesSelectedHelper,
    EditFormButton,
    FormQuestionCard,
    FormBuilderAdd(usize),
    /// Add button of the tenth form-builder section; only the self-review
    /// template has one.
    SelfFormSectionAdd,
    RevieweePlusButton(usize),
    /// Commit button of the reviewee picker (seventh grid row).
    RevieweeCommitButton,
    SearchReviewerField,
    SearchRevieweeField,
    SearchResult(Pick),
    AddMappingButton,
    DraftListItems,
    DraftTitle(String),
    CloseModalButton,
    ConfirmDiscardButton,
    CreationLayout,
    CreateReviewCycleButton,
    PhasesTab,
    StatusText(String),
    MarkerText(String),
}

impl ReviewCycleElement {
    pub fn locator(&self) -> Locator {
        use ReviewCycleElement::*;
        match self {
            ReviewsNav => Locator::role_exact("link", "Reviews"),
            CreateNewCycleButton => Locator::role_named("button", "Create New Cycle"),
            CreatePerformanceReviewButton => Locator::css(".ant-modal-body").get_by_role(
                "button",
                Some(TextMatch::Substring("Create Performance Review".to_string())),
            ),
            TitleInput => Locator::id("review-name"),
            SaveAndContinueButton => Locator::role_named("button", "Save & Continue"),
            SaveAsDraftButton => Locator::role_named("button", "Save as Draft"),
            CreateFormButton => Locator::role_named("button", "Create Form").first(),
            CreateFromScratchButton => Locator::role_named("button", "Create From Scratch"),
            AddQuestionButton(index) => Locator::role_named("button", "Add").nth(*index),
            AddReviewersButton => Locator::role_named("button", "Add Reviewers"),
            VerifyPageText => Locator::text(VERIFY_PAGE_TEXT),
            StepNav(step) => Locator::text(step.to_string()),
            Switch(switch) => Locator::role("switch").nth(switch.ordinal()),
            GoalCycleDropdown => {
                Locator::css("div").filter_text(TextMatch::Regex("^Select Goal Cycles$".to_string()))
            }
            SelectAllGoalCycles => Locator::role_named("menuitem", "Select All Goal Cycles"),
            AllCyclesSelectedHelper => {
                Locator::css("div").filter_text(TextMatch::Regex("^All Cycles Selected$".to_string()))
            }
            EditFormButton => Locator::role_named("button", "Edit Form").first(),
            FormQuestionCard => Locator::css(QUESTION_CARD_CSS),
            FormBuilderAdd(index) => Locator::css("button:has-text(\"Add\")").nth(*index),
            SelfFormSectionAdd => Locator::css("div:nth-child(10) > .flex.justify-between > .ant-btn"),
            RevieweePlusButton(index) => Locator::role_named("button", "plus").nth(*index),
            RevieweeCommitButton => {
                Locator::css("div:nth-child(7) > .grid-row > .add-button-wrapper > div > .ant-btn")
            }
            SearchReviewerField => {
                Locator::css("div").filter_text(TextMatch::Regex("^Search Reviewer$".to_string())).nth(2)
            }
            SearchRevieweeField => {
                Locator::css("div").filter_text(TextMatch::Regex("^Search Reviewee$".to_string())).nth(2)
            }
            SearchResult(Pick::Position(index)) => Locator::css(SEARCH_RESULT_CSS).nth(*index),
            SearchResult(Pick::Named(name)) => Locator::css(SEARCH_RESULT_CSS)
                .filter_text(TextMatch::Exact(name.clone()))
                .first(),
            AddMappingButton => Locator::role_exact("button", "Add"),
            DraftListItems => Locator::css(".flex.flex-col.flex-grow-1"),
            DraftTitle(title) => Locator::text(title.clone()),
            CloseModalButton => Locator::css(".review-creation-form-layout .close-btn").first(),
            ConfirmDiscardButton => {
                Locator::role_matching("button", "(Discard|Leave|Yes|OK|Confirm)").first()
            }
            CreationLayout => Locator::css(".review-creation-form-layout"),
            CreateReviewCycleButton => Locator::role_named("button", "Create Review Cycle"),
            PhasesTab => Locator::css("span").filter_text(TextMatch::Substring("Phases".to_string())),
            StatusText(text) => Locator::text_exact(text.clone()),
            MarkerText(text) => Locator::text(text.clone()),
        }
    }
}

/// Storefront (demo e-commerce) element catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorefrontElement {
    UsernameInput,
    PasswordInput,
    LoginButton,
    LoginContainer,
    LoginLogo,
    ErrorMessage,
    Title,
    AppLogo,
    Header,
    MenuButton,
    MenuCloseButton,
    InventorySidebarLink,
    AboutSidebarLink,
    LogoutSidebarLink,
    ResetSidebarLink,
    AddToCartButton,
    RemoveButton,
    CartLink,
    CartBadge,
    CartItem,
    CartQuantity,
    ItemName,
    ItemPrice,
    ItemImage,
    DetailsName,
    DetailsDescription,
    DetailsPrice,
    DetailsImage,
    BackToProducts,
    ContinueShopping,
    CheckoutButton,
    FirstNameInput,
    LastNameInput,
    PostalCodeInput,
    ContinueButton,
    FinishButton,
    SummaryTotal,
    CompleteHeader,
    Footer,
    SocialTwitter,
    SocialFacebook,
    SocialLinkedin,
}

impl StorefrontElement {
    pub fn locator(&self) -> Locator {
        use StorefrontElement::*;
        match self {
            UsernameInput => Locator::id("user-name"),
            PasswordInput => Locator::id("password"),
            LoginButton => Locator::id("login-button"),
            LoginContainer => Locator::id("login_button_container"),
            LoginLogo => Locator::css(".login_logo"),
            ErrorMessage => Locator::test_id("error"),
            Title => Locator::css(".title"),
            AppLogo => Locator::css(".app_logo"),
            Header => Locator::id("header_container"),
            MenuButton => Locator::id("react-burger-menu-btn"),
            MenuCloseButton => Locator::id("react-burger-cross-btn"),
            InventorySidebarLink => Locator::id("inventory_sidebar_link"),
            AboutSidebarLink => Locator::id("about_sidebar_link"),
            LogoutSidebarLink => Locator::id("logout_sidebar_link"),
            ResetSidebarLink => Locator::id("reset_sidebar_link"),
            AddToCartButton => Locator::css("button[data-test^=\"add-to-cart\"]"),
            RemoveButton => Locator::css("button[data-test^=\"remove\"]"),
            CartLink => Locator::css(".shopping_cart_link"),
            CartBadge => Locator::css(".shopping_cart_badge"),
            CartItem => Locator::css(".cart_item"),
            CartQuantity => Locator::css(".cart_quantity"),
            ItemName => Locator::css(".inventory_item_name"),
            ItemPrice => Locator::css(".inventory_item_price"),
            ItemImage => Locator::css(".inventory_item_img"),
            DetailsName => Locator::css(".inventory_details_name"),
            DetailsDescription => Locator::css(".inventory_details_desc"),
            DetailsPrice => Locator::css(".inventory_details_price"),
            DetailsImage => Locator::css(".inventory_details_img"),
            BackToProducts => Locator::id("back-to-products"),
            ContinueShopping => Locator::id("continue-shopping"),
            CheckoutButton => Locator::id("checkout"),
            FirstNameInput => Locator::id("first-name"),
            LastNameInput => Locator::id("last-name"),
            PostalCodeInput => Locator::id("postal-code"),
            ContinueButton => Locator::id("continue"),
            FinishButton => Locator::id("finish"),
            SummaryTotal => Locator::css(".summary_total_label"),
            CompleteHeader => Locator::css(".complete-header"),
            Footer => Locator::css("footer"),
            SocialTwitter => Locator::css(".social_twitter"),
            SocialFacebook => Locator::css(".social_facebook"),
            SocialLinkedin => Locator::css(".social_linkedin"),
        }
    }
}

/// A registry entry: its semantic name and the parameters it takes.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

const fn entry(name: &'static str, params: &'static [&'static str]) -> Entry {
    Entry { name, params }
}

const REVIEW_ENTRIES: &[Entry] = &[
    entry("review.reviews_nav", &[]),
    entry("review.create_new_cycle", &[]),
    entry("review.create_performance_review", &[]),
    entry("review.title_input", &[]),
    entry("review.save_and_continue", &[]),
    entry("review.save_as_draft", &[]),
    entry("review.create_form", &[]),
    entry("review.create_from_scratch", &[]),
    entry("review.add_question", &["index"]),
    entry("review.add_reviewers", &[]),
    entry("review.verify_page_text", &[]),
    entry("review.step_nav", &["step"]),
    entry("review.switch", &["self_review|peer_review|goals"]),
    entry("review.goal_cycle_dropdown", &[]),
    entry("review.select_all_goal_cycles", &[]),
    entry("review.all_cycles_selected", &[]),
    entry("review.edit_form", &[]),
    entry("review.question_card", &[]),
    entry("review.form_builder_add", &["index"]),
    entry("review.self_form_section_add", &[]),
    entry("review.reviewee_plus", &["index"]),
    entry("review.reviewee_commit", &[]),
    entry("review.search_reviewer", &[]),
    entry("review.search_reviewee", &[]),
    entry("review.search_result", &["index|name"]),
    entry("review.add_mapping", &[]),
    entry("review.draft_list_items", &[]),
    entry("review.draft_title", &["title"]),
    entry("review.close_modal", &[]),
    entry("review.confirm_discard", &[]),
    entry("review.create_review_cycle", &[]),
    entry("review.phases_tab", &[]),
    entry("review.status", &["text"]),
];

const STOREFRONT_ENTRIES: &[(&str, StorefrontElement)] = {
    use StorefrontElement::*;
    &[
        ("store.username", UsernameInput),
        ("store.password", PasswordInput),
        ("store.login_button", LoginButton),
        ("store.login_container", LoginContainer),
        ("store.login_logo", LoginLogo),
        ("store.error", ErrorMessage),
        ("store.title", Title),
        ("store.app_logo", AppLogo),
        ("store.header", Header),
        ("store.menu_button", MenuButton),
        ("store.menu_close", MenuCloseButton),
        ("store.sidebar_inventory", InventorySidebarLink),
        ("store.sidebar_about", AboutSidebarLink),
        ("store.sidebar_logout", LogoutSidebarLink),
        ("store.sidebar_reset", ResetSidebarLink),
        ("store.add_to_cart", AddToCartButton),
        ("store.remove", RemoveButton),
        ("store.cart_link", CartLink),
        ("store.cart_badge", CartBadge),
        ("store.cart_item", CartItem),
        ("store.cart_quantity", CartQuantity),
        ("store.item_name", ItemName),
        ("store.item_price", ItemPrice),
        ("store.item_image", ItemImage),
        ("store.details_name", DetailsName),
        ("store.details_desc", DetailsDescription),
        ("store.details_price", DetailsPrice),
        ("store.details_image", DetailsImage),
        ("store.back_to_products", BackToProducts),
        ("store.continue_shopping", ContinueShopping),
        ("store.checkout", CheckoutButton),
        ("store.first_name", FirstNameInput),
        ("store.last_name", LastNameInput),
        ("store.postal_code", PostalCodeInput),
        ("store.continue", ContinueButton),
        ("store.finish", FinishButton),
        ("store.summary_total", SummaryTotal),
        ("store.complete_header", CompleteHeader),
        ("store.footer", Footer),
        ("store.social_twitter", SocialTwitter),
        ("store.social_facebook", SocialFacebook),
        ("store.social_linkedin", SocialLinkedin),
    ]
};

/// Every registry entry, review-cycle entries first.
pub fn entries() -> Vec<Entry> {
    REVIEW_ENTRIES
        .iter()
        .copied()
        .chain(STOREFRONT_ENTRIES.iter().map(|(name, _)| entry(*name, &[])))
        .collect()
}

/// Resolve a semantic name and its parameters into a locator.
pub fn resolve(name: &str, params: &[String]) -> E2eResult<Locator> {
    if let Some((_, element)) = STOREFRONT_ENTRIES.iter().find(|(n, _)| *n == name) {
        expect_params(name, params, 0)?;
        return Ok(element.locator());
    }
    review_element(name, params).map(|e| e.locator())
}

fn review_element(name: &str, params: &[String]) -> E2eResult<ReviewCycleElement> {
    use ReviewCycleElement::*;

    let entry = REVIEW_ENTRIES
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| E2eError::UnknownLocator(name.to_string()))?;
    expect_params(name, params, entry.params.len())?;

    let element = match name {
        "review.reviews_nav" => ReviewsNav,
        "review.create_new_cycle" => CreateNewCycleButton,
        "review.create_performance_review" => CreatePerformanceReviewButton,
        "review.title_input" => TitleInput,
        "review.save_and_continue" => SaveAndContinueButton,
        "review.save_as_draft" => SaveAsDraftButton,
        "review.create_form" => CreateFormButton,
        "review.create_from_scratch" => CreateFromScratchButton,
        "review.add_question" => AddQuestionButton(index_param(name, &params[0])?),
        "review.add_reviewers" => AddReviewersButton,
        "review.verify_page_text" => VerifyPageText,
        "review.step_nav" => {
            let step: u8 = params[0].parse().map_err(|_| bad_param(name, &params[0]))?;
            StepNav(step)
        }
        "review.switch" => Switch(match params[0].as_str() {
            "self_review" => ReviewSwitch::SelfReview,
            "peer_review" => ReviewSwitch::PeerReview,
            "goals" => ReviewSwitch::Goals,
            other => return Err(bad_param(name, other)),
        }),
        "review.goal_cycle_dropdown" => GoalCycleDropdown,
        "review.select_all_goal_cycles" => SelectAllGoalCycles,
        "review.all_cycles_selected" => AllCyclesSelectedHelper,
        "review.edit_form" => EditFormButton,
        "review.question_card" => FormQuestionCard,
        "review.form_builder_add" => FormBuilderAdd(index_param(name, &params[0])?),
        "review.self_form_section_add" => SelfFormSectionAdd,
        "review.reviewee_plus" => RevieweePlusButton(index_param(name, &params[0])?),
        "review.reviewee_commit" => RevieweeCommitButton,
        "review.search_reviewer" => SearchReviewerField,
        "review.search_reviewee" => SearchRevieweeField,
        "review.search_result" => SearchResult(Pick::parse(&params[0])),
        "review.add_mapping" => AddMappingButton,
        "review.draft_list_items" => DraftListItems,
        "review.draft_title" => DraftTitle(params[0].clone()),
        "review.close_modal" => CloseModalButton,
        "review.confirm_discard" => ConfirmDiscardButton,
        "review.create_review_cycle" => CreateReviewCycleButton,
        "review.phases_tab" => PhasesTab,
        "review.status" => StatusText(params[0].clone()),
        _ => return Err(E2eError::UnknownLocator(name.to_string())),
    };
    Ok(element)
}

fn expect_params(name: &str, params: &[String], expected: usize) -> E2eResult<()> {
    if params.len() != expected {
        return Err(E2eError::UnknownLocator(format!(
            "{} takes {} parameter(s), got {}",
            name,
            expected,
            params.len()
        )));
    }
    Ok(())
}

fn index_param(name: &str, raw: &str) -> E2eResult<usize> {
    raw.parse().map_err(|_| bad_param(name, raw))
}

fn bad_param(name: &str, raw: &str) -> E2eError {
    E2eError::UnknownLocator(format!("{}: invalid parameter '{}'", name, raw))
}
