//! Demo storefront (saucedemo) flows

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{operation, FlowTimeouts};
use crate::driver::{LoadState, Page};
use crate::error::{E2eError, E2eResult};
use crate::expect::{expect, expect_url};
use crate::locator::Locator;
use crate::registry::StorefrontElement as El;

pub const STOREFRONT_URL: &str = "https://www.saucedemo.com/";
pub const STANDARD_USER: &str = "standard_user";
pub const PASSWORD: &str = "secret_sauce";

/// Fields of the "Your Information" checkout form. Absent fields are left
/// blank so validation errors can be exercised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub postal: Option<String>,
}

impl CheckoutInfo {
    pub fn complete(first: &str, last: &str, postal: &str) -> Self {
        Self {
            first: Some(first.to_string()),
            last: Some(last.to_string()),
            postal: Some(postal.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialNetwork {
    Twitter,
    Facebook,
    Linkedin,
}

impl SocialNetwork {
    pub fn element(&self) -> El {
        match self {
            SocialNetwork::Twitter => El::SocialTwitter,
            SocialNetwork::Facebook => El::SocialFacebook,
            SocialNetwork::Linkedin => El::SocialLinkedin,
        }
    }
}

pub struct StorefrontFlow<'a, P: Page + ?Sized> {
    page: &'a P,
    base_url: String,
    timeouts: FlowTimeouts,
}

impl<'a, P: Page + ?Sized> StorefrontFlow<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self::with_base_url(page, STOREFRONT_URL, FlowTimeouts::default())
    }

    pub fn with_base_url(page: &'a P, base_url: &str, timeouts: FlowTimeouts) -> Self {
        Self {
            page,
            base_url: base_url.to_string(),
            timeouts,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn click(&self, element: El) -> E2eResult<()> {
        self.page.click(&element.locator(), self.timeouts.action()).await
    }

    async fn fill(&self, element: El, value: &str) -> E2eResult<()> {
        self.page.fill(&element.locator(), value, self.timeouts.action()).await
    }

    async fn expect_path(&self, fragment: &str) -> E2eResult<()> {
        let pattern = Regex::new(&regex::escape(fragment))?;
        expect_url(self.page, &pattern, self.timeouts.marker()).await
    }

    pub async fn open_login_page(&self) -> E2eResult<()> {
        operation("open_login_page", async {
            self.page.goto(&self.base_url).await?;
            self.page
                .wait_for_load_state(LoadState::DomContentLoaded, self.timeouts.settle())
                .await
        })
        .await
    }

    /// Submit the login form; does not assert where the application lands.
    pub async fn login(&self, username: &str, password: &str) -> E2eResult<()> {
        operation("login", async {
            debug!("logging in as '{}'", username);
            self.open_login_page().await?;
            self.fill(El::UsernameInput, username).await?;
            self.fill(El::PasswordInput, password).await?;
            self.click(El::LoginButton).await
        })
        .await
    }

    pub async fn login_standard_user(&self) -> E2eResult<()> {
        operation("login_standard_user", async {
            self.login(STANDARD_USER, PASSWORD).await?;
            self.expect_path("inventory.html").await
        })
        .await
    }

    pub async fn login_error_text(&self) -> E2eResult<String> {
        operation("login_error_text", async {
            let error = El::ErrorMessage.locator();
            expect(self.page, error.clone())
                .timeout(self.timeouts.action())
                .to_be_visible()
                .await?;
            Ok(self.page.inner_text(&error).await?.trim().to_string())
        })
        .await
    }

    pub async fn add_first_product(&self) -> E2eResult<()> {
        operation("add_first_product", async {
            self.page
                .click(&El::AddToCartButton.locator().first(), self.timeouts.action())
                .await
        })
        .await
    }

    pub async fn open_cart(&self) -> E2eResult<()> {
        operation("open_cart", async {
            self.click(El::CartLink).await?;
            self.expect_path("cart.html").await
        })
        .await
    }

    pub async fn remove_first_from_cart(&self) -> E2eResult<()> {
        operation("remove_first_from_cart", async {
            self.page
                .click(&El::RemoveButton.locator().first(), self.timeouts.action())
                .await
        })
        .await
    }

    pub async fn cart_item_count(&self) -> E2eResult<usize> {
        self.page.count(&El::CartItem.locator()).await
    }

    /// Badge text on the cart icon, `None` when the cart is empty.
    pub async fn cart_badge_text(&self) -> E2eResult<Option<String>> {
        let badge = El::CartBadge.locator();
        if !self.page.is_visible(&badge).await? {
            return Ok(None);
        }
        Ok(Some(self.page.inner_text(&badge).await?.trim().to_string()))
    }

    pub async fn open_first_product(&self) -> E2eResult<()> {
        operation("open_first_product", async {
            self.page
                .click(&El::ItemName.locator().first(), self.timeouts.action())
                .await?;
            self.expect_path("inventory-item.html").await
        })
        .await
    }

    pub async fn back_to_products(&self) -> E2eResult<()> {
        operation("back_to_products", async {
            self.click(El::BackToProducts).await?;
            self.expect_path("inventory.html").await
        })
        .await
    }

    pub async fn proceed_to_checkout(&self) -> E2eResult<()> {
        operation("proceed_to_checkout", async {
            self.click(El::CheckoutButton).await?;
            self.expect_path("checkout-step-one.html").await
        })
        .await
    }

    pub async fn fill_checkout_info(&self, info: &CheckoutInfo) -> E2eResult<()> {
        operation("fill_checkout_info", async {
            let fields = [
                (El::FirstNameInput, &info.first),
                (El::LastNameInput, &info.last),
                (El::PostalCodeInput, &info.postal),
            ];
            for (element, value) in fields {
                if let Some(value) = value {
                    self.fill(element, value).await?;
                }
            }
            Ok(())
        })
        .await
    }

    pub async fn continue_checkout(&self) -> E2eResult<()> {
        operation("continue_checkout", self.click(El::ContinueButton)).await
    }

    pub async fn finish_order(&self) -> E2eResult<()> {
        operation("finish_order", async {
            self.click(El::FinishButton).await?;
            self.expect_path("checkout-complete.html").await
        })
        .await
    }

    /// Log in, buy the first product and land on the thank-you page.
    pub async fn complete_order(&self, info: &CheckoutInfo) -> E2eResult<()> {
        operation("complete_order", async {
            info!("Placing an order for the first product");
            self.login_standard_user().await?;
            self.add_first_product().await?;
            self.open_cart().await?;
            self.proceed_to_checkout().await?;
            self.fill_checkout_info(info).await?;
            self.continue_checkout().await?;
            self.finish_order().await
        })
        .await
    }

    pub async fn open_menu(&self) -> E2eResult<()> {
        operation("open_menu", async {
            self.click(El::MenuButton).await?;
            expect(self.page, El::LogoutSidebarLink.locator())
                .timeout(self.timeouts.action())
                .to_be_visible()
                .await
        })
        .await
    }

    pub async fn close_menu(&self) -> E2eResult<()> {
        operation("close_menu", async {
            self.click(El::MenuCloseButton).await?;
            expect(self.page, El::LogoutSidebarLink.locator())
                .timeout(self.timeouts.action())
                .to_be_hidden()
                .await
        })
        .await
    }

    pub async fn logout(&self) -> E2eResult<()> {
        operation("logout", async {
            self.open_menu().await?;
            self.click(El::LogoutSidebarLink).await?;
            expect(self.page, El::LoginButton.locator())
                .timeout(self.timeouts.marker())
                .to_be_visible()
                .await
        })
        .await
    }

    pub async fn scroll_to_footer(&self) -> E2eResult<()> {
        self.page
            .scroll_into_view(&El::Footer.locator(), self.timeouts.action())
            .await
    }

    pub async fn social_link_href(&self, network: SocialNetwork) -> E2eResult<String> {
        let anchor = network.element().locator().locator("a");
        self.page
            .get_attribute(&anchor, "href")
            .await?
            .ok_or_else(|| E2eError::AssertionFailed(format!("{} has no href", anchor)))
    }

    /// Click a social link and return the URL of the tab it opens.
    pub async fn open_social_link(&self, network: SocialNetwork) -> E2eResult<String> {
        operation("open_social_link", async {
            self.page
                .click_for_popup(&network.element().locator(), self.timeouts.marker())
                .await
        })
        .await
    }

    /// Horizontal distance in pixels between the centers of two elements.
    pub async fn horizontal_center_offset(&self, child: &Locator, parent: &Locator) -> E2eResult<f64> {
        let child_box = self.page.bounding_box(child).await?;
        let parent_box = self.page.bounding_box(parent).await?;
        match (child_box, parent_box) {
            (Some(c), Some(p)) => Ok((c.center_x() - p.center_x()).abs()),
            (None, _) => Err(E2eError::ElementNotFound { locator: child.to_string() }),
            (_, None) => Err(E2eError::ElementNotFound { locator: parent.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{Action, FakePage};
    use crate::driver::BoundingBox;
    use crate::error::FailureKind;

    fn fast() -> FlowTimeouts {
        FlowTimeouts {
            marker_ms: 150,
            action_ms: 150,
            settle_ms: 150,
        }
    }

    fn login_page() -> FakePage {
        let page = FakePage::new();
        for el in [El::UsernameInput, El::PasswordInput, El::LoginButton] {
            page.show(&el.locator());
        }
        page
    }

    #[tokio::test]
    async fn standard_login_lands_on_inventory() {
        let page = login_page();
        page.on_click(&El::LoginButton.locator(), |s| {
            s.url = "https://www.saucedemo.com/inventory.html".to_string();
        });
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());

        flow.login_standard_user().await.unwrap();

        let actions = page.actions();
        assert_eq!(actions[0], Action::Goto(STOREFRONT_URL.to_string()));
        assert!(actions.contains(&Action::Fill(El::UsernameInput.locator().to_string(), STANDARD_USER.to_string())));
        assert!(actions.contains(&Action::Fill(El::PasswordInput.locator().to_string(), PASSWORD.to_string())));
    }

    #[tokio::test]
    async fn locked_out_user_stays_on_login() {
        let page = login_page();
        let error = El::ErrorMessage.locator();
        page.on_click(&El::LoginButton.locator(), move |s| {
            s.show(&error).text = "Epic sadface: Sorry, this user has been locked out.".to_string();
        });
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());

        let err = flow.login_standard_user().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::AssertionFailed);
        assert_eq!(err.operation(), Some("login_standard_user"));

        let text = flow.login_error_text().await.unwrap();
        assert!(text.contains("locked out"));
    }

    #[tokio::test]
    async fn checkout_fills_only_present_fields() {
        let page = FakePage::new();
        for el in [El::FirstNameInput, El::LastNameInput, El::PostalCodeInput] {
            page.show(&el.locator());
        }
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());
        let info = CheckoutInfo {
            first: None,
            last: Some("Shaik".to_string()),
            postal: Some("500001".to_string()),
        };

        flow.fill_checkout_info(&info).await.unwrap();

        let fills: Vec<_> = page
            .actions()
            .into_iter()
            .filter(|a| matches!(a, Action::Fill(..)))
            .collect();
        assert_eq!(
            fills,
            vec![
                Action::Fill(El::LastNameInput.locator().to_string(), "Shaik".to_string()),
                Action::Fill(El::PostalCodeInput.locator().to_string(), "500001".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn cart_badge_absent_when_empty() {
        let page = FakePage::new();
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());
        assert_eq!(flow.cart_badge_text().await.unwrap(), None);
        assert_eq!(flow.cart_item_count().await.unwrap(), 0);

        page.with_state(|s| s.show(&El::CartBadge.locator()).text = "1".to_string());
        assert_eq!(flow.cart_badge_text().await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn center_offset_uses_bounding_boxes() {
        let page = FakePage::new();
        let logo = El::AppLogo.locator();
        let header = El::Header.locator();
        page.with_state(|s| {
            s.show(&logo).bbox = Some(BoundingBox { x: 540.0, y: 10.0, width: 200.0, height: 30.0 });
            s.show(&header).bbox = Some(BoundingBox { x: 0.0, y: 0.0, width: 1283.0, height: 60.0 });
        });
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());

        let offset = flow.horizontal_center_offset(&logo, &header).await.unwrap();
        assert!((offset - 1.5).abs() < f64::EPSILON);

        let missing = flow.horizontal_center_offset(&El::Footer.locator(), &header).await;
        assert!(matches!(missing, Err(E2eError::ElementNotFound { .. })));
    }

    #[tokio::test]
    async fn social_links_read_anchor_href() {
        let page = FakePage::new();
        let anchor = El::SocialLinkedin.locator().locator("a");
        page.with_state(|s| {
            s.show(&anchor)
                .attributes
                .insert("href".to_string(), "https://www.linkedin.com/company/sauce-labs/".to_string());
        });
        let flow = StorefrontFlow::with_base_url(&page, STOREFRONT_URL, fast());

        let href = flow.social_link_href(SocialNetwork::Linkedin).await.unwrap();
        assert!(href.contains("linkedin.com"));
    }
}
