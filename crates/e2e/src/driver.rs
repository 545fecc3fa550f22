//! Browser driver abstraction
//!
//! The flows only ever talk to a [`Page`]. The Playwright bridge implements it
//! for real browsers; unit tests implement it with a scripted fake.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::locator::Locator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// One isolated browser context with a single tab.
///
/// Every call resolves its locator afresh. Actions auto-wait for their
/// target to become actionable up to the given timeout; queries answer
/// immediately with whatever the page shows right now.
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;
    async fn reload(&self) -> E2eResult<()>;
    async fn go_back(&self) -> E2eResult<()>;
    async fn url(&self) -> E2eResult<String>;
    async fn title(&self) -> E2eResult<String>;
    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()>;
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()>;

    async fn click(&self, locator: &Locator, timeout: Duration) -> E2eResult<()>;
    async fn fill(&self, locator: &Locator, value: &str, timeout: Duration) -> E2eResult<()>;
    async fn hover(&self, locator: &Locator, timeout: Duration) -> E2eResult<()>;
    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> E2eResult<()>;

    /// Click an element that opens a new tab; returns the tab's URL once it
    /// has loaded and closes the tab.
    async fn click_for_popup(&self, locator: &Locator, timeout: Duration) -> E2eResult<String>;

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;
    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool>;
    async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool>;
    async fn inner_text(&self, locator: &Locator) -> E2eResult<String>;
    async fn input_value(&self, locator: &Locator) -> E2eResult<String>;
    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;
    async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>>;

    async fn close(&self) -> E2eResult<()>;
}

/// Source of fresh, isolated pages (new browser context + new tab).
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn new_page(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory page used by unit tests.

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Instant;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::E2eError;

    #[derive(Debug, Clone)]
    pub struct FakeElement {
        pub count: usize,
        pub visible: bool,
        pub enabled: bool,
        pub text: String,
        pub value: String,
        pub attributes: HashMap<String, String>,
        pub bbox: Option<BoundingBox>,
    }

    impl Default for FakeElement {
        fn default() -> Self {
            Self {
                count: 1,
                visible: true,
                enabled: true,
                text: String::new(),
                value: String::new(),
                attributes: HashMap::new(),
                bbox: None,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Action {
        Goto(String),
        Reload,
        GoBack,
        Viewport(u32, u32),
        Click(String),
        Fill(String, String),
        Hover(String),
        Scroll(String),
        Popup(String),
    }

    type Hook = Arc<dyn Fn(&mut FakeState) + Send + Sync>;

    #[derive(Default)]
    pub struct FakeState {
        pub elements: HashMap<String, FakeElement>,
        pub url: String,
        pub title: String,
        pub actions: Vec<Action>,
        pub popups: HashMap<String, String>,
        /// Elements that render once their instant has passed.
        pub delayed: Vec<(Instant, String, FakeElement)>,
    }

    impl FakeState {
        fn render_due(&mut self) {
            let now = Instant::now();
            let (due, later): (Vec<_>, Vec<_>) =
                std::mem::take(&mut self.delayed).into_iter().partition(|(at, _, _)| *at <= now);
            self.delayed = later;
            for (_, key, element) in due {
                self.elements.insert(key, element);
            }
        }

        pub fn show(&mut self, locator: &Locator) -> &mut FakeElement {
            self.elements.entry(locator.to_string()).or_default()
        }

        pub fn hide(&mut self, locator: &Locator) {
            self.elements.remove(&locator.to_string());
        }
    }

    /// Page whose DOM is a map from locator description to element state.
    ///
    /// Unknown locators count as absent. Hooks registered with `on_click`
    /// mutate the state when the matching locator is clicked, which is how
    /// tests model the application reacting to the flow.
    #[derive(Clone, Default)]
    pub struct FakePage {
        state: Arc<Mutex<FakeState>>,
        hooks: Arc<Mutex<HashMap<String, Vec<Hook>>>>,
    }

    impl FakePage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
            f(&mut *self.state.lock())
        }

        pub fn show(&self, locator: &Locator) {
            self.with_state(|s| {
                s.show(locator);
            });
        }

        /// Render `element` at `locator` only after `delay` has elapsed.
        pub fn show_after(&self, locator: &Locator, delay: Duration, element: FakeElement) {
            let at = Instant::now() + delay;
            self.with_state(|s| s.delayed.push((at, locator.to_string(), element)));
        }

        pub fn on_click(&self, locator: &Locator, hook: impl Fn(&mut FakeState) + Send + Sync + 'static) {
            self.hooks
                .lock()
                .entry(locator.to_string())
                .or_default()
                .push(Arc::new(hook));
        }

        pub fn actions(&self) -> Vec<Action> {
            self.state.lock().actions.clone()
        }

        pub fn clicks(&self) -> Vec<String> {
            self.actions()
                .into_iter()
                .filter_map(|a| match a {
                    Action::Click(l) => Some(l),
                    _ => None,
                })
                .collect()
        }

        pub fn clicked(&self, locator: &Locator) -> usize {
            let key = locator.to_string();
            self.clicks().iter().filter(|c| **c == key).count()
        }

        fn element(&self, locator: &Locator) -> Option<FakeElement> {
            let mut state = self.state.lock();
            state.render_due();
            state
                .elements
                .get(&locator.to_string())
                .filter(|e| e.count > 0)
                .cloned()
        }

        fn require(&self, locator: &Locator) -> E2eResult<FakeElement> {
            match self.element(locator) {
                Some(e) if e.visible && e.enabled => Ok(e),
                _ => Err(E2eError::ElementNotFound { locator: locator.to_string() }),
            }
        }

        fn record(&self, action: Action) {
            self.state.lock().actions.push(action);
        }
    }

    #[async_trait]
    impl Page for FakePage {
        async fn goto(&self, url: &str) -> E2eResult<()> {
            self.record(Action::Goto(url.to_string()));
            self.state.lock().url = url.to_string();
            Ok(())
        }

        async fn reload(&self) -> E2eResult<()> {
            self.record(Action::Reload);
            Ok(())
        }

        async fn go_back(&self) -> E2eResult<()> {
            self.record(Action::GoBack);
            Ok(())
        }

        async fn url(&self) -> E2eResult<String> {
            Ok(self.state.lock().url.clone())
        }

        async fn title(&self) -> E2eResult<String> {
            Ok(self.state.lock().title.clone())
        }

        async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()> {
            self.record(Action::Viewport(viewport.width, viewport.height));
            Ok(())
        }

        async fn wait_for_load_state(&self, _state: LoadState, _timeout: Duration) -> E2eResult<()> {
            Ok(())
        }

        async fn click(&self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
            self.require(locator)?;
            let key = locator.to_string();
            self.record(Action::Click(key.clone()));
            let hooks = self.hooks.lock().get(&key).cloned().unwrap_or_default();
            let mut state = self.state.lock();
            for hook in hooks {
                hook(&mut *state);
            }
            Ok(())
        }

        async fn fill(&self, locator: &Locator, value: &str, _timeout: Duration) -> E2eResult<()> {
            self.require(locator)?;
            self.record(Action::Fill(locator.to_string(), value.to_string()));
            self.state.lock().show(locator).value = value.to_string();
            Ok(())
        }

        async fn hover(&self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
            self.require(locator)?;
            self.record(Action::Hover(locator.to_string()));
            Ok(())
        }

        async fn scroll_into_view(&self, locator: &Locator, _timeout: Duration) -> E2eResult<()> {
            self.require(locator)?;
            self.record(Action::Scroll(locator.to_string()));
            Ok(())
        }

        async fn click_for_popup(&self, locator: &Locator, _timeout: Duration) -> E2eResult<String> {
            self.require(locator)?;
            let key = locator.to_string();
            self.record(Action::Popup(key.clone()));
            self.state
                .lock()
                .popups
                .get(&key)
                .cloned()
                .ok_or_else(|| E2eError::Timeout(format!("popup from {}", key)))
        }

        async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
            let deadline = Instant::now() + timeout;
            loop {
                let element = self.element(locator);
                let ok = match state {
                    WaitState::Visible => element.map(|e| e.visible).unwrap_or(false),
                    WaitState::Hidden => element.map(|e| !e.visible).unwrap_or(true),
                    WaitState::Attached => element.is_some(),
                    WaitState::Detached => element.is_none(),
                };
                if ok {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(E2eError::Timeout(format!("{} to be {}", locator, state.as_str())));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        async fn count(&self, locator: &Locator) -> E2eResult<usize> {
            Ok(self.element(locator).map(|e| e.count).unwrap_or(0))
        }

        async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
            Ok(self.element(locator).map(|e| e.visible).unwrap_or(false))
        }

        async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool> {
            Ok(self.element(locator).map(|e| e.enabled).unwrap_or(false))
        }

        async fn inner_text(&self, locator: &Locator) -> E2eResult<String> {
            self.element(locator)
                .map(|e| e.text)
                .ok_or_else(|| E2eError::ElementNotFound { locator: locator.to_string() })
        }

        async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
            self.element(locator)
                .map(|e| e.value)
                .ok_or_else(|| E2eError::ElementNotFound { locator: locator.to_string() })
        }

        async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
            self.element(locator)
                .map(|e| e.attributes.get(name).cloned())
                .ok_or_else(|| E2eError::ElementNotFound { locator: locator.to_string() })
        }

        async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
            Ok(self.element(locator).and_then(|e| e.bbox))
        }

        async fn close(&self) -> E2eResult<()> {
            Ok(())
        }
    }

    /// Hands out clones of one shared fake page.
    pub struct FakeFactory {
        pub page: FakePage,
        pub created: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl PageFactory for FakeFactory {
        async fn new_page(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>> {
            *self.created.lock() += 1;
            self.page.set_viewport(viewport).await?;
            Ok(Box::new(self.page.clone()))
        }
    }
}
