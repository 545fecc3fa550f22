//! Page-object flows: one method per multi-step user action

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eResult, FlowContext};

pub mod review_cycle;
pub mod storefront;

pub use review_cycle::{ReviewCycleFlow, ReviewOptions, ReviewerMapping, WizardStep};
pub use storefront::{CheckoutInfo, SocialNetwork, StorefrontFlow};

/// Bounds for the condition waits the flows perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTimeouts {
    /// Page or step markers that prove the flow is where it thinks it is.
    pub marker_ms: u64,
    /// Auto-wait budget for individual clicks and fills.
    pub action_ms: u64,
    /// Load-state waits after navigation.
    pub settle_ms: u64,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            marker_ms: 10_000,
            action_ms: 5_000,
            settle_ms: 5_000,
        }
    }
}

impl FlowTimeouts {
    pub fn marker(&self) -> Duration {
        Duration::from_millis(self.marker_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Run the body of a public flow operation, tagging any failure with its name.
pub(crate) async fn operation<T, F>(name: &'static str, body: F) -> E2eResult<T>
where
    F: Future<Output = E2eResult<T>>,
{
    body.await.in_flow(name)
}
