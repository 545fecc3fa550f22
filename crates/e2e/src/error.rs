//! Error types for E2E flows and scenario runs

use thiserror::Error;

/// Failure classification used when reporting a broken test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An expected page marker never became visible.
    Precondition,
    /// A locator resolved to nothing when an action needed an element.
    NotFound,
    /// A post-action expectation did not hold.
    AssertionFailed,
    /// A bounded wait elapsed.
    Timeout,
    /// The browser or the bridge process misbehaved.
    Driver,
    /// Bad input: configuration, specs, arguments.
    Config,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Precondition => "precondition",
            FailureKind::NotFound => "not_found",
            FailureKind::AssertionFailed => "assertion_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::Driver => "driver",
            FailureKind::Config => "config",
        }
    }
}

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge protocol error: {0}")]
    Bridge(String),

    #[error("Expected marker {marker} was not visible within {timeout_ms} ms")]
    Precondition { marker: String, timeout_ms: u64 },

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("{}: {source}", flow_prefix(.operation))]
    Flow {
        operation: &'static str,
        #[source]
        source: Box<E2eError>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown locator: {0}")]
    UnknownLocator(String),

    #[error("Scenario spec parse error: {0}")]
    SpecParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

fn flow_prefix(operation: &str) -> String {
    match operation {
        "navigate_to_reviews" => "Failed to navigate to reviews".to_string(),
        other => format!("Flow operation {} failed", other),
    }
}

impl E2eError {
    /// Classify this error, looking through flow wrappers.
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::Precondition { .. } => FailureKind::Precondition,
            E2eError::ElementNotFound { .. } => FailureKind::NotFound,
            E2eError::AssertionFailed(_) => FailureKind::AssertionFailed,
            E2eError::Timeout(_) => FailureKind::Timeout,
            E2eError::Flow { source, .. } => source.kind(),
            E2eError::StepFailed { .. } => FailureKind::AssertionFailed,
            E2eError::InvalidArgument(_)
            | E2eError::UnknownLocator(_)
            | E2eError::SpecParse(_)
            | E2eError::Config(_)
            | E2eError::Yaml(_)
            | E2eError::Toml(_)
            | E2eError::Regex(_) => FailureKind::Config,
            E2eError::PlaywrightNotFound
            | E2eError::Playwright(_)
            | E2eError::Bridge(_)
            | E2eError::Io(_)
            | E2eError::Json(_)
            | E2eError::Http(_) => FailureKind::Driver,
        }
    }

    /// Name of the innermost flow operation that failed, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            E2eError::Flow { operation, source } => source.operation().or(Some(*operation)),
            _ => None,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Attach the name of a flow operation to a failure.
pub trait FlowContext<T> {
    fn in_flow(self, operation: &'static str) -> E2eResult<T>;
}

impl<T> FlowContext<T> for E2eResult<T> {
    fn in_flow(self, operation: &'static str) -> E2eResult<T> {
        self.map_err(|source| E2eError::Flow {
            operation,
            source: Box::new(source),
        })
    }
}
