//! Playwright browser automation
//!
//! A single long-lived `node` process runs `bridge.js` and owns the browser.
//! Requests and responses are JSON lines tagged with an id, so several pages
//! can have calls in flight at once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::driver::{BoundingBox, LoadState, Page, PageFactory, Viewport, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;

const BRIDGE_JS: &str = include_str!("bridge.js");

/// Extra time the Rust side waits beyond a request's own timeout before
/// declaring the bridge unresponsive.
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub viewport: Viewport,
    /// Timeout for page operations that do not specify their own.
    pub default_timeout_ms: u64,
    pub launch_timeout_ms: u64,
    pub node_binary: PathBuf,
    /// Directory whose `node_modules` provides `playwright`.
    pub node_project_dir: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            slow_mo_ms: 0,
            viewport: Viewport::default(),
            default_timeout_ms: 30_000,
            launch_timeout_ms: 60_000,
            node_binary: PathBuf::from("node"),
            node_project_dir: None,
        }
    }
}

impl PlaywrightConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.node_binary);
        if let Some(dir) = &self.node_project_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Check that `playwright` resolves from the configured node project.
pub async fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
    let status = config
        .command()
        .args(["-e", "require.resolve('playwright')"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// How a failed request is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    /// Element actions: a timeout means the target never became actionable.
    Action,
    /// Explicit waits: a timeout is a timeout.
    Wait,
    Query,
    Browser,
}

fn failure(call: Call, code: Option<&str>, message: String, locator: Option<&Locator>) -> E2eError {
    let target = locator.map(|l| l.to_string());
    match (code, call) {
        (Some("timeout"), Call::Action) | (Some("not_found"), _) => E2eError::ElementNotFound {
            locator: target.unwrap_or(message),
        },
        (Some("timeout"), _) => E2eError::Timeout(message),
        _ => E2eError::Playwright(message),
    }
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

struct Bridge {
    stdin: AsyncMutex<ChildStdin>,
    child: AsyncMutex<Child>,
    pending: Pending,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl Bridge {
    async fn spawn(config: &PlaywrightConfig) -> E2eResult<Self> {
        let mut child = config
            .command()
            .args(["-e", BRIDGE_JS])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!("Failed to spawn {}: {}", config.node_binary.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let pending: Pending = Arc::default();
        let routes = pending.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<Response>(&line) {
                    Ok(response) => {
                        if let Some(tx) = routes.lock().remove(&response.id) {
                            let _ = tx.send(response);
                        }
                    }
                    Err(_) => debug!("[bridge] {}", line),
                }
            }
            // Dropping the senders wakes every caller still waiting.
            routes.lock().clear();
        });

        Ok(Self {
            stdin: AsyncMutex::new(stdin),
            child: AsyncMutex::new(child),
            pending,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    async fn send(&self, op: &str, page: Option<&str>, args: Value, timeout: Duration) -> E2eResult<Response> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = serde_json::to_string(&json!({ "id": id, "op": op, "page": page, "args": args }))?;
        line.push('\n');
        debug!("bridge <- #{} {} {}", id, op, page.unwrap_or("-"));

        let written = {
            let mut stdin = self.stdin.lock().await;
            match stdin.write_all(line.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            self.pending.lock().remove(&id);
            return Err(E2eError::Bridge(format!("write failed: {}", e)));
        }

        match tokio::time::timeout(timeout + RESPONSE_GRACE, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(E2eError::Bridge("bridge process exited".to_string())),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(E2eError::Timeout(format!("bridge response to {} #{}", op, id)))
            }
        }
    }

    async fn call(
        &self,
        call: Call,
        op: &str,
        page: Option<&str>,
        args: Value,
        timeout: Duration,
        locator: Option<&Locator>,
    ) -> E2eResult<Value> {
        let response = self.send(op, page, args, timeout).await?;
        if response.ok {
            return Ok(response.value);
        }
        let message = response.message.unwrap_or_else(|| format!("{} failed", op));
        Err(failure(call, response.code.as_deref(), message, locator))
    }

    async fn shutdown(&self) -> E2eResult<()> {
        let bye = self
            .send("close", None, Value::Null, Duration::from_secs(5))
            .await;
        if let Err(e) = bye {
            warn!("Bridge did not acknowledge close: {}", e);
        }

        let mut child = self.child.lock().await;
        if let Ok(Some(_)) = child.try_wait() {
            self.reader.abort();
            return Ok(());
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                if tokio::time::timeout(Duration::from_millis(500), child.wait()).await.is_ok() {
                    self.reader.abort();
                    return Ok(());
                }
            }
        }

        let _ = child.kill().await;
        self.reader.abort();
        Ok(())
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.reader.abort();
        if let Ok(mut child) = self.child.try_lock() {
            let _ = child.start_kill();
        }
    }
}

/// A running browser behind the node bridge.
pub struct PlaywrightBrowser {
    bridge: Arc<Bridge>,
    config: PlaywrightConfig,
    version: String,
}

impl PlaywrightBrowser {
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed(&config).await?;

        info!(
            "Launching {} (headless: {})",
            config.browser.as_str(),
            config.headless
        );
        let bridge = Bridge::spawn(&config).await?;
        let launch_timeout = Duration::from_millis(config.launch_timeout_ms);
        let version = bridge
            .call(
                Call::Browser,
                "launch",
                None,
                json!({
                    "browser": config.browser.as_str(),
                    "headless": config.headless,
                    "slow_mo_ms": config.slow_mo_ms,
                    "timeout": config.launch_timeout_ms,
                }),
                launch_timeout,
                None,
            )
            .await?;
        let version = version.as_str().unwrap_or_default().to_string();
        info!("Browser ready: {} {}", config.browser.as_str(), version);

        Ok(Self {
            bridge: Arc::new(bridge),
            config,
            version,
        })
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub async fn close(&self) -> E2eResult<()> {
        info!("Closing browser");
        self.bridge.shutdown().await
    }
}

#[async_trait]
impl PageFactory for PlaywrightBrowser {
    async fn new_page(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>> {
        let id = self
            .bridge
            .call(
                Call::Browser,
                "new_page",
                None,
                json!({ "viewport": viewport }),
                self.config.default_timeout(),
                None,
            )
            .await?;
        let id = id
            .as_str()
            .ok_or_else(|| E2eError::Bridge(format!("new_page returned {}", id)))?
            .to_string();
        debug!("opened page {}", id);
        Ok(Box::new(PlaywrightPage {
            bridge: self.bridge.clone(),
            id,
            default_timeout: self.config.default_timeout(),
        }))
    }
}

/// One browser context with a single tab.
pub struct PlaywrightPage {
    bridge: Arc<Bridge>,
    id: String,
    default_timeout: Duration,
}

impl PlaywrightPage {
    async fn call(&self, call: Call, op: &str, args: Value, timeout: Duration) -> E2eResult<Value> {
        self.bridge
            .call(call, op, Some(&self.id), args, timeout, None)
            .await
    }

    async fn on(&self, call: Call, op: &str, locator: &Locator, mut args: Value, timeout: Duration) -> E2eResult<Value> {
        args["locator"] = serde_json::to_value(locator)?;
        args["timeout"] = json!(timeout.as_millis() as u64);
        self.bridge
            .call(call, op, Some(&self.id), args, timeout, Some(locator))
            .await
    }

    async fn query(&self, op: &str, locator: &Locator) -> E2eResult<Value> {
        self.on(Call::Query, op, locator, json!({}), self.default_timeout).await
    }

    fn string(value: Value, op: &str) -> E2eResult<String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(E2eError::Bridge(format!("{} returned {}", op, other))),
        }
    }

    fn boolean(value: Value, op: &str) -> E2eResult<bool> {
        value
            .as_bool()
            .ok_or_else(|| E2eError::Bridge(format!("{} returned {}", op, value)))
    }

    fn timeout_args(&self) -> Value {
        json!({ "timeout": self.default_timeout.as_millis() as u64 })
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        let args = json!({ "url": url, "timeout": self.default_timeout.as_millis() as u64 });
        self.call(Call::Wait, "goto", args, self.default_timeout).await?;
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        self.call(Call::Wait, "reload", self.timeout_args(), self.default_timeout).await?;
        Ok(())
    }

    async fn go_back(&self) -> E2eResult<()> {
        self.call(Call::Wait, "go_back", self.timeout_args(), self.default_timeout).await?;
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.call(Call::Query, "url", json!({}), self.default_timeout).await?;
        Self::string(value, "url")
    }

    async fn title(&self) -> E2eResult<String> {
        let value = self.call(Call::Query, "title", json!({}), self.default_timeout).await?;
        Self::string(value, "title")
    }

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()> {
        self.call(Call::Query, "set_viewport", json!({ "viewport": viewport }), self.default_timeout)
            .await?;
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()> {
        let args = json!({ "state": state.as_str(), "timeout": timeout.as_millis() as u64 });
        self.call(Call::Wait, "wait_for_load_state", args, timeout).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.on(Call::Action, "click", locator, json!({}), timeout).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str, timeout: Duration) -> E2eResult<()> {
        self.on(Call::Action, "fill", locator, json!({ "value": value }), timeout).await?;
        Ok(())
    }

    async fn hover(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.on(Call::Action, "hover", locator, json!({}), timeout).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.on(Call::Action, "scroll_into_view", locator, json!({}), timeout).await?;
        Ok(())
    }

    async fn click_for_popup(&self, locator: &Locator, timeout: Duration) -> E2eResult<String> {
        let value = self.on(Call::Action, "click_for_popup", locator, json!({}), timeout).await?;
        Self::string(value, "click_for_popup")
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.on(Call::Wait, "wait_for", locator, json!({ "state": state.as_str() }), timeout)
            .await?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.query("count", locator).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Bridge(format!("count returned {}", value)))
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        Self::boolean(self.query("is_visible", locator).await?, "is_visible")
    }

    async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool> {
        Self::boolean(self.query("is_enabled", locator).await?, "is_enabled")
    }

    async fn inner_text(&self, locator: &Locator) -> E2eResult<String> {
        Self::string(self.query("inner_text", locator).await?, "inner_text")
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        Self::string(self.query("input_value", locator).await?, "input_value")
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .on(Call::Query, "get_attribute", locator, json!({ "name": name }), self.default_timeout)
            .await?;
        match value {
            Value::Null => Ok(None),
            other => Self::string(other, "get_attribute").map(Some),
        }
    }

    async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
        let value = self.query("bounding_box", locator).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn close(&self) -> E2eResult<()> {
        debug!("closing page {}", self.id);
        self.call(Call::Browser, "close_page", json!({}), self.default_timeout).await?;
        Ok(())
    }
}
