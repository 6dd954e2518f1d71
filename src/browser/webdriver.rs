use super::{BrowserHandle, BrowsingContext, ContextSettings, Launcher, PageHandle, PageScript};
use crate::config::{DriverConfig, Viewport};
use crate::error::{LaunchError, ScrapeError};
use fantoccini::error::CmdError;
use fantoccini::wd::{TimeoutConfiguration, WindowHandle};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use url::Url;

/// Interval between readiness probes of a starting driver
const READY_POLL: Duration = Duration::from_millis(200);

/// Interval between resource-count probes while waiting for network idle
const IDLE_POLL: Duration = Duration::from_millis(100);

/// How long the resource count must stay flat to count as network idle
const IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Tallest capture attempted for full-page screenshots. Chrome cannot size a
/// window much beyond this, so longer documents are captured from the top.
const MAX_CAPTURE_HEIGHT: u32 = 16_384;

/// Resources fetched so far. The timing buffer stops growing at 250 entries,
/// so later fetches are counted by an observer installed on the first call.
const RESOURCE_COUNT_JS: &str = r#"
if (window.__pageStylesResources === undefined) {
    window.__pageStylesResources = performance.getEntriesByType('resource').length;
    new PerformanceObserver(list => {
        window.__pageStylesResources += list.getEntries().length;
    }).observe({ type: 'resource' });
}
return window.__pageStylesResources;
"#;

const DOCUMENT_SIZE_JS: &str = r#"
const doc = document.documentElement;
const body = document.body || doc;
return {
    width: Math.max(doc.scrollWidth, body.scrollWidth, doc.clientWidth),
    height: Math.max(doc.scrollHeight, body.scrollHeight, doc.clientHeight)
};
"#;

/// Starts (or attaches to) a WebDriver server driving headless Chrome
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    config: DriverConfig,
}

impl WebDriverLauncher {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Use a WebDriver server someone else runs
    async fn attach(&self, endpoint: &str) -> Result<WebDriverBrowser, LaunchError> {
        let (host, port) = endpoint_address(endpoint)?;
        ::log::info!("Attaching to WebDriver at {}", endpoint);

        let timeout = self.config.startup_timeout();
        let started = Instant::now();
        while started.elapsed() < timeout {
            if reachable(&host, port).await {
                return Ok(self.browser(endpoint.to_string(), None));
            }
            tokio::time::sleep(READY_POLL).await;
        }

        Err(LaunchError::NotReady {
            endpoint: endpoint.to_string(),
            waited_ms: self.config.startup_timeout_ms,
        })
    }

    /// Spawn the driver binary on a local port and wait until it accepts connections
    async fn spawn(&self) -> Result<WebDriverBrowser, LaunchError> {
        let binary = &self.config.driver_binary;
        let port = match self.config.port {
            Some(port) => port,
            None => free_local_port().map_err(|e| LaunchError::Spawn {
                binary: binary.clone(),
                reason: format!("no free local port: {e}"),
            })?,
        };
        let endpoint = format!("http://127.0.0.1:{port}");

        ::log::info!("Starting {} on port {}", binary, port);
        let mut child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                binary: binary.clone(),
                reason: e.to_string(),
            })?;

        let timeout = self.config.startup_timeout();
        let started = Instant::now();
        while started.elapsed() < timeout {
            if reachable("127.0.0.1", port).await {
                ::log::debug!("{} accepting connections at {}", binary, endpoint);
                return Ok(self.browser(endpoint, Some(child)));
            }
            if let Ok(Some(status)) = child.try_wait() {
                return Err(LaunchError::ExitedEarly {
                    binary: binary.clone(),
                    status: status.to_string(),
                });
            }
            tokio::time::sleep(READY_POLL).await;
        }

        if let Err(e) = child.kill().await {
            ::log::warn!("Failed to kill unresponsive {}: {}", binary, e);
        }
        Err(LaunchError::NotReady {
            endpoint,
            waited_ms: self.config.startup_timeout_ms,
        })
    }

    fn browser(&self, endpoint: String, child: Option<Child>) -> WebDriverBrowser {
        WebDriverBrowser {
            endpoint,
            attached: child.is_none(),
            child: Mutex::new(child),
            headless: self.config.headless,
            extra_args: self.config.extra_args.clone(),
        }
    }
}

impl Launcher for WebDriverLauncher {
    type Handle = WebDriverBrowser;

    async fn launch(&self) -> Result<WebDriverBrowser, LaunchError> {
        match &self.config.webdriver_url {
            Some(endpoint) => self.attach(endpoint).await,
            None => self.spawn().await,
        }
    }
}

/// A running WebDriver server. Each context is a separate WebDriver session.
#[derive(Debug)]
pub struct WebDriverBrowser {
    endpoint: String,
    attached: bool,
    child: Mutex<Option<Child>>,
    headless: bool,
    extra_args: Vec<String>,
}

impl WebDriverBrowser {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BrowserHandle for WebDriverBrowser {
    type Context = WebDriverContext;

    fn is_connected(&self) -> bool {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        match child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => self.attached,
        }
    }

    async fn new_context(
        &self,
        settings: &ContextSettings,
    ) -> Result<WebDriverContext, ScrapeError> {
        let capabilities = chrome_capabilities(self.headless, &self.extra_args, settings);

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);
        let client = builder
            .connect(&self.endpoint)
            .await
            .map_err(|e| ScrapeError::Context(e.to_string()))?;

        let timeouts = TimeoutConfiguration::new(
            Some(settings.navigation_timeout),
            Some(settings.navigation_timeout),
            None,
        );
        if let Err(e) = client.update_timeouts(timeouts).await {
            if let Err(close_err) = client.close().await {
                ::log::warn!("Failed to end half-open session: {}", close_err);
            }
            return Err(ScrapeError::Context(e.to_string()));
        }

        Ok(WebDriverContext {
            client,
            viewport: settings.viewport,
        })
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match child {
            Some(mut child) => child
                .kill()
                .await
                .map_err(|e| ScrapeError::Driver(format!("failed to stop webdriver: {e}"))),
            None => Ok(()),
        }
    }
}

/// One WebDriver session with its own browser profile
#[derive(Debug)]
pub struct WebDriverContext {
    client: Client,
    viewport: Viewport,
}

impl BrowsingContext for WebDriverContext {
    type Page = WebDriverPage;

    async fn new_page(&mut self) -> Result<WebDriverPage, ScrapeError> {
        let return_to = self.client.window().await.map_err(driver_error)?;
        let window = self.client.new_window(true).await.map_err(driver_error)?;
        self.client
            .switch_to_window(window.handle)
            .await
            .map_err(driver_error)?;

        Ok(WebDriverPage {
            client: self.client.clone(),
            return_to,
            viewport: self.viewport,
        })
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.client.close().await.map_err(driver_error)
    }
}

/// A tab inside a [`WebDriverContext`]
#[derive(Debug)]
pub struct WebDriverPage {
    client: Client,
    return_to: WindowHandle,
    viewport: Viewport,
}

impl WebDriverPage {
    async fn resource_count(&self) -> Result<u64, ScrapeError> {
        let count = self
            .client
            .execute(RESOURCE_COUNT_JS, Vec::new())
            .await
            .map_err(driver_error)?;
        Ok(count.as_u64().unwrap_or(0))
    }

    /// Wait until no new resources have been fetched for [`IDLE_WINDOW`]
    async fn wait_for_network_idle(&self) -> Result<(), ScrapeError> {
        let mut last = self.resource_count().await?;
        let mut quiet_since = Instant::now();
        loop {
            tokio::time::sleep(IDLE_POLL).await;
            let count = self.resource_count().await?;
            if count != last {
                last = count;
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= IDLE_WINDOW {
                return Ok(());
            }
        }
    }
}

impl PageHandle for WebDriverPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let navigation = async {
            self.client
                .goto(url)
                .await
                .map_err(|e| navigation_error(url, timeout, e))?;
            self.wait_for_network_idle().await
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn title(&mut self) -> Result<String, ScrapeError> {
        self.client.title().await.map_err(driver_error)
    }

    async fn evaluate(
        &mut self,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value, ScrapeError> {
        self.client
            .execute(script.source, args)
            .await
            .map_err(|e| ScrapeError::Evaluation {
                script: script.name,
                reason: e.to_string(),
            })
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, ScrapeError> {
        let size = self
            .client
            .execute(DOCUMENT_SIZE_JS, Vec::new())
            .await
            .map_err(|e| ScrapeError::Screenshot(e.to_string()))?;
        let (width, height) = capture_size(&size, self.viewport);

        self.client
            .set_window_size(width, height)
            .await
            .map_err(|e| ScrapeError::Screenshot(e.to_string()))?;
        let png = self.client.screenshot().await;

        if let Err(e) = self
            .client
            .set_window_size(self.viewport.width, self.viewport.height)
            .await
        {
            ::log::warn!("Failed to restore viewport after screenshot: {}", e);
        }

        png.map_err(|e| ScrapeError::Screenshot(e.to_string()))
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.client.close_window().await.map_err(driver_error)?;
        self.client
            .switch_to_window(self.return_to)
            .await
            .map_err(driver_error)
    }
}

/// Session capabilities for an isolated headless Chrome profile
pub fn chrome_capabilities(
    headless: bool,
    extra_args: &[String],
    settings: &ContextSettings,
) -> Map<String, Value> {
    let mut args = Vec::new();
    if headless {
        args.push("--headless=new".to_string());
    }
    args.push(format!(
        "--window-size={},{}",
        settings.viewport.width, settings.viewport.height
    ));
    args.push(format!("--user-agent={}", settings.user_agent));
    args.push("--disable-gpu".to_string());
    args.push("--disable-dev-shm-usage".to_string());
    args.push("--no-first-run".to_string());
    args.push("--no-default-browser-check".to_string());
    args.push("--hide-scrollbars".to_string());
    if !cfg!(target_os = "macos") {
        args.push("--no-sandbox".to_string());
    }
    args.extend(extra_args.iter().cloned());

    let mut capabilities = Map::new();
    capabilities.insert("browserName".to_string(), json!("chrome"));
    capabilities.insert("acceptInsecureCerts".to_string(), json!(true));
    capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    capabilities
}

/// Window size needed to capture the document, at most [`MAX_CAPTURE_HEIGHT`] tall
fn capture_size(size: &Value, viewport: Viewport) -> (u32, u32) {
    let dimension = |key: &str| size.get(key).and_then(Value::as_u64).unwrap_or(0);
    let width = (dimension("width") as u32).max(viewport.width);

    let mut height = dimension("height");
    if height > u64::from(MAX_CAPTURE_HEIGHT) {
        ::log::debug!("Clamping {}px tall capture", height);
        height = u64::from(MAX_CAPTURE_HEIGHT);
    }
    (width, (height as u32).max(viewport.height))
}

fn endpoint_address(endpoint: &str) -> Result<(String, u16), LaunchError> {
    let invalid = |reason: &str| LaunchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let port = url.port_or_known_default().unwrap_or(4444);
    Ok((host.to_string(), port))
}

async fn reachable(host: &str, port: u16) -> bool {
    let connect = tokio::time::timeout(Duration::from_secs(1), TcpStream::connect((host, port)));
    matches!(connect.await, Ok(Ok(_)))
}

fn free_local_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn navigation_error(url: &str, timeout: Duration, error: CmdError) -> ScrapeError {
    let reason = error.to_string();
    if reason.to_lowercase().contains("timeout") {
        ScrapeError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        ScrapeError::Navigation {
            url: url.to_string(),
            reason,
        }
    }
}

fn driver_error(error: CmdError) -> ScrapeError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("WebDriver session lost: {}", error);
    }
    ScrapeError::Driver(error.to_string())
}
