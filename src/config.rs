use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Identifying user agent sent by every scrape session
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 PageStyles/0.1";

/// Browser viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

/// Per-request scrape options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions {
    /// Viewport of the isolated browsing context
    #[serde(default)]
    pub viewport: Viewport,

    /// Settle time after network idle, for late client-side rendering
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Whether to capture a full-page PNG
    #[serde(default = "default_take_screenshot")]
    pub take_screenshot: bool,

    /// Navigation timeout in milliseconds
    #[serde(default = "default_timeout_ms", alias = "timeout")]
    pub timeout_ms: u64,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            wait_ms: default_wait_ms(),
            take_screenshot: default_take_screenshot(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ScrapeOptions {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse options from a JSON string, filling in defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How the shared browser driver is started or reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Attach to an already-running WebDriver server instead of spawning one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webdriver_url: Option<String>,

    /// WebDriver binary spawned when no URL is configured
    #[serde(default = "default_driver_binary")]
    pub driver_binary: String,

    /// Port for the spawned driver (a free local port when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// How long to wait for the driver to accept connections
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent sent by every session
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional browser command-line switches
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            driver_binary: default_driver_binary(),
            port: None,
            startup_timeout_ms: default_startup_timeout_ms(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            extra_args: Vec::new(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `WEBDRIVER_URL` and `CHROMEDRIVER_PATH`
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Layer environment overrides on top of this configuration
    pub fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var("WEBDRIVER_URL").ok(),
            std::env::var("CHROMEDRIVER_PATH").ok(),
        )
    }

    fn apply_overrides(
        mut self,
        webdriver_url: Option<String>,
        driver_path: Option<String>,
    ) -> Self {
        if let Some(url) = webdriver_url.filter(|u| !u.is_empty()) {
            self.webdriver_url = Some(url);
        }
        if let Some(path) = driver_path.filter(|p| !p.is_empty()) {
            self.driver_binary = path;
        }
        self
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

fn default_wait_ms() -> u64 {
    2000
}

fn default_take_screenshot() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_driver_binary() -> String {
    "chromedriver".to_string()
}

fn default_startup_timeout_ms() -> u64 {
    10_000
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_option_defaults() {
        let options = ScrapeOptions::default();
        assert_eq!(options.viewport.width, 1440);
        assert_eq!(options.viewport.height, 900);
        assert_eq!(options.wait_ms, 2000);
        assert!(options.take_screenshot);
        assert_eq!(options.timeout_ms, 30_000);

        // Missing fields fall back to the same defaults
        let parsed = ScrapeOptions::from_json("{}").unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_scrape_options_camel_case_keys() {
        let json = r#"{
            "viewport": {"width": 800, "height": 600},
            "waitMs": 0,
            "takeScreenshot": false,
            "timeout": 5000
        }"#;
        let parsed = ScrapeOptions::from_json(json).unwrap();
        assert_eq!(parsed.viewport.width, 800);
        assert_eq!(parsed.viewport.height, 600);
        assert_eq!(parsed.wait_ms, 0);
        assert!(!parsed.take_screenshot);
        assert_eq!(parsed.navigation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_driver_config_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"driver_binary": "/opt/chromedriver", "port": 9600, "headless": false}"#;
        std::fs::write(file.path(), json).unwrap();

        let config = DriverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.driver_binary, "/opt/chromedriver");
        assert_eq!(config.port, Some(9600));
        assert!(!config.headless);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.startup_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_driver_config_invalid_json() {
        let err = DriverConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_env_overrides() {
        let url = Some("http://localhost:4444".to_string());
        let defaults = DriverConfig::default();
        let config = defaults.apply_overrides(url, Some(String::new()));
        assert_eq!(
            config.webdriver_url.as_deref(),
            Some("http://localhost:4444")
        );
        // Empty values are ignored
        assert_eq!(config.driver_binary, "chromedriver");
    }
}
