use thiserror::Error;

/// Failure to bring up the shared browser driver.
///
/// Cloneable because one launch is awaited by every caller that arrived while
/// it was in flight, and each of them receives the same error.
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    /// The driver binary could not be spawned at all
    #[error("failed to spawn webdriver `{binary}`: {reason}")]
    Spawn { binary: String, reason: String },

    /// The driver process exited before accepting connections
    #[error("webdriver `{binary}` exited early with status {status}")]
    ExitedEarly { binary: String, status: String },

    /// The endpoint never became reachable
    #[error("webdriver at {endpoint} did not become ready within {waited_ms}ms")]
    NotReady { endpoint: String, waited_ms: u64 },

    /// The configured endpoint cannot be used
    #[error("invalid webdriver endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Errors surfaced by a scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser launch failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("failed to open browsing context: {0}")]
    Context(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("in-page evaluation `{script}` failed: {reason}")]
    Evaluation {
        script: &'static str,
        reason: String,
    },

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("webdriver command failed: {0}")]
    Driver(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
