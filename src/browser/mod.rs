//! Browser driver seam.
//!
//! A [`Launcher`] starts the one shared browser. The resulting
//! [`BrowserHandle`] opens isolated [`BrowsingContext`]s, each of which owns
//! the [`PageHandle`]s a scrape drives.

pub mod pool;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
mod tests;

use crate::config::Viewport;
use crate::error::{LaunchError, ScrapeError};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

pub use pool::BrowserPool;

/// A script body evaluated inside the page, with a name for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageScript {
    pub name: &'static str,
    /// Function body; receives its arguments as `arguments[i]` and must `return`
    pub source: &'static str,
}

/// Settings applied when opening an isolated browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSettings {
    pub viewport: Viewport,
    pub user_agent: String,
    /// Page-load bound handed to the driver
    pub navigation_timeout: Duration,
}

/// Starts the shared browser process
pub trait Launcher: Send + Sync + 'static {
    type Handle: BrowserHandle;

    fn launch(&self) -> impl Future<Output = Result<Self::Handle, LaunchError>> + Send;
}

/// A live browser process shared by all scrapes
pub trait BrowserHandle: Send + Sync + 'static {
    type Context: BrowsingContext;

    /// Cheap liveness check, no I/O
    fn is_connected(&self) -> bool;

    /// Open a context whose cookies and storage are not shared with any other
    fn new_context(
        &self,
        settings: &ContextSettings,
    ) -> impl Future<Output = Result<Self::Context, ScrapeError>> + Send;

    fn close(&self) -> impl Future<Output = Result<(), ScrapeError>> + Send;
}

/// An isolated browsing context owned by a single scrape
pub trait BrowsingContext: Send + 'static {
    type Page: PageHandle;

    fn new_page(&mut self) -> impl Future<Output = Result<Self::Page, ScrapeError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), ScrapeError>> + Send;
}

/// One page inside a browsing context
pub trait PageHandle: Send + 'static {
    /// Navigate and wait for network idle, bounded by `timeout`
    fn goto(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ScrapeError>> + Send;

    fn title(&mut self) -> impl Future<Output = Result<String, ScrapeError>> + Send;

    /// Run a script body in the page and return its JSON result
    fn evaluate(
        &mut self,
        script: &PageScript,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, ScrapeError>> + Send;

    /// PNG of the whole document, not just the viewport
    fn screenshot_full_page(
        &mut self,
    ) -> impl Future<Output = Result<Vec<u8>, ScrapeError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), ScrapeError>> + Send;
}
