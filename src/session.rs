use crate::browser::webdriver::WebDriverLauncher;
use crate::browser::{
    BrowserHandle, BrowserPool, BrowsingContext, ContextSettings, Launcher, PageHandle,
};
use crate::config::{DEFAULT_USER_AGENT, DriverConfig, ScrapeOptions};
use crate::error::ScrapeError;
use crate::meta::extract_meta;
use crate::results::ScrapeResult;
use crate::sampler::sample_page;
use std::time::Instant;

/// Scrapes pages through one shared browser, each request in its own context
pub struct StyleScraper<L: Launcher> {
    pool: BrowserPool<L>,
    user_agent: String,
}

impl StyleScraper<WebDriverLauncher> {
    /// Scraper backed by a WebDriver-controlled Chrome
    pub fn webdriver(config: DriverConfig) -> Self {
        let user_agent = config.user_agent.clone();
        let scraper = Self::new(WebDriverLauncher::new(config));
        scraper.with_user_agent(user_agent)
    }
}

impl<L: Launcher> StyleScraper<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            pool: BrowserPool::new(launcher),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn pool(&self) -> &BrowserPool<L> {
        &self.pool
    }

    /// Launch the shared browser ahead of the first scrape
    pub async fn warm_up(&self) -> Result<(), ScrapeError> {
        Ok(self.pool.warm_up().await?)
    }

    /// Release the shared browser. Safe to call more than once.
    pub async fn close(&self) {
        self.pool.shutdown().await;
    }

    /// Render `url` and summarize its visual design.
    ///
    /// The page and its context are closed on every exit path, including the
    /// returned future being dropped. Errors from closing them are logged and
    /// never replace the scrape's own outcome.
    pub async fn scrape_page(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResult, ScrapeError> {
        ::log::info!("Scraping styles from {}", url);
        let started = Instant::now();

        let browser = self.pool.ensure().await?;
        let settings = ContextSettings {
            viewport: options.viewport,
            user_agent: self.user_agent.clone(),
            navigation_timeout: options.navigation_timeout(),
        };
        let context = browser.new_context(&settings).await?;

        let mut session = OpenSession::new(url, context);
        let outcome = session.run(options).await;
        session.close().await;

        match &outcome {
            Ok(_) => ::log::debug!(
                "Scraped {} in {:.2} seconds",
                url,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => ::log::error!("Failed to scrape {}: {}", url, e),
        }
        outcome
    }
}

/// The context and page of one scrape.
///
/// Closed explicitly once the scrape finishes. If it is abandoned first,
/// whatever is still open is closed on a background task.
struct OpenSession<C: BrowsingContext> {
    url: String,
    context: Option<C>,
    page: Option<C::Page>,
}

impl<C: BrowsingContext> OpenSession<C> {
    fn new(url: &str, context: C) -> Self {
        Self {
            url: url.to_string(),
            context: Some(context),
            page: None,
        }
    }

    async fn run(&mut self, options: &ScrapeOptions) -> Result<ScrapeResult, ScrapeError> {
        let Some(context) = self.context.as_mut() else {
            return Err(ScrapeError::Context("browsing context already closed".to_string()));
        };
        let page = self.page.insert(context.new_page().await?);
        run_session(page, &self.url, options).await
    }

    /// Close the page, then the context
    async fn close(mut self) {
        let url = std::mem::take(&mut self.url);
        release(self.page.take(), self.context.take(), url).await;
    }
}

impl<C: BrowsingContext> Drop for OpenSession<C> {
    fn drop(&mut self) {
        if self.page.is_none() && self.context.is_none() {
            return;
        }
        let page = self.page.take();
        let context = self.context.take();
        let url = std::mem::take(&mut self.url);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                ::log::warn!(
                    "Scrape of {} abandoned, closing its browsing context in the background",
                    url
                );
                runtime.spawn(release(page, context, url));
            }
            Err(_) => ::log::warn!(
                "Scrape of {} abandoned outside a runtime, browsing context left open",
                url
            ),
        }
    }
}

/// A failed page close still closes the context
async fn release<C: BrowsingContext>(page: Option<C::Page>, context: Option<C>, url: String) {
    if let Some(page) = page {
        warn_on_close_error("page", &url, page.close().await);
    }
    if let Some(context) = context {
        warn_on_close_error("browsing context", &url, context.close().await);
    }
}

fn warn_on_close_error(what: &str, url: &str, result: Result<(), ScrapeError>) {
    if let Err(e) = result {
        ::log::warn!("Failed to close {} for {}: {}", what, url, e);
    }
}

/// The strictly sequential steps of one scrape against an open page
async fn run_session<P: PageHandle>(
    page: &mut P,
    url: &str,
    options: &ScrapeOptions,
) -> Result<ScrapeResult, ScrapeError> {
    page.goto(url, options.navigation_timeout()).await?;
    tokio::time::sleep(options.settle_delay()).await;

    let title = page.title().await?;
    let styles = sample_page(page).await?;
    let screenshot = if options.take_screenshot {
        Some(page.screenshot_full_page().await?)
    } else {
        None
    };
    let meta = extract_meta(page).await?;

    Ok(ScrapeResult {
        url: url.to_string(),
        title,
        screenshot,
        colors: styles.colors,
        fonts: styles.fonts,
        font_sizes: styles.font_sizes,
        spacing: styles.spacing,
        layout_patterns: styles.layout_patterns,
        component_types: styles.component_types,
        meta,
    })
}
