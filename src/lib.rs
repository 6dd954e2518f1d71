// Re-export modules
pub mod browser;
pub mod colors;
pub mod config;
pub mod error;
pub mod meta;
pub mod results;
pub mod sampler;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use colors::{normalize_colors, rgb_to_hex};
pub use config::{DriverConfig, ScrapeOptions, Viewport};
pub use error::{LaunchError, ScrapeError};
pub use results::ScrapeResult;
pub use session::StyleScraper;

use browser::webdriver::WebDriverLauncher;
use std::sync::OnceLock;

static DEFAULT_SCRAPER: OnceLock<StyleScraper<WebDriverLauncher>> = OnceLock::new();

/// The process-wide scraper, configured from the environment on first use
pub fn default_scraper() -> &'static StyleScraper<WebDriverLauncher> {
    DEFAULT_SCRAPER.get_or_init(|| {
        let config = DriverConfig::from_env();
        StyleScraper::webdriver(config)
    })
}

/// Scrape `url` with the process-wide browser
pub async fn scrape_page(url: &str, options: &ScrapeOptions) -> Result<ScrapeResult, ScrapeError> {
    default_scraper().scrape_page(url, options).await
}

/// Launch the process-wide browser ahead of the first scrape
pub async fn warm_up() -> Result<(), ScrapeError> {
    default_scraper().warm_up().await
}

/// Close the process-wide browser. A later scrape launches a fresh one.
pub async fn close_browser() {
    if let Some(scraper) = DEFAULT_SCRAPER.get() {
        scraper.close().await;
    }
}
