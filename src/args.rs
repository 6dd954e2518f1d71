use clap::Parser;
use page_styles::{ScrapeOptions, Viewport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-styles")]
#[command(author)]
#[command(about = "Render a web page and extract a summary of its visual design")]
#[command(version)]
pub struct Args {
    /// Page URL to scrape
    pub url: String,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1440)]
    pub width: u32,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Settle time after network idle, in milliseconds
    #[arg(short, long, default_value_t = 2000)]
    pub wait_ms: u64,

    /// Navigation timeout in milliseconds
    #[arg(short, long, default_value_t = 30000)]
    pub timeout_ms: u64,

    /// Skip the full-page screenshot
    #[arg(long)]
    pub no_screenshot: bool,

    /// Where to write the screenshot (defaults to a name derived from the URL)
    #[arg(short = 'o', long)]
    pub screenshot_out: Option<PathBuf>,

    /// Driver configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Attach to a running WebDriver server instead of spawning chromedriver
    #[arg(long)]
    pub webdriver_url: Option<String>,
}

impl Args {
    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            wait_ms: self.wait_ms,
            take_screenshot: !self.no_screenshot,
            timeout_ms: self.timeout_ms,
        }
    }
}
