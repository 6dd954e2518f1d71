use clap::Parser;
use page_styles::utils::screenshot_filename;
use page_styles::{DriverConfig, ScrapeResult, StyleScraper};
use std::path::PathBuf;
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match DriverConfig::from_file(path) {
            Ok(config) => config.apply_env(),
            Err(e) => {
                ::log::error!("Failed to load driver config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => DriverConfig::from_env(),
    };
    let config = match &args.webdriver_url {
        Some(url) => DriverConfig {
            webdriver_url: Some(url.clone()),
            ..config
        },
        None => config,
    };

    let scraper = StyleScraper::webdriver(config);
    let start_time = std::time::Instant::now();
    let outcome = scraper.scrape_page(&args.url, &args.scrape_options()).await;

    // The browser is released whether or not the scrape succeeded
    scraper.close().await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    ::log::info!(
        "Scrape complete - {} colors, {} fonts in {:.2} seconds",
        result.colors.len(),
        result.fonts.len(),
        start_time.elapsed().as_secs_f64()
    );

    match report(&result, args.screenshot_out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print the result as JSON and write the screenshot, if any
fn report(
    result: &ScrapeResult,
    screenshot_out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(result)?);

    if let Some(png) = &result.screenshot {
        let path = match screenshot_out {
            Some(path) => path,
            None => PathBuf::from(screenshot_filename(&result.url)),
        };
        std::fs::write(&path, png)?;
        ::log::info!("Wrote screenshot to {}", path.display());
    }
    Ok(())
}
