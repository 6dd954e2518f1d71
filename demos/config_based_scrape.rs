use clap::Parser;
use page_styles::{DriverConfig, ScrapeOptions, StyleScraper};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to driver configuration file
    #[arg(short, long)]
    config: String,

    /// Path to scrape options file
    #[arg(short, long)]
    options: Option<String>,

    /// Pages to scrape, concurrently, through one shared browser
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration from file
    let config_path = PathBuf::from(&args.config);
    let config = DriverConfig::from_file(config_path)?.apply_env();

    println!("Driver configuration:");
    match &config.webdriver_url {
        Some(url) => println!("  WebDriver URL: {}", url),
        None => println!("  Driver binary: {}", config.driver_binary),
    }
    println!("  Headless: {}", config.headless);
    println!("  Extra args: {}", config.extra_args.len());

    let options = match &args.options {
        Some(path) => ScrapeOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => ScrapeOptions::default(),
    };

    let scraper = StyleScraper::webdriver(config);
    scraper.warm_up().await?;

    let start_time = std::time::Instant::now();
    println!("Starting scrapes at {:?}", start_time);

    let results = futures::future::join_all(
        args.urls
            .iter()
            .map(|url| scraper.scrape_page(url, &options)),
    )
    .await;

    for (url, result) in args.urls.iter().zip(results) {
        match result {
            Ok(result) => println!(
                "{}: \"{}\" palette={:?} components={:?}",
                url,
                result.title,
                result.palette(),
                result.component_types
            ),
            Err(e) => println!("{}: failed: {}", url, e),
        }
    }

    scraper.close().await;

    let duration = start_time.elapsed();
    println!(
        "Scraping complete. Processed {} pages in {:.2} seconds.",
        args.urls.len(),
        duration.as_secs_f64()
    );

    Ok(())
}
