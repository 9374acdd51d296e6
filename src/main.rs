use anyhow::Result;

use linefeed_scraper::config::ScraperConfig;
use linefeed_scraper::logging::init_logging;
use linefeed_scraper::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let cfg = ScraperConfig::from_env();
    let summary = pipeline::run(&cfg)?;

    println!("Scrape complete");
    println!("Output: {}", cfg.output_dir.display());
    println!(
        "Countries written: {}/{}",
        summary.countries_written, summary.countries_total
    );
    println!(
        "Leagues: {} fetched, {} failed, {} skipped",
        summary.leagues_fetched, summary.leagues_failed, summary.leagues_skipped
    );
    println!("Matches: {}", summary.matches_total);
    if !summary.pruned.is_empty() {
        println!("Stale files removed: {}", summary.pruned.len());
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
