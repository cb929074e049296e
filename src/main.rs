// src/main.rs
// =============================================================================
// Entry point of the spider.
//
// What happens here:
// 1. Parse command-line arguments and install the logger
// 2. Load and validate the config, create the output directory
// 3. Load the seed list
// 4. Start the worker pool, submit the seeds, wait until the crawl is idle
// 5. Exit with 0 on a finished crawl, 1 if startup failed
//
// Individual pages failing is not an error at this level; those are logged
// by the spider and the crawl carries on.
// =============================================================================

mod cli;
mod config;
mod error;
mod logging;
mod page;
mod persist;
mod seeds;
mod spider;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cli::Cli;
use config::{Config, CrawlSettings};
use spider::Spider;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        // Printed directly: the logger may be the thing that failed to start.
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let config = Config::load(&cli.config).context("load config file failed")?;
    let settings = CrawlSettings::from_config(&config.spider)?;

    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| {
            format!(
                "can not create output directory {}",
                settings.output_dir.display()
            )
        })?;

    let seeds = seeds::load_seeds(&config.spider.url_list_file)
        .await
        .context("spider init task failed")?;

    let workers = settings.workers;
    let spider = Spider::new(settings).context("spider init failed")?;

    info!(
        seeds = seeds.len(),
        workers,
        max_depth = spider.settings().max_depth,
        output = %spider.settings().output_dir.display(),
        "crawl starting"
    );

    // Workers are left running; the process exits right after the crawl is
    // idle, which takes them down with it.
    let _workers = spider.run(workers);
    for seed in seeds {
        spider.submit(seed);
    }

    spider.await_idle().await;

    let stats = spider.stats();
    info!(
        fetched = stats.fetched,
        failed = stats.failed,
        saved = stats.saved,
        discovered = stats.discovered,
        skipped = stats.skipped,
        pending = spider.pending(),
        "crawl finished"
    );

    Ok(())
}
