//! Seeker CLI
//!
//! Crawls linked profiles for each target and prints one report per target.

use std::path::PathBuf;

use clap::Parser;
use seeker::{
    error::{AppError, Result},
    models::{Config, Target},
    pipeline::Seeker,
    services::CookieJar,
};

/// Seeker - linked profile discovery
#[derive(Parser, Debug)]
#[command(
    name = "seeker",
    version,
    about = "Discovers linked profiles by recursively following identifiers"
)]
struct Cli {
    /// Usernames or e-mail addresses to start from
    #[arg(required = true)]
    targets: Vec<String>,

    /// Proxy URL for every request (overrides the config file)
    #[arg(long)]
    proxy: Option<String>,

    /// Disable the progress line
    #[arg(long)]
    no_progressbar: bool,

    /// Netscape cookies file
    #[arg(long, default_value = "cookies.txt")]
    cookies: PathBuf,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    };
    if let Some(proxy) = cli.proxy {
        config.crawler.proxy = Some(proxy);
    }
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let targets = cli
        .targets
        .iter()
        .map(|input| Target::parse(input))
        .collect::<Result<Vec<_>>>()?;
    if targets.is_empty() {
        return Err(AppError::validation("no targets given"));
    }

    let cookies = CookieJar::load_or_empty(&cli.cookies);
    log::info!("Loaded {} cookie(s) from {}", cookies.len(), cli.cookies.display());

    let seeker = Seeker::from_config(&config, cookies, !cli.no_progressbar)?;
    let reports = seeker.process(&targets).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
    }

    log::info!(
        "Done: {} target(s), {} profile(s), {} blocked, {} failed",
        reports.len(),
        reports.iter().map(|r| r.records.len()).sum::<usize>(),
        reports.iter().map(|r| r.blocked_count()).sum::<usize>(),
        reports.iter().filter(|r| r.error.is_some()).count()
    );

    Ok(())
}
