use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use shared::{
    save_feed, BrowserProfile, ChromiumRenderer, CollectionStats, Config, ExtractionSession,
    FeedDocument, Renderer, Timing,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "collect-posts")]
#[command(about = "Collect recent posts from monitored accounts and write them as an RSS feed")]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of days to look back (overrides days_back)
    #[arg(short, long)]
    days: Option<u32>,

    /// Directory for the feed file (overrides dataDir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the feed to stdout instead of writing it
    #[arg(long)]
    stdout: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(days) = args.days {
        config.days_back = days;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    // Keep stdout clean for the feed itself when printing it.
    let to_stderr = args.stdout;
    let say = |msg: String| {
        if to_stderr {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    };

    say(format!("Accounts: {}", config.accounts.join(", ")));
    say(format!("Window: {} day(s)", config.days_back));

    say("\n🌐 Launching browser...".to_string());
    let renderer = ChromiumRenderer::launch(&config.browser)
        .await
        .context("Failed to start the browser")?;

    let session = ExtractionSession::new(
        &renderer,
        BrowserProfile::from(&config.browser),
        Timing::from(&config.browser),
    );

    say("\n📥 Collecting posts...".to_string());
    let batches = session
        .collect_all(&config.accounts, config.days_back, Utc::now())
        .await;

    if let Err(e) = renderer.shutdown().await {
        tracing::warn!(error = %e, "browser did not shut down cleanly");
    }

    say("\n📊 Generating RSS feed...".to_string());
    let built_at = Local::now();
    let feed = FeedDocument::build(&batches, built_at.fixed_offset());

    if args.stdout {
        print!("{}", feed.to_xml().context("Failed to serialize feed")?);
    } else {
        let data_dir = config.data_dir()?;
        let filepath = save_feed(&feed, &data_dir, built_at.date_naive())
            .context("Failed to save feed")?;
        say(format!("✓ Feed saved to: {}", filepath.display()));
    }

    let stats = CollectionStats::from_batches(&batches);
    say(format!("\nCollected {} posts", stats.total));
    for (account, count) in &stats.per_account {
        say(format!("  @{}: {}", account, count));
    }

    say("\n✅ Done!".to_string());

    Ok(())
}
