use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use steam_stats_poster::bsky::BskyClient;
use steam_stats_poster::config::{AppConfig, CONFIG_PATH, STEAM_API_KEY_ENV};
use steam_stats_poster::reporter::{self, RunSummary};
use steam_stats_poster::runner::{self, RunOptions, Services};
use steam_stats_poster::snapshot::SnapshotStore;
use steam_stats_poster::steam::SteamClient;

#[derive(Parser)]
#[command(
    name = "stats-poster",
    about = "Post Steam global stat changes to Bluesky (one run per invocation)"
)]
struct Args {
    /// Path to the config file (.json or .toml)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Fetch and format only; no login, no posts, no snapshot writes
    #[arg(long)]
    dry_run: bool,

    /// Directory for latest_<appid>.json snapshots (overrides settings.snapshot_dir)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = AppConfig::load(&args.config).context("cannot start without a config")?;
    config.override_api_key(std::env::var(STEAM_API_KEY_ENV).ok());
    info!(
        "Loaded config from {} ({} actor(s))",
        args.config.display(),
        config.actors.len()
    );

    let snapshot_dir = args
        .snapshot_dir
        .unwrap_or_else(|| config.settings.snapshot_dir.clone());
    let options = RunOptions {
        dry_run: args.dry_run,
        advance_snapshot: config.settings.advance_snapshot,
    };

    let mode = if options.dry_run { "dry-run" } else { "live" };
    info!(
        "Starting run ({mode}) — snapshots={} advance_snapshot={}",
        snapshot_dir.display(),
        options.advance_snapshot
    );

    let services = Arc::new(Services {
        stats: SteamClient::new(&config.settings.steam_api_base, &config.steam_api_key),
        poster: BskyClient::new(&config.settings.bsky_host),
        snapshots: SnapshotStore::new(snapshot_dir),
    });

    let reports = runner::run_all(Arc::new(config), services, options).await;

    for report in &reports {
        reporter::report_actor(report);
    }
    let summary = RunSummary::from_reports(&reports);
    info!(
        "Run complete — actors={} posted={} baselines={} dry_runs={} aborted={}",
        summary.actors, summary.posted, summary.baselines, summary.dry_runs, summary.aborted,
    );

    Ok(())
}
