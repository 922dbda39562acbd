//! probe-stats: dump the raw GetGlobalStatsForGame response
//!
//! Useful when adding a game: shows which stat names Steam actually reports
//! and how the totals are encoded, before they go into config.json.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;

use steam_stats_poster::config::{AppConfig, CONFIG_PATH, STEAM_API_KEY_ENV};
use steam_stats_poster::steam::{SteamClient, parse_global_stats};

#[derive(Parser)]
#[command(name = "probe-stats", about = "Print raw Steam global stats for an app")]
struct Args {
    /// Steam app id
    #[arg(long)]
    appid: String,

    /// Stat name to request (repeatable)
    #[arg(long = "name", required = true)]
    names: Vec<String>,

    /// Config file to read the API key from (STEAM_API_KEY wins if set)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(&args.config).ok();
    let Some((base, api_key)) =
        AppConfig::steam_access(config.as_ref(), std::env::var(STEAM_API_KEY_ENV).ok())
    else {
        bail!(
            "no STEAM_API_KEY set and {} could not be loaded",
            args.config.display()
        );
    };
    let client = SteamClient::new(base, api_key);

    println!("=== Probe: GetGlobalStatsForGame ===");
    println!("App:   {}", args.appid);
    println!("Names: {}", args.names.join(", "));
    println!();

    let start = Instant::now();
    let body = client.raw_global_stats(&args.appid, &args.names).await?;
    println!("Latency: {:?}", start.elapsed());
    println!();
    println!("{}", serde_json::to_string_pretty(&body)?);
    println!();

    println!("--- Decoded ---");
    match parse_global_stats(&body.to_string(), &args.names) {
        Ok(stats) => {
            for (name, value) in &stats {
                println!("  {name}: {value}");
            }
        }
        Err(e) => println!("  {e}"),
    }

    Ok(())
}
