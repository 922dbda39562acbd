//! setup-actor: verify a Bluesky app password and store it in the config.
//!
//! Expects the config file to already list the actor (handle, appid, stats).
//! Logs in with the given password, prints the resolved DID, and writes the
//! password back into the actor's entry.
//!
//! By default, reads the password interactively (hidden input) to avoid
//! leaking it into shell history. Use `--password` only for scripted/CI use.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use steam_stats_poster::bsky::{BskyClient, Poster};
use steam_stats_poster::config::{AppConfig, CONFIG_PATH};

#[derive(Parser)]
#[command(
    name = "setup-actor",
    about = "Validate a Bluesky login and save its app password to the config"
)]
struct Cli {
    /// Handle of an actor already present in the config
    #[arg(long)]
    handle: String,

    /// App password. If omitted, reads interactively with hidden input (recommended).
    #[arg(long)]
    password: Option<String>,

    /// Path to the config file (.json or .toml)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(&cli.config).with_context(|| {
        format!(
            "{} not found or invalid — create it with the actor entry first",
            cli.config.display()
        )
    })?;

    let Some(appid) = app_config
        .actors
        .iter()
        .find(|a| a.handle == cli.handle)
        .map(|a| a.appid.clone())
    else {
        bail!("no actor with handle {} in {}", cli.handle, cli.config.display());
    };

    println!("=== Stats Poster — Actor Setup ===\n");

    // ── Step 1: Read password ──────────────────────────────────────
    let password = match cli.password {
        Some(password) => password,
        None => {
            let password = rpassword::prompt_password(format!("App password for {}: ", cli.handle))
                .context("failed to read password")?;
            if password.trim().is_empty() {
                bail!("password cannot be empty");
            }
            password.trim().to_string()
        }
    };

    // ── Step 2: Log in ─────────────────────────────────────────────
    println!("Logging in to {}...", app_config.settings.bsky_host);
    let client = BskyClient::new(&app_config.settings.bsky_host);
    let session = client
        .authenticate(&cli.handle, &password)
        .await
        .context("login failed — check the handle and app password")?;
    println!("  Handle: {}", session.handle);
    println!("  DID:    {}", session.did);
    println!();

    // ── Step 3: Save password ──────────────────────────────────────
    println!("Updating password in {}...", cli.config.display());
    if let Some(actor) = app_config.actor_mut(&cli.handle) {
        actor.password = password;
    }
    app_config.save(&cli.config)?;
    println!("  Config updated successfully");
    println!();

    println!("=== Setup Complete ===");
    println!();
    println!("Next steps:");
    println!("  cargo run --bin stats-poster -- --dry-run");
    println!("  (the first live run only records a baseline in latest_{appid}.json)");

    Ok(())
}
