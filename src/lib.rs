pub mod bsky;
pub mod config;
pub mod error;
pub mod format;
pub mod reporter;
pub mod runner;
pub mod snapshot;
pub mod steam;
pub mod types;

/// Steam Web API base URL
pub const STEAM_API_BASE: &str = "https://api.steampowered.com";

/// Bluesky PDS used for login and posting
pub const BSKY_HOST: &str = "https://bsky.social";

#[cfg(test)]
mod test_server;
