use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::Stat;
use crate::{BSKY_HOST, STEAM_API_BASE};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.json";

/// Environment variable that overrides `steam_api_key`.
pub const STEAM_API_KEY_ENV: &str = "STEAM_API_KEY";

/// Top-level application config deserialized from `config.json` (or `.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub steam_api_key: String,
    #[serde(default)]
    pub settings: SettingsConfig,
    pub actors: Vec<Actor>,
}

/// A Bluesky account that posts updates for one Steam app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub handle: String,
    /// App password for the account.
    pub password: String,
    pub appid: String,
    pub stats: Vec<Stat>,
}

impl Actor {
    /// Internal stat names, in config order.
    pub fn stat_names(&self) -> Vec<String> {
        self.stats.iter().map(|s| s.name.clone()).collect()
    }
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Directory holding the `latest_<appid>.json` snapshots.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    /// Overwrite the snapshot after every successful post instead of only on
    /// the first observation.
    #[serde(default)]
    pub advance_snapshot: bool,
    #[serde(default = "default_bsky_host")]
    pub bsky_host: String,
    #[serde(default = "default_steam_api_base")]
    pub steam_api_base: String,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_bsky_host() -> String {
    BSKY_HOST.to_string()
}

fn default_steam_api_base() -> String {
    STEAM_API_BASE.to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            advance_snapshot: false,
            bsky_host: default_bsky_host(),
            steam_api_base: default_steam_api_base(),
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn config_error(path: &Path, message: impl ToString) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

impl AppConfig {
    /// Load config from the given path. `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| config_error(path, e))?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self> {
        let config: Self = if is_toml(path) {
            toml::from_str(contents).map_err(|e| config_error(path, e))?
        } else {
            serde_json::from_str(contents).map_err(|e| config_error(path, e))?
        };
        config.warn_shared_appids();
        Ok(config)
    }

    /// Write config back to `path`, in the format its extension implies.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| config_error(path, e))?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| config_error(path, e))?
        };
        std::fs::write(path, contents).map_err(|e| config_error(path, e))?;
        Ok(())
    }

    /// Replace the API key when `key` is set and non-empty.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.steam_api_key = key;
        }
    }

    /// Steam base URL and API key for tools that can run without a config
    /// file. A non-empty `env_key` wins over the config's key; the base URL
    /// comes from the config when there is one.
    pub fn steam_access(
        config: Option<&AppConfig>,
        env_key: Option<String>,
    ) -> Option<(String, String)> {
        let env_key = env_key.filter(|k| !k.trim().is_empty());
        match config {
            Some(config) => Some((
                config.settings.steam_api_base.clone(),
                env_key.unwrap_or_else(|| config.steam_api_key.clone()),
            )),
            None => env_key.map(|key| (STEAM_API_BASE.to_string(), key)),
        }
    }

    pub fn actor_mut(&mut self, handle: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.handle == handle)
    }

    /// Actors tracking the same app share one snapshot file.
    fn warn_shared_appids(&self) {
        let mut seen = HashSet::new();
        for actor in &self.actors {
            if !seen.insert(actor.appid.as_str()) {
                warn!(
                    "App {} is tracked by more than one actor; they share latest_{}.json",
                    actor.appid, actor.appid
                );
            }
        }
    }
}
