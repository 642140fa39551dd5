//! Configuration management for the beat aggregator.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Every accessor falls back to a default
//! so the tool runs against the public Spotify endpoints without any setup
//! besides the secret file.
//!
//! Lookup order:
//! 1. Environment variables
//! 2. `.env` in the local data directory
//! 3. Built-in defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::spotify::client::RetryPolicy;

pub const APP_DIR: &str = "beat-aggregator";

/// Loads environment variables from `<local data dir>/beat-aggregator/.env`.
///
/// The directory is created when missing. A missing `.env` file is reported
/// as an error so the caller can warn about it, but nothing in the crate
/// requires the file to exist.
pub async fn load_env() -> Result<(), String> {
    let path = app_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(())
}

/// Platform-specific application directory, e.g. `~/.local/share/beat-aggregator`.
pub fn app_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Base URL of the Web API including the version prefix.
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", "https://api.spotify.com/v1")
}

/// Base URL of the accounts service hosting `/authorize` and `/api/token`.
pub fn spotify_accounts_url() -> String {
    var_or("SPOTIFY_ACCOUNTS_URL", "https://accounts.spotify.com")
}

/// Address the callback listener binds to.
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", "127.0.0.1:1270")
}

pub fn spotify_redirect_path() -> String {
    var_or("SPOTIFY_API_REDIRECT_PATH", "/redirect")
}

/// Explicit redirect URI. When unset it is derived from the bound listener.
pub fn spotify_redirect_uri() -> Option<String> {
    env::var("SPOTIFY_API_REDIRECT_URI")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

pub fn auth_timeout() -> Duration {
    Duration::from_secs(parse_or("SPOTIFY_AUTH_TIMEOUT_SECS", 300))
}

/// JSON file holding `{"id": ..., "secret": ...}`.
pub fn secret_file() -> PathBuf {
    env::var("SPOTIFY_SECRET_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| app_dir().join("secrets").join("spotify.json"))
}

/// Directory receiving `analysis.json`, `uris.txt` and the recorded tracks.
pub fn data_dir() -> PathBuf {
    env::var("BEAT_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| app_dir().join("data"))
}

/// `BEAT_MAX_RATE_LIMIT_RETRIES=0` disables the bound.
pub fn retry_policy() -> RetryPolicy {
    let defaults = RetryPolicy::default();
    let max_rate_limit_retries = match parse_or("BEAT_MAX_RATE_LIMIT_RETRIES", 10u32) {
        0 => None,
        n => Some(n),
    };

    RetryPolicy {
        max_rate_limit_retries,
        max_server_error_retries: parse_or(
            "BEAT_MAX_SERVER_ERROR_RETRIES",
            defaults.max_server_error_retries,
        ),
        server_error_backoff: Duration::from_secs(parse_or(
            "BEAT_SERVER_ERROR_BACKOFF_SECS",
            defaults.server_error_backoff.as_secs(),
        )),
    }
}

pub fn device_type() -> String {
    var_or("BEAT_DEVICE_TYPE", "Computer")
}

pub fn device_poll_interval() -> Duration {
    Duration::from_secs(parse_or("BEAT_DEVICE_POLL_SECS", 15))
}

/// `0` (the default) polls until cancelled.
pub fn device_poll_attempts() -> Option<u32> {
    match parse_or("BEAT_DEVICE_POLL_ATTEMPTS", 0u32) {
        0 => None,
        n => Some(n),
    }
}

pub fn priming_track() -> String {
    var_or("BEAT_PRIMING_TRACK", "spotify:track:0GiWi4EkPduFWHQyhiKpRB")
}

pub fn playback_margin() -> Duration {
    Duration::from_secs(parse_or("BEAT_PLAYBACK_MARGIN_SECS", 60))
}
