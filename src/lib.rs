//! Beat Aggregator Library
//!
//! Resolves Spotify track references, aggregates their audio analyses and
//! drives timed playback on a remote device. Every component works on an
//! explicit [`session::Session`] and returns [`error::Result`]; only the
//! binary decides how a failed run terminates.
//!
//! # Modules
//!
//! - `api` - HTTP endpoint of the local authorization listener
//! - `cli` - Run modes invoked by the binary
//! - `clock` - Sleep abstraction and cancellation
//! - `config` - Configuration from environment variables and `.env`
//! - `countdown` - Playback countdown over planned track durations
//! - `error` - Error taxonomy
//! - `management` - Secret store and export files
//! - `progress` - Step logger, spinner and countdown bar
//! - `server` - Local HTTP listener for the authorization redirect
//! - `session` - Per-run context shared by all components
//! - `spotify` - Spotify Web API operations
//! - `types` - Data structures
//! - `utils` - Small helpers
//!
//! # Example
//!
//! ```
//! use beat_aggregator::{cli, config};
//!
//! #[tokio::main]
//! async fn main() -> beat_aggregator::error::Result<()> {
//!     let _ = config::load_env().await;
//!     cli::uris(vec!["spotify:track:4uLU6hMCjMI75M1A2tKUQC".into()]).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod error;
pub mod management;
pub mod progress;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints a status line prefixed with a blue `o`.
///
/// ```
/// info!("Resolving {} references", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a completed-operation line prefixed with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a fatal message prefixed with a red `!` to stderr and exits with
/// status 1.
///
/// Library code never calls this: components return
/// [`error::Result`](crate::error::Result) and the binary is the only place
/// that terminates the process.
///
/// ```
/// error!("{}", err);
/// // not reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a recoverable issue prefixed with a yellow `!`.
///
/// ```
/// warning!("No valid devices found, retrying in {} seconds", secs);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
