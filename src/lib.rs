//! Keyword Playlist Builder Library
//!
//! This library lets a user authorize the application against their Spotify
//! account and then builds a playlist by resolving free-text keywords into
//! catalog tracks. It contains the OAuth authorization-code flow, the token
//! lifecycle, track resolution, playlist assembly and the HTTP surface that
//! ties them together.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the authorization and playlist endpoints
//! - `cli` - Command-line flows (`serve`, `create`)
//! - `config` - Credentials and runtime settings loaded from the environment
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Authorization sessions, tokens, resolution, assembly and handoff
//! - `server` - Router construction and the shared application state
//! - `spotify` - Spotify Web API client behind the `TokenEndpoint`/`Catalog` seams
//! - `types` - Data structures and wire types
//! - `utils` - Random tokens, PKCE helpers and keyword parsing
//!
//! # Example
//!
//! ```
//! use keytracks::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> keytracks::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     cli::serve(config, None).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Res};

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for interactive status updates
/// in the command-line flows.
///
/// # Example
///
/// ```
/// info!("Waiting for authorization...");
/// info!("Resolving {} keywords", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Playlist created: {}", url);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary uses this, for conditions that make startup impossible
/// (missing credentials, unparsable settings). Library code returns errors
/// instead so that a failing request never takes the server down.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Skipped keyword '{}': {}", keyword, reason);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
