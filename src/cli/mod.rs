//! # CLI Module
//!
//! Command-line flows on top of the library.
//!
//! ## Commands
//!
//! - [`serve`] - runs the HTTP server. The callback handler completes the
//!   authorization and builds pending playlists itself (synchronous model).
//! - [`create`] - interactive flow. Starts the server in the background, opens
//!   the authorization URL in the browser, waits for the callback to hand over
//!   the authenticated client (asynchronous model) and then builds the
//!   playlist, printing a table of what each keyword resolved to.
//!
//! ## Keyword syntax
//!
//! A keyword may carry an artist constraint after `::`, e.g.
//! `Die with a Smile :: Lady Gaga, Bruno Mars`. Keyword files hold one keyword
//! per line; blank lines and lines starting with `#` are ignored.

mod create;
mod serve;

pub use create::CreateOptions;
pub use create::create;
pub use serve::serve;
