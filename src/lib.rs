//! Library root for `chanbot`.
//!
//! Chanbot is an IRC channel assistant designed to:
//! - Answer trigger-prefixed commands (info links, web search, cakedays, temperature conversion)
//! - Run package searches in the background and page their results into the channel
//! - Resolve the titles of links pasted into a channel
//! - Chat back through a Markov brain fed by channel traffic
//! - Keep a log file per channel
//!
//! The bot talks IRC for chat and HTTP for lookups. The architecture is built around
//! extensible traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Res};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Creates the runtime context with chat, lookup and brain clients, then runs the
/// event loop. Returns the exit code the process should end with.
pub async fn start(config: Config) -> Res<i32> {
    info!("Starting chanbot as {} on {} ...", config.bot_nick, config.server);

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await
}
