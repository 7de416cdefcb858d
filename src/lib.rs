//! Coupon alert relay.
//!
//! Receives signed e-commerce order webhooks, resolves the order's coupon
//! code against an externally hosted destination directory, and forwards an
//! alert payload to every matched destination URL in parallel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

pub mod config;
pub mod crypto;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod order;
pub mod server;

pub use config::Config;
pub use error::{RelayError, Result};
pub use server::{create_router, start_server};

use directory::DirectoryFetcher;
use dispatch::AlertDispatcher;

/// Shared state injected into every request handler.
///
/// Everything here is read-only for the duration of a request: the relay
/// keeps no mutable state across invocations.
#[derive(Clone)]
pub struct AppState {
    /// Loaded service configuration.
    pub config: Arc<Config>,
    /// Fetches the coupon-to-destination directory.
    pub directory: DirectoryFetcher,
    /// Delivers alert payloads to destination URLs.
    pub dispatcher: AlertDispatcher,
}

impl AppState {
    /// Builds application state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ClientBuild` if either HTTP client cannot be
    /// constructed from the configured timeouts.
    pub fn from_config(config: Config) -> Result<Self> {
        let directory = DirectoryFetcher::new(config.to_fetch_config())?;
        let dispatcher = AlertDispatcher::new(config.to_dispatch_config())?;

        Ok(Self { config: Arc::new(config), directory, dispatcher })
    }
}
