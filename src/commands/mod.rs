pub mod auth;
pub mod grid;
pub mod list;

use anyhow::{Context as _, Result};
use newsdesk_core::config::NewsdeskConfig;
use newsdesk_core::fetcher::EventsFetcher;
use newsdesk_core::index::HttpIndexClient;
use newsdesk_core::registry::Registry;
use newsdesk_core::session::SessionState;

/// Everything a view needs once the session gate has passed.
pub struct Context {
    pub registry: Registry,
    pub session: SessionState,
    pub fetcher: EventsFetcher<HttpIndexClient>,
}

impl Context {
    pub fn new(config: &NewsdeskConfig, session: SessionState) -> Result<Self> {
        let registry = Registry::from_config(config)?;
        let index_url = config.index_url()?;
        let client = HttpIndexClient::new().context("Failed to build HTTP client")?;
        tracing::debug!(index_url = %index_url, time_zone = %registry.time_zone, "opening views");
        let fetcher = EventsFetcher::new(client, index_url, config.cache_policy()?);

        Ok(Context {
            registry,
            session,
            fetcher,
        })
    }
}
