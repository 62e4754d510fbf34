//! Access gate service library
//!
//! Discord OAuth2 login that runs one configured command for users who belong
//! to a required guild and hold at least one required role in it.

#![deny(dead_code)]

pub mod access;
pub mod auth;
pub mod config;
pub mod web;

use auth::DiscordClient;
use config::Config;
use std::sync::Arc;
use web::PageRenderer;

#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub discord: DiscordClient,
    /// Page template cache, shared with the panic handler
    pub renderer: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let discord = DiscordClient::new(&config)?;
        let renderer = Arc::new(PageRenderer::new(config.page_template_path.clone()));
        renderer.preload();

        Ok(Arc::new(AppState {
            config: Arc::new(config),
            discord,
            renderer,
        }))
    }
}
