use access_gate::{config::Config, web, AppState};
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting access gate");

    // Load configuration from environment; any error here exits before binding
    let config = Config::load().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;
    tracing::info!(
        required_guild_id = %config.required_guild_id,
        required_role_count = config.required_role_ids.len(),
        program = %config.command.program(),
        discord_api_url = %config.discord_api_url,
        "Configuration loaded"
    );

    let state = AppState::new(config)?;
    tracing::info!(
        template = %state.renderer.path().display(),
        "Page renderer ready"
    );

    let app = web::create_router(state.clone());

    // Bind and serve
    let bind_address = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Access gate listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
