use anyhow::Context;
use rstuf_webui::{
    api::ApiClient,
    config::{server_host, AppConfig, ResolvedConfig},
    web,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; settings.toml and the environment still apply
    dotenvy::dotenv().ok();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rstuf_webui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RSTUF WebUI v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("failed to load configuration")?;
    server_host(&config.server).context("RSTUF_SERVER must be an absolute http(s) URL")?;
    info!(server = %config.server, "Configuration loaded");

    let client = ApiClient::from_config(&config).context("failed to build HTTP client")?;

    // Probe once; the result is frozen for the rest of the process.
    let resolved = ResolvedConfig::resolve(&config, &client)
        .await
        .with_context(|| format!("failed to reach repository service at {}", config.server))?;
    info!(auth = ?resolved.auth, "Backend auth mode resolved");

    let shutdown = CancellationToken::new();
    let state = web::AppState::new(Arc::new(resolved), client, shutdown.clone());
    let app = web::create_router(state);

    let web_addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&web_addr).await?;
    info!("Web server listening on http://{}", web_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("web server exited unexpectedly")?;

    Ok(())
}
