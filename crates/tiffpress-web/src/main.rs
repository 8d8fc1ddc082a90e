use anyhow::Context;
use tiffpress_web::{build_router, server, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    telemetry::init_tracing(config.is_production()).context("Failed to initialize tracing")?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Starting tiffpress"
    );

    let app = build_router(AppState::new(config.clone()));
    server::start_server(&config, app).await
}
