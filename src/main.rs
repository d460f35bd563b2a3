use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pick_and_order::geo::{Geocoder, StaticGeocoder};
use pick_and_order::{api, config, engine, error, state};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let geocoder: Arc<dyn Geocoder> = match &config.geocoder_fixtures {
        Some(path) => Arc::new(
            StaticGeocoder::from_file(path)
                .map_err(|err| error::AppError::Internal(err.to_string()))?,
        ),
        None => {
            tracing::warn!("GEOCODER_FIXTURES not set; map clicks will not resolve addresses");
            Arc::new(StaticGeocoder::empty())
        }
    };

    let http_port = config.http_port;
    let shared_state = Arc::new(state::AppState::new(config, geocoder));
    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::controller::run_idle_wizard_sweeper(shared_state));

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
