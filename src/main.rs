use bike_demand_predictor::{config::ServiceConfig, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bike_demand_predictor=info,tower_http=info".into()),
        )
        .init();

    let cfg = ServiceConfig::from_env()?;

    // Artifacts are loaded before the listener binds; a failed load still
    // serves, answering /predict with 503
    let state = AppState::from_artifact_dir(&cfg.artifact_dir).with_prediction_logging(cfg.log_predictions);
    if !state.is_ready() {
        tracing::warn!("model unavailable; /predict will answer 503 until restart");
    }

    let app = routes::router(state);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("bike-demand-predictor v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    axum::serve(listener, app).await?;
    Ok(())
}
