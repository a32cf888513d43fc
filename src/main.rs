use foot_risk_api::config::Config;
use foot_risk_api::handlers::{self, AppState};
use foot_risk_api::orchestrator::{ModelRuntime, PredictionOrchestrator};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, reads the configuration, loads the learned models
/// (or settles on the rule engine) and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foot_risk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Decided once; never changes while serving
    let runtime = ModelRuntime::load(&config.models_dir, config.shap_enabled);

    let app_state = Arc::new(AppState {
        orchestrator: PredictionOrchestrator::new(runtime),
        config: config.clone(),
    });

    let app = handlers::app(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
