use crate::config::Config;
use crate::errors::AppError;
use crate::models::{HealthStatus, RiskAssessment};
use crate::orchestrator::PredictionOrchestrator;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
pub struct AppState {
    /// Scoring pipeline; holds the models loaded at startup.
    pub orchestrator: PredictionOrchestrator,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Reports which model family serves predictions and whether attributions
/// are available.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(state.orchestrator.status())
}

/// POST /predict
///
/// Scores one observation. Validation failures are answered with 400; a
/// failing learned model is never visible to the caller beyond `fallback`.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<RiskAssessment>, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let assessment = state.orchestrator.predict(&body)?;

    Ok(Json(assessment))
}

/// Builds the application router.
///
/// `/predict` sits behind the body size limit and, unless disabled, per-IP
/// rate limiting. `/health` bypasses both. The rate limiter needs the peer
/// address, so serve with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(state: Arc<AppState>) -> anyhow::Result<Router> {
    let predict_routes = Router::new()
        .route("/predict", post(predict))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes));

    let predict_routes = if state.config.rate_limit_enabled() {
        // One token every `period` ms gives `rate_limit_per_second` req/s
        let period = (1000 / state.config.rate_limit_per_second).max(1);
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_millisecond(period)
                .burst_size(state.config.rate_limit_burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
        );
        predict_routes.layer(ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }))
    } else {
        predict_routes
    };

    Ok(Router::new()
        .route("/health", get(health))
        .merge(predict_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
