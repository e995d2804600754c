use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mahjong_scoring::{
    describe_catalog, reference_catalog, score as calc_score, PatternInfo, ScoreReport,
    ScoreRequest, ScoringError, ScoringPolicy, ScoringSystem,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ADDR_VAR: &str = "MAHJONG_SCORING_ADDR";
const POLICY_VAR: &str = "MAHJONG_SCORING_POLICY";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

struct AppState {
    system: ScoringSystem,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let policy = match std::env::var(POLICY_VAR) {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading policy file {}", path))?;
            parse_policy(&text).with_context(|| format!("parsing policy file {}", path))?
        }
        Err(_) => ScoringPolicy::default(),
    };

    let catalog = reference_catalog()?;
    info!(
        catalog = catalog.name(),
        patterns = catalog.patterns().len(),
        min_value_mahjong = policy.min_value_mahjong,
        "scoring system ready"
    );
    let state = Arc::new(AppState {
        system: ScoringSystem::new(catalog, policy)?,
    });

    let app = Router::new()
        .route("/api/score", post(score))
        .route("/api/patterns", get(patterns))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = std::env::var(ADDR_VAR)
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .with_context(|| format!("invalid {}", ADDR_VAR))?;
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn parse_policy(text: &str) -> anyhow::Result<ScoringPolicy> {
    Ok(serde_json::from_str(text)?)
}

async fn score(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreReport>, ApiError> {
    // the pipeline is CPU bound and may fan out on rayon
    let report = tokio::task::spawn_blocking(move || calc_score(&state.system, &req))
        .await
        .map_err(|e| ApiError(e.to_string()))??;
    Ok(Json(report))
}

async fn patterns(State(state): State<Arc<AppState>>) -> Json<Vec<PatternInfo>> {
    Json(describe_catalog(state.system.pattern_list()))
}

struct ApiError(String);

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        ApiError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}
