// HTTP API routes (levels, highscores, health, metrics).

use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::highscores::{HighscoreTable, Score};
use crate::levels::{LevelContent, LevelId, LevelStore};
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub levels: LevelStore,
    pub highscores: HighscoreTable,
}

impl AppState {
    pub fn new(levels: LevelStore, highscores: HighscoreTable) -> Self {
        Self { levels, highscores }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        // Levels
        .route("/levels", get(list_levels))
        .route("/level/{id}", get(get_level))
        .route("/random_level", get(random_level))
        // Highscores
        .route("/highscore/{id}", post(update_highscore))
        .with_state(state)
}

/// Full application: routes plus CORS and request metrics.
pub fn app(state: AppState, allowed_origins: Option<&[String]>) -> Router {
    router(state)
        .layer(axum::middleware::from_fn(metrics::track_metrics))
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ── Service handlers ─────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "puzzle-backend" }))
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

// ── Level handlers ───────────────────────────────────────────────────

async fn list_levels(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "amount_levels": state.levels.count() }))
}

async fn get_level(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_level_id(&raw_id)?;
    let level = state.levels.get_level(id)?;
    level_response(&state.highscores, level)
}

async fn random_level(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let level = {
        let mut rng = rand::thread_rng();
        state.levels.random_level(&mut rng)?
    };
    level_response(&state.highscores, level)
}

/// Parse a level id path segment.
///
/// Any run of digits is a well-formed id; one too large for `LevelId` cannot
/// name an existing level and is reported as not found.
fn parse_level_id(raw: &str) -> Result<LevelId, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest(format!("Invalid level id '{raw}'.")));
    }
    raw.parse().map_err(|_| {
        // Overflowing ids always have a non-zero digit.
        ApiError::NotFound(raw.trim_start_matches('0').to_string())
    })
}

/// Build the `{level, game, highscore}` envelope shared by both level routes.
fn level_response(
    highscores: &HighscoreTable,
    level: LevelContent,
) -> Result<Json<Value>, ApiError> {
    // An empty file is treated as a missing puzzle.
    if level.raw.is_empty() {
        return Err(ApiError::NotFound(level.id.to_string()));
    }
    let game: Value = serde_json::from_str(&level.raw).map_err(|e| {
        ApiError::Internal(format!("level {} is not valid JSON: {e}", level.id))
    })?;
    let highscore = match highscores.get(level.id) {
        Some(score) => json!(score),
        None => json!(-1),
    };
    metrics::LEVELS_SERVED_TOTAL.inc();
    Ok(Json(json!({
        "level": level.id,
        "game": game,
        "highscore": highscore,
    })))
}

// ── Highscore handlers ───────────────────────────────────────────────

async fn update_highscore(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let id = parse_level_id(&raw_id)?;
    let new_score = parse_highscore_body(&body)?;
    let outcome = state.highscores.update(id, new_score.clone());

    if !outcome.updated {
        tracing::debug!(level = id, score = %new_score, "Highscore not improved");
        metrics::HIGHSCORE_UPDATES_TOTAL
            .with_label_values(&["rejected"])
            .inc();
        return Err(ApiError::NotModified);
    }

    let old = outcome
        .previous
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-1".to_string());
    tracing::info!(level = id, "Highscore updated from {old} to {new_score}");
    metrics::HIGHSCORE_UPDATES_TOTAL
        .with_label_values(&["updated"])
        .inc();

    Ok(Json(json!({
        "status": format!("Highscore updated from {old} to {new_score}."),
    })))
}

/// Extract the `highscore` field from a POST body.
fn parse_highscore_body(body: &[u8]) -> Result<Score, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Request body must be a JSON object.".to_string()))?;
    let field = value
        .get("highscore")
        .ok_or_else(|| ApiError::BadRequest("Missing field 'highscore'.".to_string()))?;
    Score::from_json(field).ok_or_else(|| {
        ApiError::BadRequest(
            "Field 'highscore' must be a number or a non-empty string.".to_string(),
        )
    })
}
