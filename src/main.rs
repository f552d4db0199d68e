use puzzle_backend::api::{self, AppState};
use puzzle_backend::config::Config;
use puzzle_backend::highscores::HighscoreTable;
use puzzle_backend::levels::LevelStore;
use puzzle_backend::metrics;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    let levels = LevelStore::new(&config.levels_dir);
    let highscores = HighscoreTable::new(config.score_order);
    tracing::info!(
        levels_dir = %levels.dir().display(),
        score_order = %highscores.order(),
        "Found {} levels",
        levels.count()
    );

    let state = AppState::new(levels, highscores);
    let app = api::app(state, config.allowed_origins.as_deref());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Puzzle backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
