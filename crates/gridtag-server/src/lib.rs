pub mod arena;
pub mod broadcast;
pub mod config;
pub mod lobby;
pub mod match_loop;
pub mod state;
pub mod store;
pub mod timers;
pub mod tracker;
pub mod ws;

use axum::Router;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let state = AppState::new(config);
    let app = router(state.clone());
    (app, state)
}

pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .route("/ws", axum::routing::get(ws::ws_handler))
        .route("/healthz", axum::routing::get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
