use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod leaderboard;
pub mod planets;
pub mod predict;

pub fn router() -> Router<AppState> {
    handlers::explorer_routes()
}
