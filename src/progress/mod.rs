use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod player;

pub fn router() -> Router<AppState> {
    handlers::progress_routes()
}
