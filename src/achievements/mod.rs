use crate::state::AppState;
use axum::Router;

pub mod catalog;
pub mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::achievement_routes()
}
