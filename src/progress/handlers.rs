use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::player::{GameEvent, PlayerState};
use crate::{
    auth::AuthUser, error::ApiError, extract::ApiJson, state::AppState, stats::dto::StatsView,
};

const MAX_EVENTS: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventBatch {
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub stats: StatsView,
    pub unlocked: Vec<String>,
    pub eligible: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_unlocked: Option<Vec<String>>,
}

impl ProgressView {
    fn of(player: &PlayerState, newly_unlocked: Option<Vec<String>>) -> Self {
        Self {
            stats: player.stats.into(),
            unlocked: player.unlocked.iter().cloned().collect(),
            eligible: player.eligible().iter().map(|a| a.id).collect(),
            newly_unlocked,
        }
    }
}

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress", get(get_progress))
        .route("/progress/events", post(record_events))
}

#[instrument(skip(state, claims))]
pub async fn get_progress(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProgressView>, ApiError> {
    let player = PlayerState::load(state.store.as_ref(), claims.sub)
        .await
        .map_err(ApiError::database)?;
    Ok(Json(ProgressView::of(&player, None)))
}

/// Applies gameplay events with server-side XP and unlocks every achievement
/// they make eligible. Counters, unlocks and achievement XP are written in
/// one store call, so a failed request leaves nothing behind and can be retried.
#[instrument(skip(state, claims, payload))]
pub async fn record_events(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<EventBatch>,
) -> Result<Json<ProgressView>, ApiError> {
    if payload.events.len() > MAX_EVENTS {
        return Err(ApiError::BadRequest(format!(
            "At most {MAX_EVENTS} events per request"
        )));
    }

    let store = state.store.as_ref();
    let mut player = PlayerState::load(store, claims.sub)
        .await
        .map_err(ApiError::database)?;
    for event in &payload.events {
        player.record(*event);
    }

    let eligible = player.eligible();
    let mut newly_unlocked = Vec::new();
    if !player.pending.is_zero() || !eligible.is_empty() {
        let awards: Vec<(&str, i64)> = eligible.iter().map(|a| (a.id, a.xp)).collect();
        let applied = store
            .apply_progress(claims.sub, player.pending, &awards)
            .await
            .map_err(|e| ApiError::internal("Failed to update stats", e))?;
        player.stats = applied.stats;
        newly_unlocked = applied.unlocked;
    }
    for achievement in &eligible {
        player.mark_unlocked(achievement.id);
    }

    info!(
        user_id = %claims.sub,
        events = payload.events.len(),
        unlocked = newly_unlocked.len(),
        "progress recorded"
    );
    Ok(Json(ProgressView::of(&player, Some(newly_unlocked))))
}
