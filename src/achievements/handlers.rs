use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument, warn};

use super::{
    catalog::{AchievementDef, CATALOG},
    dto::{AchievementList, UnlockRequest, UnlockResponse},
};
use crate::{auth::AuthUser, error::ApiError, extract::ApiJson, state::AppState};

const MAX_ID_LEN: usize = 64;

pub fn achievement_routes() -> Router<AppState> {
    Router::new()
        .route("/achievements", get(list_achievements).post(unlock_achievement))
        .route("/achievements/catalog", get(achievement_catalog))
}

#[instrument(skip(state, claims))]
pub async fn list_achievements(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<AchievementList>, ApiError> {
    let rows = state
        .store
        .list_achievements(claims.sub)
        .await
        .map_err(ApiError::database)?;
    Ok(Json(AchievementList {
        achievements: rows.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state, claims, payload))]
pub async fn unlock_achievement(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<UnlockRequest>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let achievement_id = payload
        .achievement_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Achievement ID is required".into()))?;
    if achievement_id.chars().count() > MAX_ID_LEN {
        return Err(ApiError::BadRequest(format!(
            "Achievement ID must be at most {MAX_ID_LEN} characters"
        )));
    }

    let inserted = state
        .store
        .unlock_achievement(claims.sub, &achievement_id)
        .await
        .map_err(|e| ApiError::internal("Failed to unlock achievement", e))?;
    if inserted.is_none() {
        warn!(user_id = %claims.sub, %achievement_id, "achievement already unlocked");
        return Err(ApiError::Conflict("Achievement already unlocked"));
    }

    info!(user_id = %claims.sub, %achievement_id, "achievement unlocked");
    Ok(Json(UnlockResponse {
        message: "Achievement unlocked successfully",
        achievement_id,
    }))
}

pub async fn achievement_catalog() -> Json<&'static [AchievementDef]> {
    Json(&CATALOG[..])
}
