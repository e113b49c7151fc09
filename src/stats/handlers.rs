use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{StatsIncrement, StatsSnapshot, StatsUpdated, StatsView};
use crate::{
    auth::AuthUser,
    config::StatsLimits,
    error::{ApiError, FieldError},
    extract::ApiJson,
    state::AppState,
    store::{StatsDelta, StatsPatch, UserStats},
};

const NEGATIVE: &str = "Value must be a non-negative integer";
const DECREASE: &str = "Stats can only increase";
const TOO_LARGE: &str = "Increase exceeds the per-update limit";

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/user-stats", get(get_stats).post(update_stats))
        .route("/user-stats/increment", post(increment_stats))
}

fn check_step(field: &'static str, from: i64, to: i64, step: i64, errors: &mut Vec<FieldError>) {
    if to < 0 {
        errors.push(FieldError::new(field, NEGATIVE));
    } else if to < from {
        errors.push(FieldError::new(field, DECREASE));
    } else if to - from > step {
        errors.push(FieldError::new(field, TOO_LARGE));
    }
}

/// Fills omitted fields from `current` and validates the move from `current`.
pub(crate) fn resolve_snapshot(
    current: UserStats,
    snapshot: &StatsSnapshot,
    limits: &StatsLimits,
) -> Result<UserStats, Vec<FieldError>> {
    let target = UserStats {
        analyses: snapshot.analyses.unwrap_or(current.analyses),
        discoveries: snapshot.discoveries.unwrap_or(current.discoveries),
        stars_explored: snapshot.stars_explored.unwrap_or(current.stars_explored),
        uploads: snapshot.uploads.unwrap_or(current.uploads),
        total_xp: snapshot.xp.unwrap_or(current.total_xp),
    };
    let step = limits.max_counter_step;
    let mut errors = Vec::new();
    check_step("analyses", current.analyses, target.analyses, step, &mut errors);
    check_step("discoveries", current.discoveries, target.discoveries, step, &mut errors);
    check_step("starsExplored", current.stars_explored, target.stars_explored, step, &mut errors);
    check_step("uploads", current.uploads, target.uploads, step, &mut errors);
    check_step("xp", current.total_xp, target.total_xp, limits.max_xp_step, &mut errors);
    if errors.is_empty() {
        Ok(target)
    } else {
        Err(errors)
    }
}

pub(crate) fn resolve_increment(
    body: &StatsIncrement,
    limits: &StatsLimits,
) -> Result<StatsDelta, Vec<FieldError>> {
    let step = limits.max_counter_step;
    let mut errors = Vec::new();
    check_step("analyses", 0, body.analyses, step, &mut errors);
    check_step("discoveries", 0, body.discoveries, step, &mut errors);
    check_step("starsExplored", 0, body.stars_explored, step, &mut errors);
    check_step("uploads", 0, body.uploads, step, &mut errors);
    check_step("xp", 0, body.xp, limits.max_xp_step, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(StatsDelta {
        analyses: body.analyses,
        discoveries: body.discoveries,
        stars_explored: body.stars_explored,
        uploads: body.uploads,
        xp: body.xp,
    })
}

#[instrument(skip(state, claims))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<StatsView>, ApiError> {
    let stats = state
        .store
        .get_or_create_stats(claims.sub)
        .await
        .map_err(ApiError::database)?;
    Ok(Json(stats.into()))
}

/// Stores the snapshot as sent. With `STATS_ENFORCE_MONOTONIC` on, counters
/// may only grow by a bounded step and the guard runs in the write itself.
#[instrument(skip(state, claims, payload))]
pub async fn update_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<StatsSnapshot>,
) -> Result<Json<StatsUpdated>, ApiError> {
    let limits = &state.config.stats;
    let stats = if limits.enforce_monotonic {
        let current = state
            .store
            .get_or_create_stats(claims.sub)
            .await
            .map_err(ApiError::database)?;

        let target = resolve_snapshot(current, &payload, limits).map_err(|errors| {
            warn!(user_id = %claims.sub, "stats snapshot rejected");
            ApiError::Validation(errors)
        })?;

        state
            .store
            .advance_stats(claims.sub, target, limits.max_counter_step, limits.max_xp_step)
            .await
            .map_err(|e| ApiError::internal("Failed to update stats", e))?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "stats changed between read and write");
                ApiError::Conflict("Stats were updated concurrently, please retry")
            })?
    } else {
        state
            .store
            .overwrite_stats(claims.sub, StatsPatch::from(&payload))
            .await
            .map_err(|e| ApiError::internal("Failed to update stats", e))?
    };

    info!(user_id = %claims.sub, xp = stats.total_xp, "stats updated");
    Ok(Json(StatsUpdated {
        message: "Stats updated successfully",
        stats: stats.into(),
    }))
}

#[instrument(skip(state, claims, payload))]
pub async fn increment_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<StatsIncrement>,
) -> Result<Json<StatsUpdated>, ApiError> {
    let delta = resolve_increment(&payload, &state.config.stats).map_err(ApiError::Validation)?;

    let result = if delta.is_zero() {
        state.store.get_or_create_stats(claims.sub).await
    } else {
        state.store.increment_stats(claims.sub, delta).await
    };
    let stats = result.map_err(|e| ApiError::internal("Failed to update stats", e))?;

    info!(user_id = %claims.sub, xp = stats.total_xp, "stats incremented");
    Ok(Json(StatsUpdated {
        message: "Stats updated successfully",
        stats: stats.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> StatsLimits {
        StatsLimits {
            enforce_monotonic: true,
            max_counter_step: 10,
            max_xp_step: 100,
        }
    }

    fn current() -> UserStats {
        UserStats {
            analyses: 2,
            discoveries: 1,
            stars_explored: 5,
            uploads: 0,
            total_xp: 80,
        }
    }

    #[test]
    fn omitted_fields_keep_current_values() {
        let snapshot = StatsSnapshot {
            analyses: Some(3),
            xp: Some(105),
            ..Default::default()
        };
        let target = resolve_snapshot(current(), &snapshot, &limits()).unwrap();
        assert_eq!(target.analyses, 3);
        assert_eq!(target.discoveries, 1);
        assert_eq!(target.stars_explored, 5);
        assert_eq!(target.total_xp, 105);
    }

    #[test]
    fn snapshot_cannot_decrease_or_jump() {
        let snapshot = StatsSnapshot {
            analyses: Some(1),
            stars_explored: Some(16),
            xp: Some(-1),
            ..Default::default()
        };
        let errors = resolve_snapshot(current(), &snapshot, &limits()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                FieldError::new("analyses", DECREASE),
                FieldError::new("starsExplored", TOO_LARGE),
                FieldError::new("xp", NEGATIVE),
            ]
        );
    }

    #[test]
    fn increments_are_bounded_and_non_negative() {
        let ok = StatsIncrement {
            analyses: 1,
            xp: 25,
            ..Default::default()
        };
        let delta = resolve_increment(&ok, &limits()).unwrap();
        assert_eq!(delta.analyses, 1);
        assert_eq!(delta.xp, 25);

        let bad = StatsIncrement {
            uploads: -1,
            xp: 101,
            ..Default::default()
        };
        let errors = resolve_increment(&bad, &limits()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
