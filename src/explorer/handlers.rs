use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::{
    leaderboard::{self, LeaderboardEntry},
    planets::{Exoplanet, PlanetStatus, EXOPLANETS},
    predict,
};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedPlanet {
    #[serde(flatten)]
    pub planet: Exoplanet,
    pub ai_prediction: PlanetStatus,
    pub ai_confidence: u8,
}

#[derive(Debug, Serialize)]
pub struct ExoplanetList {
    pub planets: Vec<AnalyzedPlanet>,
}

#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub fn explorer_routes() -> Router<AppState> {
    Router::new()
        .route("/exoplanets", get(list_exoplanets))
        .route("/leaderboard", get(get_leaderboard))
}

/// Every call draws fresh predictions.
pub async fn list_exoplanets() -> Json<ExoplanetList> {
    let mut rng = rand::thread_rng();
    let planets = EXOPLANETS
        .iter()
        .map(|planet| AnalyzedPlanet {
            planet: *planet,
            ai_prediction: predict::predict(planet, &mut rng),
            ai_confidence: predict::confidence(planet, &mut rng),
        })
        .collect();
    Json(ExoplanetList { planets })
}

#[instrument(skip(state, claims))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Leaderboard>, ApiError> {
    let stats = state
        .store
        .get_or_create_stats(claims.sub)
        .await
        .map_err(ApiError::database)?;
    Ok(Json(Leaderboard {
        leaderboard: leaderboard::build(&stats),
    }))
}
