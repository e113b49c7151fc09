use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::catalog;
use crate::store::AchievementUnlock;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnlockRequest {
    pub achievement_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub message: &'static str,
    pub achievement_id: String,
}

/// An unlock, with catalog metadata when the id is a known achievement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub unlocked_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
}

impl From<AchievementUnlock> for UnlockedAchievement {
    fn from(row: AchievementUnlock) -> Self {
        let def = catalog::find(&row.achievement_id);
        Self {
            name: def.map(|d| d.name),
            xp: def.map(|d| d.xp),
            achievement_id: row.achievement_id,
            unlocked_at: row.unlocked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AchievementList {
    pub achievements: Vec<UnlockedAchievement>,
}
