use serde::{Deserialize, Serialize};

use crate::store::{StatsPatch, UserStats};

/// Stats as the client sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub analyses: i64,
    pub discoveries: i64,
    pub stars_explored: i64,
    pub uploads: i64,
    pub xp: i64,
}

impl From<UserStats> for StatsView {
    fn from(s: UserStats) -> Self {
        Self {
            analyses: s.analyses,
            discoveries: s.discoveries,
            stars_explored: s.stars_explored,
            uploads: s.uploads,
            xp: s.total_xp,
        }
    }
}

/// Absolute counter values; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub analyses: Option<i64>,
    pub discoveries: Option<i64>,
    pub stars_explored: Option<i64>,
    pub uploads: Option<i64>,
    pub xp: Option<i64>,
}

impl From<&StatsSnapshot> for StatsPatch {
    fn from(s: &StatsSnapshot) -> Self {
        Self {
            analyses: s.analyses,
            discoveries: s.discoveries,
            stars_explored: s.stars_explored,
            uploads: s.uploads,
            total_xp: s.xp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsIncrement {
    pub analyses: i64,
    pub discoveries: i64,
    pub stars_explored: i64,
    pub uploads: i64,
    pub xp: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsUpdated {
    pub message: &'static str,
    pub stats: StatsView,
}
