use std::collections::BTreeSet;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    achievements::catalog::{AchievementDef, CATALOG},
    store::{AccountStore, StatsDelta, StoreError, UserStats},
};

/// Something the player did in the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    Analysis,
    Discovery,
    StarExplored,
    Upload,
    TourCompleted,
}

impl GameEvent {
    pub fn xp(self) -> i64 {
        match self {
            GameEvent::Analysis => 25,
            GameEvent::Discovery => 50,
            GameEvent::StarExplored => 10,
            GameEvent::Upload => 30,
            GameEvent::TourCompleted => 0,
        }
    }
}

/// A player's gamification state, loaded from the store. Events applied with
/// [`PlayerState::record`] accumulate in [`PlayerState::pending`] until the
/// caller persists them.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub stats: UserStats,
    pub unlocked: BTreeSet<String>,
    pub tour_completed: bool,
    pub pending: StatsDelta,
}

impl PlayerState {
    pub async fn load(store: &dyn AccountStore, user_id: Uuid) -> Result<Self, StoreError> {
        let stats = store.get_or_create_stats(user_id).await?;
        let unlocked = store
            .list_achievements(user_id)
            .await?
            .into_iter()
            .map(|a| a.achievement_id)
            .collect();
        Ok(Self {
            stats,
            unlocked,
            ..Default::default()
        })
    }

    pub fn record(&mut self, event: GameEvent) {
        match event {
            GameEvent::Analysis => {
                self.stats.analyses += 1;
                self.pending.analyses += 1;
            }
            GameEvent::Discovery => {
                self.stats.discoveries += 1;
                self.pending.discoveries += 1;
            }
            GameEvent::StarExplored => {
                self.stats.stars_explored += 1;
                self.pending.stars_explored += 1;
            }
            GameEvent::Upload => {
                self.stats.uploads += 1;
                self.pending.uploads += 1;
            }
            GameEvent::TourCompleted => self.tour_completed = true,
        }
        self.stats.total_xp += event.xp();
        self.pending.xp += event.xp();
    }

    /// Catalog achievements whose requirement holds but that are not unlocked.
    pub fn eligible(&self) -> Vec<&'static AchievementDef> {
        CATALOG
            .iter()
            .filter(|a| !self.unlocked.contains(a.id))
            .filter(|a| a.requirement.is_met(&self.stats, self.tour_completed))
            .collect()
    }

    /// Records an unlock persisted by the store. XP is granted there.
    pub fn mark_unlocked(&mut self, id: &str) {
        self.unlocked.insert(id.to_string());
    }
}
