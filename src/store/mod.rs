//! Persistence seam for accounts, sessions, stats and achievement unlocks.
//!
//! Uniqueness (usernames, emails, achievement unlocks) is the datastore's job:
//! implementations must turn a duplicate insert into [`StoreError::Conflict`]
//! or a `None` result in a single atomic step, never a check-then-insert.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub user_id: Uuid,
    pub session_token: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub is_active: bool,
}

impl Session {
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.is_active && self.expires_at > now
    }

    pub fn age(&self, now: OffsetDateTime) -> time::Duration {
        now - self.created_at
    }
}

/// Per-user gamification counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct UserStats {
    pub analyses: i64,
    pub discoveries: i64,
    pub stars_explored: i64,
    pub uploads: i64,
    pub total_xp: i64,
}

/// Amounts to add to each counter. Never negative once validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub analyses: i64,
    pub discoveries: i64,
    pub stars_explored: i64,
    pub uploads: i64,
    pub xp: i64,
}

impl StatsDelta {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Absolute counter values; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsPatch {
    pub analyses: Option<i64>,
    pub discoveries: Option<i64>,
    pub stars_explored: Option<i64>,
    pub uploads: Option<i64>,
    pub total_xp: Option<i64>,
}

/// Result of [`AccountStore::apply_progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressApplied {
    pub stats: UserStats,
    /// Achievements this call unlocked, in the order they were offered.
    pub unlocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AchievementUnlock {
    pub achievement_id: String,
    pub unlocked_at: OffsetDateTime,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Insert the user and a zeroed stats row together. A taken username or
    /// email yields [`StoreError::Conflict`].
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    /// Active user whose username equals `username` or whose email equals `email`.
    async fn find_active_for_login(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError>;

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, StoreError>;

    /// Returns whether an active session was deactivated.
    async fn deactivate_session(&self, token: Uuid) -> Result<bool, StoreError>;

    /// Current counters, inserting a zeroed row first if the user has none.
    async fn get_or_create_stats(&self, user_id: Uuid) -> Result<UserStats, StoreError>;

    /// Overwrite the given counters, creating the row first if the user has none.
    async fn overwrite_stats(&self, user_id: Uuid, patch: StatsPatch)
        -> Result<UserStats, StoreError>;

    /// Overwrite with `target` only if no counter decreases and none grows by more
    /// than its step limit. `None` means the guard rejected the write.
    async fn advance_stats(
        &self,
        user_id: Uuid,
        target: UserStats,
        max_counter_step: i64,
        max_xp_step: i64,
    ) -> Result<Option<UserStats>, StoreError>;

    async fn increment_stats(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
    ) -> Result<UserStats, StoreError>;

    async fn list_achievements(&self, user_id: Uuid)
        -> Result<Vec<AchievementUnlock>, StoreError>;

    /// `None` when the pair was already unlocked.
    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement_id: &str,
    ) -> Result<Option<AchievementUnlock>, StoreError>;

    /// Adds `delta`, unlocks every `(achievement_id, xp)` award not yet
    /// unlocked and adds its XP. Either all of it is written or none of it.
    async fn apply_progress(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
        awards: &[(&str, i64)],
    ) -> Result<ProgressApplied, StoreError>;
}
