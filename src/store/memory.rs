use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    AccountStore, AchievementUnlock, NewUser, ProgressApplied, Session, StatsDelta, StatsPatch,
    StoreError, User, UserStats,
};

/// In-process stand-in for [`super::PgStore`], mirroring its constraints.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_progress: AtomicBool,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sessions: HashMap<Uuid, Session>,
    stats: HashMap<Uuid, UserStats>,
    achievements: HashMap<Uuid, Vec<AchievementUnlock>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, user_id: Uuid, active: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }

    pub fn remove_stats(&self, user_id: Uuid) {
        self.inner.lock().unwrap().stats.remove(&user_id);
    }

    /// Makes [`AccountStore::apply_progress`] fail without writing anything.
    pub fn fail_progress(&self, fail: bool) {
        self.fail_progress.store(fail, Ordering::SeqCst);
    }
}

fn add_delta(stats: &mut UserStats, delta: StatsDelta) {
    stats.analyses += delta.analyses;
    stats.discoveries += delta.discoveries;
    stats.stars_explored += delta.stars_explored;
    stats.uploads += delta.uploads;
    stats.total_xp += delta.xp;
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
            is_active: true,
        };
        inner.stats.insert(user.id, UserStats::default());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_active_for_login(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.is_active && (u.username == username || u.email == email))
            .cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError> {
        let session = Session {
            user_id,
            session_token: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            is_active: true,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.session_token, session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sessions.get(&token).cloned())
    }

    async fn deactivate_session(&self, token: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.sessions.get_mut(&token) {
            Some(session) if session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_or_create_stats(&self, user_id: Uuid) -> Result<UserStats, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(*inner.stats.entry(user_id).or_default())
    }

    async fn overwrite_stats(
        &self,
        user_id: Uuid,
        patch: StatsPatch,
    ) -> Result<UserStats, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let stats = inner.stats.entry(user_id).or_default();
        *stats = UserStats {
            analyses: patch.analyses.unwrap_or(stats.analyses),
            discoveries: patch.discoveries.unwrap_or(stats.discoveries),
            stars_explored: patch.stars_explored.unwrap_or(stats.stars_explored),
            uploads: patch.uploads.unwrap_or(stats.uploads),
            total_xp: patch.total_xp.unwrap_or(stats.total_xp),
        };
        Ok(*stats)
    }

    async fn advance_stats(
        &self,
        user_id: Uuid,
        target: UserStats,
        max_counter_step: i64,
        max_xp_step: i64,
    ) -> Result<Option<UserStats>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(current) = inner.stats.get_mut(&user_id) else {
            return Ok(None);
        };
        let within = |from: i64, to: i64, step: i64| from <= to && to - from <= step;
        let ok = within(current.analyses, target.analyses, max_counter_step)
            && within(current.discoveries, target.discoveries, max_counter_step)
            && within(current.stars_explored, target.stars_explored, max_counter_step)
            && within(current.uploads, target.uploads, max_counter_step)
            && within(current.total_xp, target.total_xp, max_xp_step);
        if !ok {
            return Ok(None);
        }
        *current = target;
        Ok(Some(target))
    }

    async fn increment_stats(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
    ) -> Result<UserStats, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let stats = inner.stats.entry(user_id).or_default();
        add_delta(stats, delta);
        Ok(*stats)
    }

    async fn list_achievements(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AchievementUnlock>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.achievements.get(&user_id).cloned().unwrap_or_default())
    }

    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement_id: &str,
    ) -> Result<Option<AchievementUnlock>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let unlocked = inner.achievements.entry(user_id).or_default();
        if unlocked.iter().any(|a| a.achievement_id == achievement_id) {
            return Ok(None);
        }
        let row = AchievementUnlock {
            achievement_id: achievement_id.to_string(),
            unlocked_at: OffsetDateTime::now_utc(),
        };
        unlocked.push(row.clone());
        Ok(Some(row))
    }

    async fn apply_progress(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
        awards: &[(&str, i64)],
    ) -> Result<ProgressApplied, StoreError> {
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut inner = self.inner.lock().unwrap();
        let now = OffsetDateTime::now_utc();

        let mut delta = delta;
        let mut unlocked = Vec::new();
        let rows = inner.achievements.entry(user_id).or_default();
        for (achievement_id, xp) in awards {
            if rows.iter().any(|a| a.achievement_id == *achievement_id) {
                continue;
            }
            rows.push(AchievementUnlock {
                achievement_id: achievement_id.to_string(),
                unlocked_at: now,
            });
            delta.xp += xp;
            unlocked.push(achievement_id.to_string());
        }

        let stats = inner.stats.entry(user_id).or_default();
        add_delta(stats, delta);
        Ok(ProgressApplied {
            stats: *stats,
            unlocked,
        })
    }
}
