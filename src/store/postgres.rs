use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    AccountStore, AchievementUnlock, NewUser, ProgressApplied, Session, StatsDelta, StatsPatch,
    StoreError, User, UserStats,
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, created_at, last_login, is_active";

const STATS_COLUMNS: &str = "analyses, discoveries, stars_explored, uploads, total_xp";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn increment_sql() -> String {
    format!(
        r#"
        INSERT INTO user_stats (user_id, analyses, discoveries, stars_explored, uploads, total_xp)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE
           SET analyses = user_stats.analyses + EXCLUDED.analyses,
               discoveries = user_stats.discoveries + EXCLUDED.discoveries,
               stars_explored = user_stats.stars_explored + EXCLUDED.stars_explored,
               uploads = user_stats.uploads + EXCLUDED.uploads,
               total_xp = user_stats.total_xp + EXCLUDED.total_xp,
               last_updated = NOW()
        RETURNING {STATS_COLUMNS}
        "#
    )
}

fn bind_delta<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, UserStats, sqlx::postgres::PgArguments>,
    user_id: Uuid,
    delta: StatsDelta,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, UserStats, sqlx::postgres::PgArguments> {
    query
        .bind(user_id)
        .bind(delta.analyses)
        .bind(delta.discoveries)
        .bind(delta.stars_explored)
        .bind(delta.uploads)
        .bind(delta.xp)
}

fn conflict_or_db(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 LIMIT 1"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or_db)?;

        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn find_active_for_login(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE (username = $1 OR email = $2) AND is_active
            LIMIT 1
            "#
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_sessions (user_id, session_token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING user_id, session_token, created_at, expires_at, is_active
            "#,
        )
        .bind(user_id)
        .bind(Uuid::new_v4())
        .bind(expires_at)
        .fetch_one(&self.db)
        .await?;
        Ok(session)
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT user_id, session_token, created_at, expires_at, is_active
            FROM user_sessions
            WHERE session_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(session)
    }

    async fn deactivate_session(&self, token: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE WHERE session_token = $1 AND is_active",
        )
        .bind(token)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_or_create_stats(&self, user_id: Uuid) -> Result<UserStats, StoreError> {
        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        let stats = sqlx::query_as::<_, UserStats>(&format!(
            "SELECT {STATS_COLUMNS} FROM user_stats WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    async fn overwrite_stats(
        &self,
        user_id: Uuid,
        patch: StatsPatch,
    ) -> Result<UserStats, StoreError> {
        let stats = sqlx::query_as::<_, UserStats>(&format!(
            r#"
            INSERT INTO user_stats (user_id, analyses, discoveries, stars_explored, uploads, total_xp)
            VALUES ($1, COALESCE($2, 0), COALESCE($3, 0), COALESCE($4, 0),
                    COALESCE($5, 0), COALESCE($6, 0))
            ON CONFLICT (user_id) DO UPDATE
               SET analyses = COALESCE($2, user_stats.analyses),
                   discoveries = COALESCE($3, user_stats.discoveries),
                   stars_explored = COALESCE($4, user_stats.stars_explored),
                   uploads = COALESCE($5, user_stats.uploads),
                   total_xp = COALESCE($6, user_stats.total_xp),
                   last_updated = NOW()
            RETURNING {STATS_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(patch.analyses)
        .bind(patch.discoveries)
        .bind(patch.stars_explored)
        .bind(patch.uploads)
        .bind(patch.total_xp)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    async fn advance_stats(
        &self,
        user_id: Uuid,
        target: UserStats,
        max_counter_step: i64,
        max_xp_step: i64,
    ) -> Result<Option<UserStats>, StoreError> {
        // The guard and the write are one statement, so concurrent writers
        // cannot slip a decrease past it.
        let stats = sqlx::query_as::<_, UserStats>(&format!(
            r#"
            UPDATE user_stats
               SET analyses = $2, discoveries = $3, stars_explored = $4,
                   uploads = $5, total_xp = $6, last_updated = NOW()
             WHERE user_id = $1
               AND analyses <= $2 AND $2 - analyses <= $7
               AND discoveries <= $3 AND $3 - discoveries <= $7
               AND stars_explored <= $4 AND $4 - stars_explored <= $7
               AND uploads <= $5 AND $5 - uploads <= $7
               AND total_xp <= $6 AND $6 - total_xp <= $8
            RETURNING {STATS_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(target.analyses)
        .bind(target.discoveries)
        .bind(target.stars_explored)
        .bind(target.uploads)
        .bind(target.total_xp)
        .bind(max_counter_step)
        .bind(max_xp_step)
        .fetch_optional(&self.db)
        .await?;
        Ok(stats)
    }

    async fn increment_stats(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
    ) -> Result<UserStats, StoreError> {
        let stats = bind_delta(sqlx::query_as::<_, UserStats>(&increment_sql()), user_id, delta)
            .fetch_one(&self.db)
            .await?;
        Ok(stats)
    }

    async fn list_achievements(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AchievementUnlock>, StoreError> {
        let rows = sqlx::query_as::<_, AchievementUnlock>(
            r#"
            SELECT achievement_id, unlocked_at
            FROM user_achievements
            WHERE user_id = $1
            ORDER BY unlocked_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn unlock_achievement(
        &self,
        user_id: Uuid,
        achievement_id: &str,
    ) -> Result<Option<AchievementUnlock>, StoreError> {
        let row = sqlx::query_as::<_, AchievementUnlock>(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            RETURNING achievement_id, unlocked_at
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn apply_progress(
        &self,
        user_id: Uuid,
        delta: StatsDelta,
        awards: &[(&str, i64)],
    ) -> Result<ProgressApplied, StoreError> {
        let mut tx = self.db.begin().await?;

        let mut delta = delta;
        let mut unlocked = Vec::new();
        for (achievement_id, xp) in awards {
            let inserted = sqlx::query_scalar::<_, String>(
                r#"
                INSERT INTO user_achievements (user_id, achievement_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, achievement_id) DO NOTHING
                RETURNING achievement_id
                "#,
            )
            .bind(user_id)
            .bind(*achievement_id)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(id) = inserted {
                delta.xp += xp;
                unlocked.push(id);
            }
        }

        let stats = bind_delta(sqlx::query_as::<_, UserStats>(&increment_sql()), user_id, delta)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ProgressApplied { stats, unlocked })
    }
}
