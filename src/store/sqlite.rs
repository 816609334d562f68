use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use crate::mastery::types::{InterventionState, SkillKey, SkillMasteryState};
use crate::progression::types::{Enrollment, EnrollmentStatus};
use crate::store::{StateStore, StoreError};

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS skill_priors (
        skill_id TEXT PRIMARY KEY NOT NULL,
        prior_mastery REAL NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mastery_states (
        student_id TEXT NOT NULL,
        skill_id TEXT NOT NULL,
        mastery REAL NOT NULL,
        velocity REAL NOT NULL,
        attempt_count INTEGER NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (student_id, skill_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS intervention_states (
        student_id TEXT NOT NULL,
        skill_id TEXT NOT NULL,
        active INTEGER NOT NULL,
        recovery_streak INTEGER NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (student_id, skill_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS enrollments (
        student_id TEXT NOT NULL,
        course_id TEXT NOT NULL,
        progress REAL NOT NULL,
        status TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (student_id, course_id)
    )
    "#,
];

#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is a separate database.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::info!(url, "sqlite state store ready");
        Ok(store)
    }

    pub async fn open_file(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("create {}: {e}", parent.display()))
            })?;
        }
        Self::connect(&format!("sqlite:{}?mode=rwc", path.display())).await
    }

    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mastery-engine")
            .join("state.db")
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn upsert_mastery<'c, E>(
    executor: E,
    key: &SkillKey,
    state: &SkillMasteryState,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO mastery_states (student_id, skill_id, mastery, velocity, attempt_count, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (student_id, skill_id) DO UPDATE SET
            mastery = excluded.mastery,
            velocity = excluded.velocity,
            attempt_count = excluded.attempt_count,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key.student_id.clone())
    .bind(key.skill_id.clone())
    .bind(state.mastery)
    .bind(state.velocity)
    .bind(i64::from(state.attempt_count))
    .bind(now_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn upsert_intervention<'c, E>(
    executor: E,
    key: &SkillKey,
    state: &InterventionState,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO intervention_states (student_id, skill_id, active, recovery_streak, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (student_id, skill_id) DO UPDATE SET
            active = excluded.active,
            recovery_streak = excluded.recovery_streak,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key.student_id.clone())
    .bind(key.skill_id.clone())
    .bind(state.active)
    .bind(i64::from(state.recovery_streak))
    .bind(now_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn upsert_enrollment<'c, E>(
    executor: E,
    student_id: &str,
    enrollment: &Enrollment,
) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO enrollments (student_id, course_id, progress, status, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (student_id, course_id) DO UPDATE SET
            progress = excluded.progress,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(student_id.to_string())
    .bind(enrollment.course_id.clone())
    .bind(enrollment.progress)
    .bind(enrollment.status.as_str())
    .bind(now_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

fn non_negative_u32(row: &SqliteRow, column: &'static str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        field: column,
        detail: value.to_string(),
    })
}

fn map_enrollment(row: &SqliteRow) -> Result<Enrollment, StoreError> {
    let status: String = row.try_get("status")?;
    let status = EnrollmentStatus::parse(&status).ok_or(StoreError::Corrupt {
        field: "status",
        detail: status.clone(),
    })?;
    Ok(Enrollment {
        course_id: row.try_get("course_id")?,
        progress: row.try_get("progress")?,
        status,
    })
}

#[async_trait]
impl StateStore for SqliteStateStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get_mastery_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<SkillMasteryState>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT mastery, velocity, attempt_count FROM mastery_states
            WHERE student_id = ?1 AND skill_id = ?2
            LIMIT 1
            "#,
        )
        .bind(key.student_id.as_str())
        .bind(key.skill_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<SkillMasteryState, StoreError> {
            Ok(SkillMasteryState {
                mastery: row.try_get("mastery")?,
                velocity: row.try_get("velocity")?,
                attempt_count: non_negative_u32(&row, "attempt_count")?,
            })
        })
        .transpose()
    }

    async fn put_mastery_state(
        &self,
        key: &SkillKey,
        state: &SkillMasteryState,
    ) -> Result<(), StoreError> {
        upsert_mastery(&self.pool, key, state).await?;
        Ok(())
    }

    async fn get_intervention_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<InterventionState>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT active, recovery_streak FROM intervention_states
            WHERE student_id = ?1 AND skill_id = ?2
            LIMIT 1
            "#,
        )
        .bind(key.student_id.as_str())
        .bind(key.skill_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<InterventionState, StoreError> {
            Ok(InterventionState {
                active: row.try_get("active")?,
                recovery_streak: non_negative_u32(&row, "recovery_streak")?,
            })
        })
        .transpose()
    }

    async fn put_intervention_state(
        &self,
        key: &SkillKey,
        state: &InterventionState,
    ) -> Result<(), StoreError> {
        upsert_intervention(&self.pool, key, state).await?;
        Ok(())
    }

    async fn get_skill_prior(&self, skill_id: &str) -> Result<Option<f64>, StoreError> {
        let prior: Option<f64> = sqlx::query_scalar(
            "SELECT prior_mastery FROM skill_priors WHERE skill_id = ?1 LIMIT 1",
        )
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(prior)
    }

    async fn put_skill_prior(&self, skill_id: &str, prior: f64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO skill_priors (skill_id, prior_mastery, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (skill_id) DO UPDATE SET
                prior_mastery = excluded.prior_mastery,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(skill_id)
        .bind(prior)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT course_id, progress, status FROM enrollments
            WHERE student_id = ?1
            ORDER BY course_id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_enrollment).collect()
    }

    async fn put_enrollment(
        &self,
        student_id: &str,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError> {
        upsert_enrollment(&self.pool, student_id, enrollment).await?;
        Ok(())
    }

    async fn commit_attempt(
        &self,
        key: &SkillKey,
        mastery: &SkillMasteryState,
        intervention: &InterventionState,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        upsert_mastery(&mut *tx, key, mastery).await?;
        upsert_intervention(&mut *tx, key, intervention).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_enrollments(
        &self,
        student_id: &str,
        enrollments: &[Enrollment],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for enrollment in enrollments {
            upsert_enrollment(&mut *tx, student_id, enrollment).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
