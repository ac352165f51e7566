//! Database operations for the `analysis_jobs` queue table.
//!
//! Status transitions are guarded in SQL (`WHERE ... AND status = ...`),
//! so a lost race or a stale caller surfaces as
//! [`DbError::InvalidJobTransition`] instead of silently clobbering
//! another worker's writes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use leadscope_core::Subject;

use crate::DbError;

/// A row from the `analysis_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub github_repo: Option<String>,
    pub website: Option<String>,
    pub status: String,
    pub progress: i16,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

const JOB_COLUMNS: &str = "id, github_repo, website, status, progress, result, \
                           error_message, created_at, updated_at, started_at, completed_at";

/// Enqueues a new job in `pending` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_job(pool: &PgPool, subject: &Subject) -> Result<JobRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, JobRow>(&format!(
        "INSERT INTO analysis_jobs (id, github_repo, website) \
         VALUES ($1, $2, $3) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(id)
    .bind(subject.github.as_ref().map(ToString::to_string))
    .bind(subject.website.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Claims the oldest runnable job for this worker, flipping it to
/// `processing`, and returns it. Returns `Ok(None)` when the queue is empty.
///
/// Runnable means `pending`, or `processing` with a heartbeat older than
/// `stale_after_secs` — a previous worker died mid-job and the row is
/// re-delivered (at-least-once semantics). `FOR UPDATE SKIP LOCKED` lets
/// concurrent workers claim without blocking each other.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the claim query fails.
pub async fn claim_next_job(
    pool: &PgPool,
    stale_after_secs: u64,
) -> Result<Option<JobRow>, DbError> {
    #[allow(clippy::cast_precision_loss)]
    let stale_secs = stale_after_secs as f64;

    let row = sqlx::query_as::<_, JobRow>(&format!(
        "UPDATE analysis_jobs \
         SET status = 'processing', started_at = COALESCE(started_at, NOW()), updated_at = NOW() \
         WHERE id = ( \
             SELECT id FROM analysis_jobs \
             WHERE status = 'pending' \
                OR (status = 'processing' AND updated_at < NOW() - make_interval(secs => $1)) \
             ORDER BY created_at \
             FOR UPDATE SKIP LOCKED \
             LIMIT 1 \
         ) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(stale_secs)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Records a progress checkpoint and refreshes the claim heartbeat.
///
/// Progress never moves backwards: the update keeps the larger of the
/// stored and supplied values.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not in
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn update_job_progress(pool: &PgPool, id: Uuid, progress: u8) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE analysis_jobs \
         SET progress = GREATEST(progress, $1), updated_at = NOW() \
         WHERE id = $2 AND status = 'processing'",
    )
    .bind(i16::from(progress.min(100)))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Marks a job `completed`, storing the final lead profile and setting
/// progress to 100.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not in
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_job(
    pool: &PgPool,
    id: Uuid,
    result: &serde_json::Value,
) -> Result<(), DbError> {
    let outcome = sqlx::query(
        "UPDATE analysis_jobs \
         SET status = 'completed', progress = 100, result = $1, \
             completed_at = NOW(), updated_at = NOW() \
         WHERE id = $2 AND status = 'processing'",
    )
    .bind(result)
    .bind(id)
    .execute(pool)
    .await?;

    if outcome.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Marks a job `failed` with a human-readable reason.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not in
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_job(pool: &PgPool, id: Uuid, error_message: &str) -> Result<(), DbError> {
    let outcome = sqlx::query(
        "UPDATE analysis_jobs \
         SET status = 'failed', error_message = $1, \
             completed_at = NOW(), updated_at = NOW() \
         WHERE id = $2 AND status = 'processing'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if outcome.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Fetches a single job by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<JobRow, DbError> {
    let row = sqlx::query_as::<_, JobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
