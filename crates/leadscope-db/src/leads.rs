//! Database operations for persisted, queryable leads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use leadscope_core::LeadProfile;

use crate::DbError;

/// A row from the `leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRow {
    pub id: i64,
    pub public_id: Uuid,
    pub subject_key: String,
    pub name: String,
    pub domain: Option<String>,
    pub source: String,
    pub score: f64,
    pub grade: String,
    pub priority: String,
    pub confidence: f64,
    pub repository_data: Option<serde_json::Value>,
    pub technology_data: Option<serde_json::Value>,
    pub contact_data: Option<serde_json::Value>,
    pub company_data: Option<serde_json::Value>,
    pub scoring_data: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const LEAD_COLUMNS: &str = "id, public_id, subject_key, name, domain, source, score, grade, \
                            priority, confidence, repository_data, technology_data, \
                            contact_data, company_data, scoring_data, analyzed_at, \
                            created_at, updated_at";

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, DbError> {
    Ok(serde_json::to_value(value)?)
}

/// Inserts or refreshes the lead row for a subject.
///
/// Conflicts on `subject_key` replace the analysis in place — the lead a
/// subject maps to is the most recent completed run.
///
/// # Errors
///
/// Returns [`DbError::Json`] if a sub-profile cannot be serialized,
/// [`DbError::UnscoredLead`] if the profile carries no scoring, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_lead(
    pool: &PgPool,
    subject_key: &str,
    profile: &LeadProfile,
) -> Result<LeadRow, DbError> {
    let scoring = profile.scoring.as_ref().ok_or(DbError::UnscoredLead)?;

    let domain = profile
        .company
        .as_ref()
        .map(|c| c.domain.clone())
        .or_else(|| profile.metadata.url.clone());

    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "INSERT INTO leads (public_id, subject_key, name, domain, source, score, grade, \
                            priority, confidence, repository_data, technology_data, \
                            contact_data, company_data, scoring_data, analyzed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (subject_key) DO UPDATE SET \
             name            = EXCLUDED.name, \
             domain          = EXCLUDED.domain, \
             source          = EXCLUDED.source, \
             score           = EXCLUDED.score, \
             grade           = EXCLUDED.grade, \
             priority        = EXCLUDED.priority, \
             confidence      = EXCLUDED.confidence, \
             repository_data = EXCLUDED.repository_data, \
             technology_data = EXCLUDED.technology_data, \
             contact_data    = EXCLUDED.contact_data, \
             company_data    = EXCLUDED.company_data, \
             scoring_data    = EXCLUDED.scoring_data, \
             analyzed_at     = EXCLUDED.analyzed_at, \
             updated_at      = NOW() \
         RETURNING {LEAD_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(subject_key)
    .bind(profile.display_name())
    .bind(domain)
    .bind(profile.metadata.source.to_string())
    .bind(scoring.total_score)
    .bind(scoring.grade.as_str())
    .bind(scoring.priority.as_str())
    .bind(scoring.confidence)
    .bind(profile.repository.as_ref().map(to_json).transpose()?)
    .bind(profile.technology.as_ref().map(to_json).transpose()?)
    .bind(profile.contact.as_ref().map(to_json).transpose()?)
    .bind(profile.company.as_ref().map(to_json).transpose()?)
    .bind(to_json(scoring)?)
    .bind(profile.metadata.analyzed_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns up to `limit` leads ordered by score descending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_leads(pool: &PgPool, limit: i64) -> Result<Vec<LeadRow>, DbError> {
    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads ORDER BY score DESC, id LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches the lead for a normalized subject key, if one has been analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_lead_by_key(pool: &PgPool, subject_key: &str) -> Result<Option<LeadRow>, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE subject_key = $1"
    ))
    .bind(subject_key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
