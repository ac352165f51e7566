//! Synchronous scoring endpoints and the persisted-lead listing.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadscope_core::{LeadProfile, Scoring};
use leadscope_enrich::{categorize, score_lead};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Re-scores an already-fetched profile without re-running any stage.
pub(in crate::api) async fn score_profile(
    Extension(req_id): Extension<RequestId>,
    Json(profile): Json<LeadProfile>,
) -> Json<ApiResponse<Scoring>> {
    let scoring = score_lead(&profile, Utc::now());
    Json(ApiResponse {
        data: scoring,
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CategorizedLeads {
    pub hot: Vec<LeadProfile>,
    pub warm: Vec<LeadProfile>,
    pub cold: Vec<LeadProfile>,
}

/// Scores a batch of profiles and partitions them into hot/warm/cold.
pub(in crate::api) async fn categorize_profiles(
    Extension(req_id): Extension<RequestId>,
    Json(profiles): Json<Vec<LeadProfile>>,
) -> Json<ApiResponse<CategorizedLeads>> {
    let partitioned = categorize(profiles, Utc::now());
    Json(ApiResponse {
        data: CategorizedLeads {
            hot: partitioned.hot,
            warm: partitioned.warm,
            cold: partitioned.cold,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ListLeadsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct LeadSummaryItem {
    pub id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub source: String,
    pub score: f64,
    pub grade: String,
    pub priority: String,
    pub confidence: f64,
    pub analyzed_at: DateTime<Utc>,
}

pub(in crate::api) async fn list_leads(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<ApiResponse<Vec<LeadSummaryItem>>>, ApiError> {
    let rows = leadscope_db::list_leads(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| LeadSummaryItem {
            id: row.public_id,
            name: row.name,
            domain: row.domain,
            source: row.source,
            score: row.score,
            grade: row.grade,
            priority: row.priority,
            confidence: row.confidence,
            analyzed_at: row.analyzed_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
