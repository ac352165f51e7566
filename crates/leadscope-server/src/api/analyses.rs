//! POST /api/v1/analyses — submit a subject; GET /api/v1/analyses/{id} —
//! poll job status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use leadscope_core::{JobStatus, LeadProfile, Subject};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct AnalysisRequest {
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct AnalysisSubmitted {
    pub job_id: Uuid,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct AnalysisStatus {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: i16,
    pub result: Option<LeadProfile>,
    pub error: Option<String>,
}

pub(in crate::api) async fn submit_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AnalysisSubmitted>>), ApiError> {
    let subject = Subject::new(request.github.as_deref(), request.website.as_deref())
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let job = leadscope_db::create_job(&state.pool, &subject)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(job_id = %job.id, subject = %subject.cache_key(), "analysis job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: AnalysisSubmitted {
                job_id: job.id,
                status: JobStatus::Pending,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(in crate::api) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnalysisStatus>>, ApiError> {
    let job = match leadscope_db::get_job(&state.pool, job_id).await {
        Ok(job) => job,
        Err(leadscope_db::DbError::NotFound) => {
            return Err(ApiError::new(req_id.0, "not_found", "no such analysis job"));
        }
        Err(e) => return Err(map_db_error(req_id.0, &e)),
    };

    let status: JobStatus = job
        .status
        .parse()
        .map_err(|_| ApiError::new(req_id.0.clone(), "internal_error", "corrupt job status"))?;

    let result = job
        .result
        .map(serde_json::from_value::<LeadProfile>)
        .transpose()
        .map_err(|e| {
            tracing::error!(job_id = %job_id, error = %e, "stored lead profile failed to deserialize");
            ApiError::new(req_id.0.clone(), "internal_error", "corrupt job result")
        })?;

    Ok(Json(ApiResponse {
        data: AnalysisStatus {
            job_id: job.id,
            status,
            progress: job.progress,
            result,
            error: job.error_message,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
