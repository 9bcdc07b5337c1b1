use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{JobCreatedResponse, JobListResponse, JobPostRequest},
    repo::NewJobPost,
};
use crate::{
    auth::{jwt::AuthUser, repo_types::Role},
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn placement_routes() -> Router<AppState> {
    Router::new()
        .route("/placement/jobs", get(list_jobs))
        .route("/placement/upload-job", post(upload_job))
}

#[instrument(skip_all)]
pub async fn upload_job(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    AppJson(payload): AppJson<JobPostRequest>,
) -> Result<(StatusCode, Json<JobCreatedResponse>), AppError> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    if user.role() != Some(Role::PlacementCell) {
        warn!(email = %email, role = %user.role, "job upload by non placement user");
        return Err(AppError::Forbidden(
            "Only the placement cell can upload job posts.".into(),
        ));
    }

    let title = payload.title.trim().to_string();
    let company = payload.company.trim().to_string();
    if title.is_empty() || company.is_empty() {
        return Err(AppError::Invalid("Job title and company are required.".into()));
    }

    let job = state
        .jobs
        .insert(NewJobPost {
            title,
            company,
            description: payload.description,
            eligibility_branch: payload.eligibility_branch.trim().to_uppercase(),
            application_link: payload.application_link.trim().to_string(),
            posted_by: user.email,
        })
        .await?;

    info!(job_id = %job.id, company = %job.company, "job post uploaded");
    Ok((
        StatusCode::CREATED,
        Json(JobCreatedResponse {
            message: format!("Job Post for {} uploaded successfully.", job.company),
            id: job.id,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<JobListResponse>, AppError> {
    let jobs = state.jobs.list().await?;
    if jobs.is_empty() {
        return Ok(Json(JobListResponse {
            jobs: None,
            message: Some("No job posts are currently available.".into()),
        }));
    }
    Ok(Json(JobListResponse {
        jobs: Some(jobs),
        message: None,
    }))
}
