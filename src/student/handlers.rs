use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use super::directory::{usn_prefix, Schedule};
use crate::{error::AppError, state::AppState};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/student/notes-link/:branch", get(notes_link))
        .route("/student/schedule/:usn", get(schedule))
}

#[derive(Debug, Serialize)]
pub struct NotesLinkResponse {
    pub branch: String,
    pub message: String,
    pub notes_link: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub usn_prefix: String,
    pub message: String,
    pub schedule: Schedule,
}

#[instrument(skip(state))]
pub async fn notes_link(
    State(state): State<AppState>,
    Path(branch): Path<String>,
) -> Result<Json<NotesLinkResponse>, AppError> {
    let branch = branch.trim().to_uppercase();
    let link = state.directory.notes_link(&branch).ok_or_else(|| {
        AppError::NotFound(format!(
            "Notes link not found for branch: {branch}. Please contact the department."
        ))
    })?;

    Ok(Json(NotesLinkResponse {
        message: format!("Official Google Drive link for {branch} notes is provided below."),
        notes_link: link.to_string(),
        branch,
    }))
}

#[instrument(skip(state))]
pub async fn schedule(
    State(state): State<AppState>,
    Path(usn): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let prefix = usn_prefix(&usn)
        .ok_or_else(|| AppError::Invalid("USN is too short to identify a batch.".into()))?;

    let schedule = state.directory.schedule(&prefix).ok_or_else(|| {
        AppError::NotFound(format!(
            "Daily schedule not found for USN prefix: {prefix}. The timetable may not be released yet."
        ))
    })?;

    Ok(Json(ScheduleResponse {
        message: format!("Daily schedule for batch {prefix}:"),
        schedule: schedule.clone(),
        usn_prefix: prefix,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn notes_link_is_case_insensitive() {
        let state = AppState::in_memory();
        let Json(res) = notes_link(State(state), Path("csbs".into())).await.unwrap();
        assert_eq!(res.branch, "CSBS");
        assert!(res.notes_link.contains("CSBS"));
    }

    #[tokio::test]
    async fn unknown_branch_is_not_found() {
        let state = AppState::in_memory();
        let err = notes_link(State(state), Path("me".into())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("ME"));
    }

    #[tokio::test]
    async fn schedule_by_full_usn() {
        let state = AppState::in_memory();
        let Json(res) = schedule(State(state), Path("4CB23CS042".into())).await.unwrap();
        assert_eq!(res.usn_prefix, "4cb23cs");
        assert_eq!(res.schedule.len(), 3);
    }

    #[tokio::test]
    async fn schedule_errors() {
        let state = AppState::in_memory();
        let short = schedule(State(state.clone()), Path("4cb".into())).await.unwrap_err();
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);

        let missing = schedule(State(state), Path("4cb23ec001".into())).await.unwrap_err();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
