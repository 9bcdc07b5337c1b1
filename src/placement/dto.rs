use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::JobPost;

#[derive(Debug, Deserialize)]
pub struct JobPostRequest {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub eligibility_branch: String,
    #[serde(default)]
    pub application_link: String,
}

#[derive(Debug, Serialize)]
pub struct JobCreatedResponse {
    pub message: String,
    pub id: Uuid,
}

/// Either `jobs` or, when there are none, a `message`.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<JobPost>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
