use serde::{Deserialize, Serialize};

use crate::auth::{dashboard::Dashboard, repo_types::UserRecord};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub branch: Option<String>,
    pub usn: String,
    pub study_year: i32,
    pub role: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub role: String,
    pub study_year: i32,
    pub dashboard: Dashboard,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub full_name: String,
    pub username: String,
    pub branch: Option<String>,
    pub usn: String,
    pub study_year: i32,
    pub role: String,
    pub dashboard: Dashboard,
}

impl From<UserRecord> for PublicUser {
    fn from(u: UserRecord) -> Self {
        let dashboard = crate::auth::dashboard::derive_dashboard(&u.role, u.study_year);
        Self {
            email: u.email,
            full_name: u.full_name,
            username: u.username,
            branch: u.branch,
            usn: u.usn,
            study_year: u.study_year,
            role: u.role,
            dashboard,
        }
    }
}
