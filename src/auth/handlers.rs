use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, PublicUser, RefreshRequest, RegisterRequest,
            RegisterResponse, TokenResponse,
        },
        jwt::{AuthUser, JwtKeys},
        services::IdentityService,
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip_all)]
pub async fn register(
    State(identity): State<IdentityService>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = identity.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful!".into(),
            username: user.username,
            email: user.email,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(identity): State<IdentityService>,
    State(keys): State<JwtKeys>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = identity.login(&payload.email, &payload.password).await?;
    let tokens = keys.issue_pair(&outcome.user.email)?;

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        role: outcome.user.role,
        study_year: outcome.user.study_year,
        dashboard: outcome.dashboard,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer",
    }))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(identity): State<IdentityService>,
    State(keys): State<JwtKeys>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".into()))?;

    if identity.find_user(&claims.sub).await?.is_none() {
        warn!(email = %claims.sub, "refresh for missing user");
        return Err(AppError::Unauthorized("User not found".into()));
    }

    let tokens = keys.issue_pair(&claims.sub)?;
    Ok(Json(TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer",
    }))
}

#[instrument(skip_all)]
pub async fn get_me(
    State(identity): State<IdentityService>,
    AuthUser(email): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = identity
        .find_user(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(PublicUser::from(user)))
}
