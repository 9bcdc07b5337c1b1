use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{
        dashboard::{derive_dashboard, Dashboard},
        dto::RegisterRequest,
        password::{hash_password, verify_password},
        policy::{normalize_email, AccessPolicy},
        repo::{InsertError, UserStore},
        repo_types::{NewUser, UserRecord},
        validation::{validate_registration, UsnRules},
    },
    error::AppError,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Registration and login rules on top of a [`UserStore`].
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    policy: Arc<AccessPolicy>,
    rules: UsnRules,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub dashboard: Dashboard,
}

impl FromRef<AppState> for IdentityService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.policy.clone(),
            UsnRules {
                prefix: state.config.identity.usn_prefix.clone(),
                mode: state.config.identity.usn_validation,
            },
        )
    }
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, policy: Arc<AccessPolicy>, rules: UsnRules) -> Self {
        Self {
            users,
            policy,
            rules,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserRecord, AppError> {
        let email = normalize_email(&req.email);

        if let Err(e) = self.policy.check_allowed(&email) {
            warn!(email = %email, "registration rejected by whitelist");
            return Err(e);
        }
        self.policy
            .check_binding(&email, &req.role, req.branch.as_deref())?;

        let valid = validate_registration(&req, &self.rules)?;

        if let Some(field) = self
            .users
            .find_conflict(&valid.email, &valid.username, &valid.usn)
            .await?
        {
            warn!(email = %valid.email, ?field, "registration conflict");
            return Err(AppError::Conflict(field));
        }

        let password_hash = hash_blocking(req.password).await?;

        let new_user = NewUser {
            email: valid.email,
            full_name: valid.full_name,
            username: valid.username,
            branch: valid.branch,
            usn: valid.usn,
            study_year: valid.study_year,
            role: valid.role,
            password_hash,
        };

        match self.users.insert(new_user).await {
            Ok(user) => {
                info!(email = %user.email, role = %user.role, "user registered");
                Ok(user)
            }
            // Lost a race with a concurrent registration after the pre-check.
            Err(InsertError::Conflict(field)) => {
                warn!(?field, "registration conflict on insert");
                Err(AppError::Conflict(field))
            }
            Err(InsertError::Store(e)) => Err(AppError::Internal(e)),
        }
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = normalize_email(email);
        self.policy.check_allowed(&email)?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            warn!(email = %email, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let dashboard = derive_dashboard(&user.role, user.study_year);
        info!(email = %user.email, dashboard = dashboard.as_str(), "user logged in");
        Ok(LoginOutcome { user, dashboard })
    }

    pub async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.find_by_email(&normalize_email(email)).await?)
    }
}

async fn hash_blocking(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hash task panicked")?
}

async fn verify_blocking(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("verify task panicked")?
}
