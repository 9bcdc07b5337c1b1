use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use crate::{
    auth::{jwt::AuthUser, policy::normalize_email, repo_types::UserRecord},
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/gemini-chat", post(chat))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Older clients still send this; it must match the bearer token.
    #[serde(default)]
    pub user_email: Option<String>,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub(crate) fn system_instruction(user: &UserRecord) -> String {
    let role = user
        .role()
        .map(|r| r.label().to_string())
        .unwrap_or_else(|| user.role.clone());
    let branch = user.branch.as_deref().unwrap_or("N/A");
    format!(
        "You are Campus GPT, a helpful AI assistant for a college in India. \
         Your user context is: User Role: {role}, Branch: {branch}, Year: {year}. \
         Be professional and concise. \
         If they ask for a PDF of notes, tell them to refer to the official Google Drive link \
         shared by their faculty/college, and offer to explain concepts instead.",
        year = user.study_year
    )
}

#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    AppJson(payload): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let Some(model) = state.chat.as_ref() else {
        return Err(AppError::Unavailable(
            "AI chat service is not configured.".into(),
        ));
    };

    if let Some(claimed) = payload.user_email.as_deref() {
        if normalize_email(claimed) != email {
            warn!(token_email = %email, "chat user_email does not match token");
            return Err(AppError::Forbidden(
                "user_email does not match the authenticated user.".into(),
            ));
        }
    }

    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::Invalid("Query must not be empty.".into()));
    }

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let reply = model
        .generate(query, &system_instruction(&user))
        .await
        .map_err(|e| {
            error!(error = ?e, "chat provider failed");
            AppError::Upstream("The AI service could not answer right now.".into())
        })?;

    Ok(Json(ChatResponse { response: reply }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::StatusCode;

    use super::*;
    use crate::{
        auth::repo_types::{Branch, NewUser, Role},
        chat::client::ChatModel,
    };

    #[derive(Default)]
    struct RecordingModel {
        seen: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn generate(&self, prompt: &str, system_instruction: &str) -> anyhow::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), system_instruction.to_string()));
            if self.fail {
                anyhow::bail!("quota exceeded for key AIza-secret");
            }
            Ok(format!("echo: {prompt}"))
        }
    }

    async fn state_with(model: Option<Arc<RecordingModel>>) -> AppState {
        let mut state = AppState::in_memory();
        state.chat = model.map(|m| m as Arc<dyn ChatModel>);
        state
            .users
            .insert(NewUser {
                email: "a@x.com".into(),
                full_name: "Asha Rao".into(),
                username: "stud1".into(),
                branch: Some(Branch::Ai),
                usn: "4cb23ai001".into(),
                study_year: 3,
                role: Role::Student,
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        state
    }

    fn request(query: &str, user_email: Option<&str>) -> AppJson<ChatRequest> {
        AppJson(ChatRequest {
            user_email: user_email.map(str::to_string),
            query: query.into(),
        })
    }

    #[tokio::test]
    async fn answers_with_user_context() {
        let model = Arc::new(RecordingModel::default());
        let state = state_with(Some(model.clone())).await;

        let Json(res) = chat(
            State(state),
            AuthUser("a@x.com".into()),
            request("  what is a B-tree? ", Some("A@X.com")),
        )
        .await
        .expect("chat");
        assert_eq!(res.response, "echo: what is a B-tree?");

        let seen = model.seen.lock().unwrap();
        let (_, system) = &seen[0];
        assert!(system.contains("User Role: Student, Branch: AI, Year: 3."));
        assert!(system.contains("Google Drive"));
    }

    #[tokio::test]
    async fn unconfigured_model_is_unavailable() {
        let state = state_with(None).await;
        let err = chat(State(state.clone()), AuthUser("a@x.com".into()), request("hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        // Reported before any request checks.
        for req in [request("   ", None), request("hi", Some("other@x.com"))] {
            let err = chat(State(state.clone()), AuthUser("a@x.com".into()), req)
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let state = state_with(Some(Arc::new(RecordingModel::default()))).await;
        let err = chat(State(state), AuthUser("ghost@x.com".into()), request("hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mismatched_user_email_is_forbidden() {
        let state = state_with(Some(Arc::new(RecordingModel::default()))).await;
        let err = chat(
            State(state),
            AuthUser("a@x.com".into()),
            request("hi", Some("someone.else@x.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn provider_failure_does_not_leak_details() {
        let model = Arc::new(RecordingModel {
            fail: true,
            ..Default::default()
        });
        let state = state_with(Some(model)).await;
        let err = chat(State(state), AuthUser("a@x.com".into()), request("hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("AIza"));
    }

    #[tokio::test]
    async fn blank_query_is_invalid() {
        let state = state_with(Some(Arc::new(RecordingModel::default()))).await;
        let err = chat(State(state), AuthUser("a@x.com".into()), request("   ", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
