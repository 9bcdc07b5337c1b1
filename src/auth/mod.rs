use crate::state::AppState;
use axum::Router;

pub mod dashboard;
mod dto;
pub mod handlers;
pub mod jwt;
mod password;
pub mod policy;
pub mod repo;
pub mod repo_types;
pub mod services;
mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
