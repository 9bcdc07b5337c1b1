use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::placement_routes()
}
