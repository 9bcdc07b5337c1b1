use crate::state::AppState;
use axum::Router;

pub mod directory;
mod handlers;

pub fn router() -> Router<AppState> {
    handlers::student_routes()
}
