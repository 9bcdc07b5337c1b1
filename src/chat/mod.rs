use crate::state::AppState;
use axum::Router;

pub mod client;
mod handlers;

pub fn router() -> Router<AppState> {
    handlers::chat_routes()
}
