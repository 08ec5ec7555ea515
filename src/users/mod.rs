use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;
pub mod services;
pub mod verification;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
