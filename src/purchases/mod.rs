pub mod dto;
mod handlers;
pub mod repo;
pub mod rest;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
