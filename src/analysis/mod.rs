pub mod gemini;
mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

#[cfg(test)]
pub(crate) use handlers::MAX_UPLOAD_BYTES;
pub use services::AnalysisError;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
