use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::analysis::AnalysisError;

/// Every handler failure funnels through here. The caller only ever sees
/// the fixed message for the variant; the source goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to fetch purchases from the database.")]
    FetchPurchases(#[source] anyhow::Error),

    #[error("Failed to add purchase. Ensure all fields are correct.")]
    AddPurchase(#[source] anyhow::Error),

    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("AI model returned an invalid data format.")]
    Analysis(#[source] AnalysisError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoFilePart | Self::NoSelectedFile => StatusCode::BAD_REQUEST,
            Self::FetchPurchases(_) | Self::AddPurchase(_) | Self::Analysis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self::Analysis(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::FetchPurchases(e) => error!(error = ?e, "error fetching purchases"),
            Self::AddPurchase(e) => error!(error = ?e, "error adding purchase"),
            Self::Analysis(e) => error!(error = %e, "error during AI analysis or data validation"),
            Self::NoFilePart | Self::NoSelectedFile => warn!(reason = %self, "rejected upload"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
