use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::services::{classify_image, AnalysisError};
use crate::{error::ApiError, state::AppState};

pub(crate) const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze-image", post(analyze_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /analyze-image (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn analyze_image(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let mp = mp.map_err(|e| {
        warn!(error = %e, "not a multipart body");
        ApiError::NoFilePart
    })?;
    let bytes = read_file_part(mp).await?;
    let classification = classify_image(&*state.vision, bytes).await?;
    info!(object_name = ?classification.get("object_name"), "image classified");
    Ok(Json(classification))
}

/// Only a part named `file` that carries a filename counts as an upload.
async fn read_file_part(mut mp: Multipart) -> Result<Bytes, ApiError> {
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::NoFilePart),
            Err(e) if over_limit(&e) => return Err(upload_too_large()),
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(ApiError::NoFilePart);
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        match field.file_name() {
            None => continue,
            Some("") => return Err(ApiError::NoSelectedFile),
            Some(_) => {}
        }
        return field.bytes().await.map_err(|e| -> ApiError {
            if over_limit(&e) {
                upload_too_large()
            } else {
                AnalysisError::Read(e.into()).into()
            }
        });
    }
}

fn over_limit(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn upload_too_large() -> ApiError {
    warn!(limit = MAX_UPLOAD_BYTES, "upload hit the body limit");
    AnalysisError::TooLarge {
        limit: MAX_UPLOAD_BYTES,
    }
    .into()
}
