use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{NewPurchase, PurchaseRecord};
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/purchases", get(list_purchases).post(add_purchase))
}

#[instrument(skip(state))]
pub async fn list_purchases(
    State(state): State<AppState>,
) -> Result<Json<Vec<PurchaseRecord>>, ApiError> {
    let rows = state
        .purchases
        .list_recent_first()
        .await
        .map_err(ApiError::FetchPurchases)?;
    Ok(Json(rows))
}

/// The body is read raw so that a malformed payload ends up as the same 500
/// as a store rejection rather than an extractor 4xx.
#[instrument(skip(state, body))]
pub async fn add_purchase(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<PurchaseRecord>>), ApiError> {
    let new = NewPurchase::from_body(&body)
        .map_err(|e| ApiError::AddPurchase(e.context("parse request body")))?;
    let rows = state
        .purchases
        .insert(&new)
        .await
        .map_err(ApiError::AddPurchase)?;
    info!(inserted = rows.len(), "purchase added");
    Ok((StatusCode::CREATED, Json(rows)))
}
