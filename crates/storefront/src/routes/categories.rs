//! Category route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use dharma_core::api::CategoryListResponse;

use crate::error::Result;
use crate::state::AppState;

/// List every category for the filter sidebar.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<CategoryListResponse>> {
    let category = state.catalog().categories().await?;
    Ok(Json(CategoryListResponse {
        success: true,
        category,
    }))
}
