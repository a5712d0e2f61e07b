use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::{error::Result, AppState};

#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.dashboard_service.stats().await?;
    Ok(Json(stats))
}
