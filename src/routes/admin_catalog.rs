use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::catalog_dto::{
        grade_options, CreateSubjectPayload, CreateUnitPayload, UnitListQuery,
        UpdateSubjectPayload, UpdateUnitPayload,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.list_subjects().await?))
}

#[axum::debug_handler]
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.get_subject(id).await?))
}

#[axum::debug_handler]
pub async fn create_subject(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubjectPayload>,
) -> Result<impl IntoResponse> {
    let subject = state.catalog_service.create_subject(payload).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[axum::debug_handler]
pub async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubjectPayload>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.update_subject(id, payload).await?))
}

#[axum::debug_handler]
pub async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<UnitListQuery>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.list_units(&query).await?))
}

#[axum::debug_handler]
pub async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.get_unit(id).await?))
}

#[axum::debug_handler]
pub async fn create_unit(
    State(state): State<AppState>,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse> {
    let unit = state.catalog_service.create_unit(payload).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[axum::debug_handler]
pub async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUnitPayload>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.catalog_service.update_unit(id, payload).await?))
}

pub async fn list_grades() -> impl IntoResponse {
    Json(grade_options())
}
