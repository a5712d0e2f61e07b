use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::{
    dto::catalog_dto::{
        CreateQuestionPayload, QuestionListQuery, QuestionResponse, UpdateQuestionPayload,
    },
    error::{Error, Result},
    utils::time,
    AppState,
};

const IMPORT_FIELD: &str = "file";

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter()?;
    let page = state
        .catalog_service
        .list_questions(&filter, query.page)
        .await?;
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let question = state.catalog_service.get_question(id).await?;
    Ok(Json(QuestionResponse::from(question)))
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = state.catalog_service.create_question(payload).await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = state.catalog_service.update_question(id, payload).await?;
    Ok(Json(QuestionResponse::from(question)))
}

#[axum::debug_handler]
pub async fn discard_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.catalog_service.discard_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn restore_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let question = state.catalog_service.restore_question(id).await?;
    Ok(Json(QuestionResponse::from(question)))
}

#[axum::debug_handler]
pub async fn export_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter()?;
    let bytes = state.csv_service.export(&filter).await?;
    let file_name = format!(
        "questions_{}.csv",
        time::local_date_stamp(time::now(), state.utc_offset_hours)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}

#[axum::debug_handler]
pub async fn import_questions(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMPORT_FIELD) {
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let data = upload.ok_or_else(|| {
        Error::BadRequest(format!("multipart field '{}' is required", IMPORT_FIELD))
    })?;

    let result = state.csv_service.import(&data).await?;
    let status = if result.is_clean() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(result)))
}
