use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::{json, Map, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("問が不足しています。利用可能: {available}問、要求: {requested}問")]
    InsufficientQuestions { available: i64, requested: i64 },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Unauthorized(msg) => {
                let body = Json(json!({ "error": msg }));
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"admin\"")],
                    body,
                )
                    .into_response();
            }
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::InsufficientQuestions {
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": Error::InsufficientQuestions { available, requested }.to_string(),
                    "available": available,
                    "requested": requested,
                }),
            ),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_failed", "fields": field_messages(&err) }),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Csv(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn field_messages(err: &validator::ValidationErrors) -> JsonValue {
    let mut fields = Map::new();
    for (field, errors) in err.field_errors() {
        let messages: Vec<JsonValue> = errors
            .iter()
            .map(|e| {
                let text = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                JsonValue::String(text)
            })
            .collect();
        fields.insert(field.to_string(), JsonValue::Array(messages));
    }
    JsonValue::Object(fields)
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
