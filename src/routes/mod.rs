pub mod admin_catalog;
pub mod admin_dashboard;
pub mod admin_questions;
pub mod health;
pub mod test_sheets;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::auth::{require_admin, AdminCredentials};
use crate::middleware::rate_limit::{rps_middleware, RateLimiter};
use crate::AppState;

const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub admin: AdminCredentials,
    pub kiosk_rps: u32,
    pub request_timeout: Duration,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin: AdminCredentials::new(&config.admin_username, &config.admin_password),
            kiosk_rps: config.kiosk_rps,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub fn router(state: AppState, settings: RouterSettings) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let kiosk_api = Router::new()
        .route("/api/subjects", get(test_sheets::list_subjects))
        .route(
            "/api/subjects/:id/units",
            get(test_sheets::list_units_for_subject),
        )
        .route(
            "/api/test_sheets",
            get(test_sheets::list_test_sheets).post(test_sheets::create_test_sheet),
        )
        .route(
            "/api/test_sheets/units_by_subject",
            get(test_sheets::units_by_subject),
        )
        .route(
            "/api/test_sheets/available_questions",
            get(test_sheets::available_questions),
        )
        .route("/api/test_sheets/history", get(test_sheets::history))
        .route("/api/test_sheets/:id", get(test_sheets::get_test_sheet))
        .route(
            "/api/test_sheets/:id/mark_printed",
            post(test_sheets::mark_printed),
        )
        .layer(from_fn_with_state(
            RateLimiter::new(settings.kiosk_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/subjects",
            get(admin_catalog::list_subjects).post(admin_catalog::create_subject),
        )
        .route(
            "/api/admin/subjects/:id",
            get(admin_catalog::get_subject).patch(admin_catalog::update_subject),
        )
        .route(
            "/api/admin/units",
            get(admin_catalog::list_units).post(admin_catalog::create_unit),
        )
        .route(
            "/api/admin/units/:id",
            get(admin_catalog::get_unit).patch(admin_catalog::update_unit),
        )
        .route("/api/admin/grades", get(admin_catalog::list_grades))
        .route(
            "/api/admin/questions",
            get(admin_questions::list_questions).post(admin_questions::create_question),
        )
        .route(
            "/api/admin/questions/export",
            get(admin_questions::export_questions),
        )
        .route(
            "/api/admin/questions/import",
            post(admin_questions::import_questions),
        )
        .route(
            "/api/admin/questions/:id",
            get(admin_questions::get_question)
                .patch(admin_questions::update_question)
                .delete(admin_questions::discard_question),
        )
        .route(
            "/api/admin/questions/:id/restore",
            post(admin_questions::restore_question),
        )
        .route(
            "/api/admin/test_sheets/:id",
            axum::routing::delete(test_sheets::discard_test_sheet),
        )
        .route("/api/admin/dashboard", get(admin_dashboard::dashboard))
        .layer(from_fn_with_state(settings.admin.clone(), require_admin));

    base_routes
        .merge(kiosk_api)
        .merge(admin_api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(TraceLayer::new_for_http())
}
