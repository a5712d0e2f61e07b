pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod wizard;

use crate::services::{
    catalog_service::CatalogService, dashboard_service::DashboardService,
    inventory_service::InventoryService, question_csv_service::QuestionCsvService,
    test_sheet_service::TestSheetService,
};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub test_sheet_service: TestSheetService,
    pub csv_service: QuestionCsvService,
    pub dashboard_service: DashboardService,
    /// Local time offset used for download file names.
    pub utc_offset_hours: i32,
}

impl AppState {
    pub fn new(pool: SqlitePool, utc_offset_hours: i32) -> Self {
        Self {
            catalog_service: CatalogService::new(pool.clone()),
            inventory_service: InventoryService::new(pool.clone()),
            test_sheet_service: TestSheetService::new(pool.clone()),
            csv_service: QuestionCsvService::new(pool.clone()),
            dashboard_service: DashboardService::new(pool.clone()),
            pool,
            utc_offset_hours,
        }
    }
}
