pub mod catalog_dto;
pub mod dashboard_dto;
pub mod import_dto;
pub mod test_sheet_dto;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            ((total as f64) / (per_page as f64)).ceil() as i64
        } else {
            1
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// 1-based page number and the matching SQL offset.
pub fn page_window(page: Option<i64>, per_page: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, (page - 1) * per_page)
}

// Trims strings and turns empty ones into None.
pub(crate) fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
