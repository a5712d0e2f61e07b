pub mod catalog_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod question_csv_service;
pub mod test_sheet_service;

#[cfg(test)]
pub mod test_support;
