use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const FALLBACK_COLOR: &str = "#6B7280";

const DEFAULT_COLORS: [(&str, &str); 5] = [
    ("英語", "#EF4444"),
    ("数学", "#3B82F6"),
    ("国語", "#10B981"),
    ("理科", "#8B5CF6"),
    ("社会", "#F59E0B"),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub color_code: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    pub fn default_color_for(name: &str) -> &'static str {
        DEFAULT_COLORS
            .iter()
            .find(|(subject, _)| *subject == name)
            .map(|(_, color)| *color)
            .unwrap_or(FALLBACK_COLOR)
    }
}
