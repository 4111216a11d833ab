use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for brand
#[derive(Debug, Clone, FromRow)]
pub struct Brand {
    pub id: i32,
    pub name: String,
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    pub images: Vec<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    pub const COLUMNS: &'static str =
        "id, name, name_ru, name_en, images, category_id, created_at, updated_at";
}
