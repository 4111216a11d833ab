use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name_ru: String,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub const COLUMNS: &'static str =
        "id, name_ru, name_en, description_ru, description_en, images, created_at, updated_at";
}
