use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for product
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i32,
    pub name_ru: String,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    pub images: Vec<String>,
    pub brand_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub const COLUMNS: &'static str = "id, name_ru, name_en, description_ru, description_en, \
                                       images, brand_id, created_at, updated_at";
}
