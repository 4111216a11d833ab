use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::brands::dtos::BrandResponseDto;
use crate::features::brands::models::Brand;
use crate::features::categories::models::Category;
use crate::shared::multipart::MultipartForm;

/// Multipart body accepted by category create/update.
///
/// Documentation only; handlers read the form through [`MultipartForm`].
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct CategoryFormDto {
    /// Required on create
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    /// Image files (repeat the field for several images, up to 20)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Validate)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "nameRu is required (max 255 characters)"))]
    pub name_ru: String,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub description_ru: Option<String>,

    pub description_en: Option<String>,
}

impl CreateCategoryDto {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            name_ru: form.text("nameRu").unwrap_or_default(),
            name_en: form.text("nameEn"),
            description_ru: form.text("descriptionRu"),
            description_en: form.text("descriptionEn"),
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Validate)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "nameRu must be 1-255 characters"))]
    pub name_ru: Option<String>,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub description_ru: Option<String>,

    pub description_en: Option<String>,
}

impl UpdateCategoryDto {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            name_ru: form.text("nameRu"),
            name_en: form.text("nameEn"),
            description_ru: form.text("descriptionRu"),
            description_en: form.text("descriptionEn"),
        }
    }

    /// Merge the provided fields into `category`
    pub fn apply_to(self, category: &mut Category) {
        if let Some(name_ru) = self.name_ru {
            category.name_ru = name_ru;
        }
        if self.name_en.is_some() {
            category.name_en = self.name_en;
        }
        if self.description_ru.is_some() {
            category.description_ru = self.description_ru;
        }
        if self.description_en.is_some() {
            category.description_en = self.description_en;
        }
    }
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct CategoryResponseDto {
    pub id: i32,
    pub name_ru: String,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when brands were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<BrandResponseDto>>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name_ru: c.name_ru,
            name_en: c.name_en,
            description_ru: c.description_ru,
            description_en: c.description_en,
            images: c.images,
            created_at: c.created_at,
            updated_at: c.updated_at,
            brands: None,
        }
    }
}

impl CategoryResponseDto {
    /// Attach each category's brands, preserving the order of both lists
    pub fn with_brands(categories: Vec<Category>, brands: Vec<Brand>) -> Vec<Self> {
        let mut responses: Vec<Self> = categories.into_iter().map(Self::from).collect();
        for response in responses.iter_mut() {
            response.brands = Some(Vec::new());
        }

        for brand in brands {
            if let Some(owner) = responses.iter_mut().find(|c| c.id == brand.category_id) {
                if let Some(list) = owner.brands.as_mut() {
                    list.push(brand.into());
                }
            }
        }

        responses
    }
}
