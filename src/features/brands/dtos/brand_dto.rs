use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::brands::models::Brand;
use crate::features::categories::dtos::CategoryResponseDto;
use crate::features::categories::models::Category;
use crate::features::products::dtos::ProductResponseDto;
use crate::features::products::models::Product;
use crate::shared::multipart::MultipartForm;

/// Multipart body accepted by brand create/update (documentation only)
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct BrandFormDto {
    /// Unique brand name, required on create
    pub name: Option<String>,
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    /// Owning category, required on create
    pub category_id: Option<i32>,
    /// Image files (repeat the field for several images, up to 20)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub images: Option<Vec<String>>,
}

/// Query params for listing brands
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BrandListQuery {
    /// Only brands of this category
    pub category_id: Option<i32>,
}

#[derive(Debug, Validate)]
pub struct CreateBrandDto {
    #[validate(length(min = 1, max = 255, message = "name is required (max 255 characters)"))]
    pub name: String,

    #[validate(length(max = 255, message = "nameRu must not exceed 255 characters"))]
    pub name_ru: Option<String>,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub category_id: i32,
}

impl CreateBrandDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let category_id = form
            .parse::<i32>("categoryId")?
            .ok_or_else(|| AppError::Validation("categoryId is required".to_string()))?;

        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            name_ru: form.text("nameRu"),
            name_en: form.text("nameEn"),
            category_id,
        })
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Validate)]
pub struct UpdateBrandDto {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "nameRu must not exceed 255 characters"))]
    pub name_ru: Option<String>,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub category_id: Option<i32>,
}

impl UpdateBrandDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name"),
            name_ru: form.text("nameRu"),
            name_en: form.text("nameEn"),
            category_id: form.parse::<i32>("categoryId")?,
        })
    }

    pub fn apply_to(self, brand: &mut Brand) {
        if let Some(name) = self.name {
            brand.name = name;
        }
        if self.name_ru.is_some() {
            brand.name_ru = self.name_ru;
        }
        if self.name_en.is_some() {
            brand.name_en = self.name_en;
        }
        if let Some(category_id) = self.category_id {
            brand.category_id = category_id;
        }
    }
}

/// Response DTO for brand
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct BrandResponseDto {
    pub id: i32,
    pub name: String,
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    pub images: Vec<String>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryResponseDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductResponseDto>>,
}

impl From<Brand> for BrandResponseDto {
    fn from(b: Brand) -> Self {
        Self {
            id: b.id,
            name: b.name,
            name_ru: b.name_ru,
            name_en: b.name_en,
            images: b.images,
            category_id: b.category_id,
            created_at: b.created_at,
            updated_at: b.updated_at,
            category: None,
            products: None,
        }
    }
}

impl BrandResponseDto {
    /// Attach each brand's category and, when loaded, its products
    pub fn assemble(
        brands: Vec<Brand>,
        categories: Vec<Category>,
        products: Option<Vec<Product>>,
    ) -> Vec<Self> {
        let categories: HashMap<i32, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        let mut products_by_brand: Option<HashMap<i32, Vec<ProductResponseDto>>> =
            products.map(|products| {
                let mut grouped: HashMap<i32, Vec<ProductResponseDto>> = HashMap::new();
                for product in products {
                    grouped
                        .entry(product.brand_id)
                        .or_default()
                        .push(product.into());
                }
                grouped
            });

        brands
            .into_iter()
            .map(|brand| {
                let category = categories.get(&brand.category_id).cloned().map(Into::into);
                let products = products_by_brand
                    .as_mut()
                    .map(|grouped| grouped.remove(&brand.id).unwrap_or_default());

                let mut response = Self::from(brand);
                response.category = category;
                response.products = products;
                response
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(id: i32, category_id: i32) -> Brand {
        Brand {
            id,
            name: format!("brand-{}", id),
            name_ru: None,
            name_en: Some("old".to_string()),
            images: vec![],
            category_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn category(id: i32) -> Category {
        Category {
            id,
            name_ru: format!("category-{}", id),
            name_en: None,
            description_ru: None,
            description_en: None,
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, brand_id: i32) -> Product {
        Product {
            id,
            name_ru: format!("product-{}", id),
            name_en: None,
            description_ru: None,
            description_en: None,
            images: vec![],
            brand_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_requires_category_id() {
        let form = MultipartForm::with_fields(&[("name", "Lipton")]);
        assert!(matches!(
            CreateBrandDto::from_form(&form),
            Err(AppError::Validation(_))
        ));

        let form = MultipartForm::with_fields(&[("name", "Lipton"), ("categoryId", "abc")]);
        assert!(CreateBrandDto::from_form(&form).is_err());

        let form = MultipartForm::with_fields(&[("name", "Lipton"), ("categoryId", "4")]);
        let dto = CreateBrandDto::from_form(&form).unwrap();
        assert_eq!(dto.category_id, 4);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_patch_can_move_brand() {
        let mut stored = brand(1, 1);
        let patch = UpdateBrandDto::from_form(&MultipartForm::with_fields(&[("categoryId", "9")]))
            .unwrap();

        patch.apply_to(&mut stored);

        assert_eq!(stored.category_id, 9);
        assert_eq!(stored.name, "brand-1");
        assert_eq!(stored.name_en.as_deref(), Some("old"));
    }

    #[test]
    fn test_assemble_attaches_category_and_products() {
        let assembled = BrandResponseDto::assemble(
            vec![brand(1, 10), brand(2, 20)],
            vec![category(10), category(20)],
            Some(vec![product(100, 2), product(101, 2)]),
        );

        assert_eq!(assembled[0].category.as_ref().unwrap().id, 10);
        assert!(assembled[0].products.as_ref().unwrap().is_empty());
        assert_eq!(assembled[1].products.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_assemble_without_products() {
        let assembled = BrandResponseDto::assemble(vec![brand(1, 10)], vec![category(10)], None);
        let json = serde_json::to_value(&assembled[0]).unwrap();
        assert!(json.get("products").is_none());
        assert_eq!(json["category"]["nameRu"], "category-10");
        assert_eq!(json["categoryId"], 10);
    }
}
