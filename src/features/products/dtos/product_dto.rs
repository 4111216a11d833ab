use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::brands::dtos::BrandResponseDto;
use crate::features::brands::models::Brand;
use crate::features::categories::models::Category;
use crate::features::products::models::Product;
use crate::shared::multipart::MultipartForm;

/// Multipart body accepted by product create/update (documentation only)
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ProductFormDto {
    /// Required on create; unique within the brand
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    /// Owning brand, required on create
    pub brand_id: Option<i32>,
    /// Image files (repeat the field for several images, up to 20)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub images: Option<Vec<String>>,
}

/// Query filters for listing products
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Only products of this brand
    pub brand_id: Option<i32>,
    /// Only products whose brand belongs to this category
    pub category_id: Option<i32>,
}

#[derive(Debug, Validate)]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 255, message = "nameRu is required (max 255 characters)"))]
    pub name_ru: String,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub description_ru: Option<String>,

    pub description_en: Option<String>,

    pub brand_id: i32,
}

impl CreateProductDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let brand_id = form
            .parse::<i32>("brandId")?
            .ok_or_else(|| AppError::Validation("brandId is required".to_string()))?;

        Ok(Self {
            name_ru: form.text("nameRu").unwrap_or_default(),
            name_en: form.text("nameEn"),
            description_ru: form.text("descriptionRu"),
            description_en: form.text("descriptionEn"),
            brand_id,
        })
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Validate)]
pub struct UpdateProductDto {
    #[validate(length(min = 1, max = 255, message = "nameRu must be 1-255 characters"))]
    pub name_ru: Option<String>,

    #[validate(length(max = 255, message = "nameEn must not exceed 255 characters"))]
    pub name_en: Option<String>,

    pub description_ru: Option<String>,

    pub description_en: Option<String>,

    pub brand_id: Option<i32>,
}

impl UpdateProductDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        Ok(Self {
            name_ru: form.text("nameRu"),
            name_en: form.text("nameEn"),
            description_ru: form.text("descriptionRu"),
            description_en: form.text("descriptionEn"),
            brand_id: form.parse::<i32>("brandId")?,
        })
    }

    pub fn apply_to(self, product: &mut Product) {
        if let Some(name_ru) = self.name_ru {
            product.name_ru = name_ru;
        }
        if self.name_en.is_some() {
            product.name_en = self.name_en;
        }
        if self.description_ru.is_some() {
            product.description_ru = self.description_ru;
        }
        if self.description_en.is_some() {
            product.description_en = self.description_en;
        }
        if let Some(brand_id) = self.brand_id {
            product.brand_id = brand_id;
        }
    }
}

/// Response DTO for product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(no_recursion)]
pub struct ProductResponseDto {
    pub id: i32,
    pub name_ru: String,
    pub name_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    pub images: Vec<String>,
    pub brand_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning brand with its category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandResponseDto>,
}

impl From<Product> for ProductResponseDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name_ru: p.name_ru,
            name_en: p.name_en,
            description_ru: p.description_ru,
            description_en: p.description_en,
            images: p.images,
            brand_id: p.brand_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
            brand: None,
        }
    }
}

impl ProductResponseDto {
    /// Attach each product's brand, and the brand's category
    pub fn assemble(
        products: Vec<Product>,
        brands: Vec<Brand>,
        categories: Vec<Category>,
    ) -> Vec<Self> {
        let brands: HashMap<i32, BrandResponseDto> =
            BrandResponseDto::assemble(brands, categories, None)
                .into_iter()
                .map(|b| (b.id, b))
                .collect();

        products
            .into_iter()
            .map(|product| {
                let brand = brands.get(&product.brand_id).cloned();
                let mut response = Self::from(product);
                response.brand = brand;
                response
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i32, brand_id: i32) -> Product {
        Product {
            id,
            name_ru: format!("product-{}", id),
            name_en: None,
            description_ru: Some("old".to_string()),
            description_en: None,
            images: vec!["a.jpg".to_string()],
            brand_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn brand(id: i32, category_id: i32) -> Brand {
        Brand {
            id,
            name: format!("brand-{}", id),
            name_ru: None,
            name_en: None,
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

    #[test]
    fn test_create_requires_brand_id_and_name() {
        let form = MultipartForm::with_fields(&[("nameRu", "Эспрессо")]);
        assert!(matches!(
            CreateProductDto::from_form(&form),
            Err(AppError::Validation(_))
        ));

        let form = MultipartForm::with_fields(&[("brandId", "3")]);
        let dto = CreateProductDto::from_form(&form).unwrap();
        assert!(dto.validate().is_err());

        let form = MultipartForm::with_fields(&[("nameRu", "Эспрессо"), ("brandId", "3")]);
        let dto = CreateProductDto::from_form(&form).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.brand_id, 3);
    }

    #[test]
    fn test_patch_keeps_images_and_absent_fields() {
        let mut stored = product(1, 2);
        let patch = UpdateProductDto::from_form(&MultipartForm::with_fields(&[
            ("nameEn", "Espresso"),
            ("brandId", "5"),
        ]))
        .unwrap();

        patch.apply_to(&mut stored);

        assert_eq!(stored.name_ru, "product-1");
        assert_eq!(stored.name_en.as_deref(), Some("Espresso"));
        assert_eq!(stored.description_ru.as_deref(), Some("old"));
        assert_eq!(stored.brand_id, 5);
        assert_eq!(stored.images, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn test_assemble_nests_brand_and_category() {
        let assembled = ProductResponseDto::assemble(
            vec![product(1, 10), product(2, 11)],
            vec![brand(10, 100), brand(11, 101)],
            vec![category(100), category(101)],
        );

        let json = serde_json::to_value(&assembled[1]).unwrap();
        assert_eq!(json["brandId"], 11);
        assert_eq!(json["brand"]["name"], "brand-11");
        assert_eq!(json["brand"]["category"]["id"], 101);
        assert!(json["brand"].get("products").is_none());
    }

    #[test]
    fn test_filter_uses_camel_case() {
        let filter: ProductFilter =
            serde_json::from_value(serde_json::json!({"brandId": 1, "categoryId": 2})).unwrap();
        assert_eq!(filter.brand_id, Some(1));
        assert_eq!(filter.category_id, Some(2));
    }
}
