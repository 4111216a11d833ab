use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::brands::models::Brand;
use crate::features::categories::models::Category;
use crate::features::products::dtos::{
    CreateProductDto, ProductFilter, ProductResponseDto, UpdateProductDto,
};
use crate::features::products::models::Product;
use crate::modules::storage::{FileStorage, StagedImages};
use crate::shared::cascade::{CascadePlan, CascadeSummary, ImageOwner};
use crate::shared::multipart::UploadedFile;

/// Service for product operations
pub struct ProductService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl ProductService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    async fn find_entity(&self, id: i32) -> Result<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            Product::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get product {}: {:?}", id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found", id)))
    }

    async fn ensure_brand_exists(&self, brand_id: i32) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM brands WHERE id = $1)")
            .bind(brand_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "Brand with ID {} not found",
                brand_id
            )));
        }
        Ok(())
    }

    /// `(name_ru, brand_id)` must be unique; `except` skips the product being updated
    async fn ensure_name_available(
        &self,
        name_ru: &str,
        brand_id: i32,
        except: Option<i32>,
    ) -> Result<()> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM products
                WHERE name_ru = $1 AND brand_id = $2 AND ($3::int IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(name_ru)
        .bind(brand_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if taken {
            return Err(AppError::Conflict(format!(
                "Product \"{}\" already exists for brand {}",
                name_ru, brand_id
            )));
        }
        Ok(())
    }

    /// Load brands and their categories, then nest them into the products
    async fn with_relations(&self, products: Vec<Product>) -> Result<Vec<ProductResponseDto>> {
        let brand_ids: Vec<i32> = products.iter().map(|p| p.brand_id).collect();

        let brands = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands WHERE id = ANY($1)",
            Brand::COLUMNS
        ))
        .bind(&brand_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load brands of products: {:?}", e);
            AppError::Database(e)
        })?;

        let category_ids: Vec<i32> = brands.iter().map(|b| b.category_id).collect();
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = ANY($1)",
            Category::COLUMNS
        ))
        .bind(&category_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load categories of products: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(ProductResponseDto::assemble(products, brands, categories))
    }

    pub async fn create(
        &self,
        dto: CreateProductDto,
        images: Vec<UploadedFile>,
    ) -> Result<ProductResponseDto> {
        self.ensure_brand_exists(dto.brand_id).await?;
        self.ensure_name_available(&dto.name_ru, dto.brand_id, None)
            .await?;

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;

        let inserted = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name_ru, name_en, description_ru, description_en, images, brand_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            Product::COLUMNS
        ))
        .bind(&dto.name_ru)
        .bind(&dto.name_en)
        .bind(&dto.description_ru)
        .bind(&dto.description_en)
        .bind(staged.urls())
        .bind(dto.brand_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!(
                    "Product \"{}\" already exists for brand {}",
                    dto.name_ru, dto.brand_id
                ),
            )
        });

        let product = staged.settle(inserted).await?;
        tracing::info!("Product {} created in brand {}", product.id, product.brand_id);
        Ok(product.into())
    }

    /// Products matching `filter`, newest first, each with brand and category
    pub async fn find_all(&self, filter: ProductFilter) -> Result<Vec<ProductResponseDto>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {} FROM products
            WHERE ($1::int IS NULL OR brand_id = $1)
              AND ($2::int IS NULL OR brand_id IN (SELECT id FROM brands WHERE category_id = $2))
            ORDER BY created_at DESC, id DESC
            "#,
            Product::COLUMNS
        ))
        .bind(filter.brand_id)
        .bind(filter.category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list products: {:?}", e);
            AppError::Database(e)
        })?;

        self.with_relations(products).await
    }

    pub async fn find_one(&self, id: i32) -> Result<ProductResponseDto> {
        let product = self.find_entity(id).await?;
        self.with_relations(vec![product])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Product vanished while loading".to_string()))
    }

    /// Merge `dto` into the product; new images replace the old ones
    pub async fn update(
        &self,
        id: i32,
        dto: UpdateProductDto,
        images: Vec<UploadedFile>,
    ) -> Result<ProductResponseDto> {
        let mut product = self.find_entity(id).await?;

        if let Some(brand_id) = dto.brand_id {
            if brand_id != product.brand_id {
                self.ensure_brand_exists(brand_id).await?;
            }
        }

        let name_changed = dto
            .name_ru
            .as_deref()
            .is_some_and(|name| name != product.name_ru);
        let brand_changed = dto.brand_id.is_some_and(|b| b != product.brand_id);

        dto.apply_to(&mut product);

        if name_changed || brand_changed {
            self.ensure_name_available(&product.name_ru, product.brand_id, Some(id))
                .await?;
        }

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;
        let replaced = if staged.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut product.images, staged.urls().to_vec())
        };

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name_ru = $2, name_en = $3, description_ru = $4, description_en = $5,
                images = $6, brand_id = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Product::COLUMNS
        ))
        .bind(id)
        .bind(&product.name_ru)
        .bind(&product.name_en)
        .bind(&product.description_ru)
        .bind(&product.description_en)
        .bind(&product.images)
        .bind(product.brand_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Product with this name already exists for the brand"))
        .and_then(|row| {
            row.ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found", id)))
        });

        let updated = staged.settle(updated).await?;

        if !replaced.is_empty() {
            self.storage.delete_files(&replaced).await;
        }

        tracing::info!("Product {} updated", id);
        self.with_relations(vec![updated])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Product vanished while loading".to_string()))
    }

    pub async fn remove(&self, id: i32) -> Result<CascadeSummary> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let product = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found", id)))?;

        let mut plan = CascadePlan::new();
        plan.add_product(product.id, product.images);

        let summary = plan.execute(&mut tx).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Product {} deleted", id);
        Ok(plan.purge_images(self.storage.as_ref(), summary).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::RecordingStorage;

    fn service(pool: PgPool) -> (ProductService, Arc<RecordingStorage>) {
        let storage = Arc::new(RecordingStorage::default());
        (ProductService::new(pool, storage.clone()), storage)
    }

    fn create_dto(name_ru: &str, brand_id: i32) -> CreateProductDto {
        CreateProductDto {
            name_ru: name_ru.to_string(),
            name_en: None,
            description_ru: None,
            description_en: None,
            brand_id,
        }
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8],
        }
    }

    /// Inserts a category and a brand in it, returning `(category_id, brand_id)`
    async fn seed_brand(pool: &PgPool, category: &str, brand: &str) -> (i32, i32) {
        let category_id: i32 =
            sqlx::query_scalar("INSERT INTO categories (name_ru) VALUES ($1) RETURNING id")
                .bind(category)
                .fetch_one(pool)
                .await
                .unwrap();
        let brand_id: i32 = sqlx::query_scalar(
            "INSERT INTO brands (name, category_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(brand)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .unwrap();
        (category_id, brand_id)
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_name_unique_per_brand_only(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let (_, first) = seed_brand(&pool, "Кофе", "Jacobs").await;
        let (_, second) = seed_brand(&pool, "Чай", "Lipton").await;

        svc.create(create_dto("Классика", first), vec![])
            .await
            .unwrap();

        let dup = svc.create(create_dto("Классика", first), vec![]).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let other_brand = svc.create(create_dto("Классика", second), vec![]).await;
        assert!(other_brand.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_create_with_unknown_brand_is_not_found(pool: PgPool) {
        let (svc, storage) = service(pool);
        let result = svc
            .create(create_dto("Латте", 777), vec![jpeg("latte.jpg")])
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(storage.saved().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_find_one_nests_brand_and_category(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let (category_id, brand_id) = seed_brand(&pool, "Кофе", "Lavazza").await;
        let created = svc
            .create(create_dto("Qualita Oro", brand_id), vec![])
            .await
            .unwrap();

        let found = svc.find_one(created.id).await.unwrap();
        let brand = found.brand.expect("brand loaded");
        assert_eq!(brand.id, brand_id);
        assert_eq!(brand.category.expect("category loaded").id, category_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_update_response_nests_new_brand(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let (_, old_brand) = seed_brand(&pool, "Кофе", "Jacobs").await;
        let (tea_id, new_brand) = seed_brand(&pool, "Чай", "Lipton").await;
        let created = svc
            .create(create_dto("Yellow Label", old_brand), vec![])
            .await
            .unwrap();

        let dto = UpdateProductDto {
            brand_id: Some(new_brand),
            ..Default::default()
        };
        let updated = svc.update(created.id, dto, vec![]).await.unwrap();

        assert_eq!(updated.brand_id, new_brand);
        let brand = updated.brand.expect("brand loaded");
        assert_eq!(brand.id, new_brand);
        assert_eq!(brand.category.expect("category loaded").id, tea_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_find_all_filters_by_brand_and_category(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let (coffee, jacobs) = seed_brand(&pool, "Кофе", "Jacobs").await;
        let (_, lipton) = seed_brand(&pool, "Чай", "Lipton").await;

        svc.create(create_dto("Monarch", jacobs), vec![])
            .await
            .unwrap();
        svc.create(create_dto("Yellow Label", lipton), vec![])
            .await
            .unwrap();
        let newest = svc
            .create(create_dto("Velour", jacobs), vec![])
            .await
            .unwrap();

        let by_brand = svc
            .find_all(ProductFilter {
                brand_id: Some(jacobs),
                category_id: None,
            })
            .await
            .unwrap();
        assert_eq!(by_brand.len(), 2);
        assert_eq!(by_brand[0].id, newest.id);

        let by_category = svc
            .find_all(ProductFilter {
                brand_id: None,
                category_id: Some(coffee),
            })
            .await
            .unwrap();
        assert!(by_category.iter().all(|p| p.brand_id == jacobs));

        let all = svc.find_all(ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_remove_tolerates_image_failures(pool: PgPool) {
        let storage = Arc::new(RecordingStorage::failing_on(&["http://test/broken.jpg"]));
        let svc = ProductService::new(pool.clone(), storage.clone());
        let (_, brand_id) = seed_brand(&pool, "Снеки", "Pringles").await;
        let product = svc
            .create(
                create_dto("Оригинал", brand_id),
                vec![jpeg("broken.jpg"), jpeg("ok.jpg")],
            )
            .await
            .unwrap();

        let summary = svc.remove(product.id).await.unwrap();

        assert_eq!(summary.products_removed, 1);
        assert_eq!(storage.deleted().len(), 2);
        assert!(matches!(
            svc.find_one(product.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
