use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::brands::models::Brand;
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::models::Category;
use crate::modules::storage::{FileStorage, StagedImages};
use crate::shared::cascade::{CascadePlan, CascadeSummary, ImageOwner};
use crate::shared::multipart::UploadedFile;

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl CategoryService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    async fn find_entity(&self, id: i32) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            Category::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get category {}: {:?}", id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Category with ID {} not found", id)))
    }

    async fn ensure_name_available(&self, name_ru: &str) -> Result<()> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE name_ru = $1)")
                .bind(name_ru)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if taken {
            return Err(AppError::Conflict(format!(
                "Category with name \"{}\" already exists",
                name_ru
            )));
        }
        Ok(())
    }

    async fn brands_of(&self, category_ids: &[i32]) -> Result<Vec<Brand>> {
        sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands WHERE category_id = ANY($1) ORDER BY id ASC",
            Brand::COLUMNS
        ))
        .bind(category_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list brands of categories: {:?}", e);
            AppError::Database(e)
        })
    }

    pub async fn create(
        &self,
        dto: CreateCategoryDto,
        images: Vec<UploadedFile>,
    ) -> Result<CategoryResponseDto> {
        self.ensure_name_available(&dto.name_ru).await?;

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;

        let inserted = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (name_ru, name_en, description_ru, description_en, images)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            Category::COLUMNS
        ))
        .bind(&dto.name_ru)
        .bind(&dto.name_en)
        .bind(&dto.description_ru)
        .bind(&dto.description_en)
        .bind(staged.urls())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!("Category with name \"{}\" already exists", dto.name_ru),
            )
        });

        let category = staged.settle(inserted).await?;
        tracing::info!("Category {} created", category.id);
        Ok(category.into())
    }

    /// All categories ordered by id, each with its brands
    pub async fn find_all(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories ORDER BY id ASC",
            Category::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })?;

        let ids: Vec<i32> = categories.iter().map(|c| c.id).collect();
        let brands = self.brands_of(&ids).await?;

        Ok(CategoryResponseDto::with_brands(categories, brands))
    }

    pub async fn find_one(&self, id: i32, include_brands: bool) -> Result<CategoryResponseDto> {
        let category = self.find_entity(id).await?;

        if !include_brands {
            return Ok(category.into());
        }

        let brands = self.brands_of(&[id]).await?;
        let mut responses = CategoryResponseDto::with_brands(vec![category], brands);
        responses
            .pop()
            .ok_or_else(|| AppError::Internal("Category vanished while loading".to_string()))
    }

    /// Merge `dto` into the category; new images replace the old ones
    pub async fn update(
        &self,
        id: i32,
        dto: UpdateCategoryDto,
        images: Vec<UploadedFile>,
    ) -> Result<CategoryResponseDto> {
        let mut category = self.find_entity(id).await?;

        if let Some(name_ru) = dto.name_ru.as_deref() {
            if name_ru != category.name_ru {
                self.ensure_name_available(name_ru).await?;
            }
        }

        dto.apply_to(&mut category);

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;
        let replaced = if staged.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut category.images, staged.urls().to_vec())
        };

        let updated = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name_ru = $2, name_en = $3, description_ru = $4, description_en = $5,
                images = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Category::COLUMNS
        ))
        .bind(id)
        .bind(&category.name_ru)
        .bind(&category.name_en)
        .bind(&category.description_ru)
        .bind(&category.description_en)
        .bind(&category.images)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Category with this name already exists"))
        .and_then(|row| {
            row.ok_or_else(|| AppError::NotFound(format!("Category with ID {} not found", id)))
        });

        let updated = staged.settle(updated).await?;

        if !replaced.is_empty() {
            self.storage.delete_files(&replaced).await;
        }

        tracing::info!("Category {} updated", id);
        Ok(updated.into())
    }

    /// Delete the category with all of its brands and their products
    pub async fn remove(&self, id: i32) -> Result<CascadeSummary> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let category = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM categories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Category with ID {} not found", id)))?;

        let brands = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM brands WHERE category_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let brand_ids: Vec<i32> = brands.iter().map(|b| b.id).collect();

        let mut plan = CascadePlan::new();
        plan.collect_products(&mut tx, &brand_ids).await?;
        for brand in brands {
            plan.add_brand(brand.id, brand.images);
        }
        plan.add_category(category.id, category.images);

        let summary = plan.execute(&mut tx).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Category {} deleted with {} brands and {} products",
            id,
            summary.brands_removed,
            summary.products_removed
        );

        Ok(plan.purge_images(self.storage.as_ref(), summary).await)
    }

    /// Delete the category only if no brand references it
    pub async fn remove_if_empty(&self, id: i32) -> Result<CascadeSummary> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let category = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM categories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Category with ID {} not found", id)))?;

        let brand_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM brands WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(AppError::Database)?;

        if brand_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete category: it has {} brand(s). Please delete all brands first.",
                brand_count
            )));
        }

        let mut plan = CascadePlan::new();
        plan.add_category(category.id, category.images);

        let summary = plan.execute(&mut tx).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Category {} deleted", id);
        Ok(plan.purge_images(self.storage.as_ref(), summary).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::RecordingStorage;

    fn service(pool: PgPool) -> (CategoryService, Arc<RecordingStorage>) {
        let storage = Arc::new(RecordingStorage::default());
        (CategoryService::new(pool, storage.clone()), storage)
    }

    fn create_dto(name_ru: &str) -> CreateCategoryDto {
        CreateCategoryDto {
            name_ru: name_ru.to_string(),
            name_en: None,
            description_ru: None,
            description_en: None,
        }
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let (svc, _) = service(pool);
        svc.create(create_dto("Чай"), vec![]).await.unwrap();
        let dup = svc.create(create_dto("Чай"), vec![]).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_update_replaces_images(pool: PgPool) {
        let (svc, storage) = service(pool);
        let created = svc
            .create(create_dto("Кофе"), vec![jpeg("old.jpg")])
            .await
            .unwrap();

        let patch = UpdateCategoryDto {
            name_en: Some("Coffee".to_string()),
            ..Default::default()
        };
        let updated = svc
            .update(created.id, patch, vec![jpeg("new.jpg")])
            .await
            .unwrap();

        assert_eq!(updated.name_ru, "Кофе");
        assert_eq!(updated.name_en.as_deref(), Some("Coffee"));
        assert_eq!(updated.images, vec!["http://test/new.jpg".to_string()]);
        assert_eq!(storage.deleted(), vec!["http://test/old.jpg".to_string()]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_remove_if_empty_rejects_category_with_brands(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let category = svc.create(create_dto("Сладости"), vec![]).await.unwrap();
        sqlx::query("INSERT INTO brands (name, category_id) VALUES ('Alpen Gold', $1)")
            .bind(category.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = svc.remove_if_empty(category.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(svc.find_one(category.id, false).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_remove_cascades_through_brands_and_products(pool: PgPool) {
        let (svc, storage) = service(pool.clone());
        let category = svc
            .create(create_dto("Напитки"), vec![jpeg("c.jpg")])
            .await
            .unwrap();

        let (brands, products_per_brand) = (3, 2);
        for b in 0..brands {
            let brand_id: i32 = sqlx::query_scalar(
                "INSERT INTO brands (name, category_id, images) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(format!("brand-{}", b))
            .bind(category.id)
            .bind(vec![format!("b{}.jpg", b)])
            .fetch_one(&pool)
            .await
            .unwrap();

            for p in 0..products_per_brand {
                sqlx::query("INSERT INTO products (name_ru, brand_id, images) VALUES ($1, $2, $3)")
                    .bind(format!("product-{}", p))
                    .bind(brand_id)
                    .bind(vec![format!("p{}-{}.jpg", b, p)])
                    .execute(&pool)
                    .await
                    .unwrap();
            }
        }

        let summary = svc.remove(category.id).await.unwrap();

        assert_eq!(summary.brands_removed, brands as u64);
        assert_eq!(summary.products_removed, (brands * products_per_brand) as u64);
        assert_eq!(summary.categories_removed, 1);
        assert_eq!(
            summary.image_sets_purged,
            brands * products_per_brand + brands + 1
        );
        assert_eq!(storage.deleted().len(), summary.image_sets_purged);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(
            svc.find_one(category.id, true).await,
            Err(AppError::NotFound(_))
        ));
    }
}
