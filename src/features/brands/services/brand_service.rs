use std::sync::Arc;

use sqlx::PgPool;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::brands::dtos::{BrandResponseDto, CreateBrandDto, UpdateBrandDto};
use crate::features::brands::models::Brand;
use crate::features::categories::models::Category;
use crate::features::products::models::Product;
use crate::modules::storage::{FileStorage, StagedImages};
use crate::shared::cascade::{CascadePlan, CascadeSummary, ImageOwner};
use crate::shared::multipart::UploadedFile;

/// Service for brand operations
pub struct BrandService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl BrandService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    async fn find_entity(&self, id: i32) -> Result<Brand> {
        sqlx::query_as::<_, Brand>(&format!(
            "SELECT {} FROM brands WHERE id = $1",
            Brand::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get brand {}: {:?}", id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Brand with ID {} not found", id)))
    }

    async fn ensure_category_exists(&self, category_id: i32) -> Result<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "Category with ID {} not found",
                category_id
            )));
        }
        Ok(())
    }

    async fn ensure_name_available(&self, name: &str) -> Result<()> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM brands WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if taken {
            return Err(AppError::Conflict(format!(
                "Brand with name \"{}\" already exists",
                name
            )));
        }
        Ok(())
    }

    async fn categories_of(&self, brands: &[Brand]) -> Result<Vec<Category>> {
        let ids: Vec<i32> = brands.iter().map(|b| b.category_id).collect();
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = ANY($1)",
            Category::COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load categories of brands: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn products_of(&self, brand_ids: &[i32]) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE brand_id = ANY($1) ORDER BY id ASC",
            Product::COLUMNS
        ))
        .bind(brand_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load products of brands: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list(&self, category_id: Option<i32>) -> Result<Vec<BrandResponseDto>> {
        let brands = sqlx::query_as::<_, Brand>(&format!(
            r#"
            SELECT {} FROM brands
            WHERE ($1::int IS NULL OR category_id = $1)
            ORDER BY id ASC
            "#,
            Brand::COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list brands: {:?}", e);
            AppError::Database(e)
        })?;

        let ids: Vec<i32> = brands.iter().map(|b| b.id).collect();
        let categories = self.categories_of(&brands).await?;
        let products = self.products_of(&ids).await?;

        Ok(BrandResponseDto::assemble(brands, categories, Some(products)))
    }

    pub async fn create(
        &self,
        dto: CreateBrandDto,
        images: Vec<UploadedFile>,
    ) -> Result<BrandResponseDto> {
        self.ensure_category_exists(dto.category_id).await?;
        self.ensure_name_available(&dto.name).await?;

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;

        let inserted = sqlx::query_as::<_, Brand>(&format!(
            r#"
            INSERT INTO brands (name, name_ru, name_en, images, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            Brand::COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.name_ru)
        .bind(&dto.name_en)
        .bind(staged.urls())
        .bind(dto.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error(
                e,
                &format!("Brand with name \"{}\" already exists", dto.name),
            )
        });

        let brand = staged.settle(inserted).await?;
        tracing::info!("Brand {} created in category {}", brand.id, brand.category_id);
        Ok(brand.into())
    }

    /// All brands with their category and products
    pub async fn find_all(&self) -> Result<Vec<BrandResponseDto>> {
        self.list(None).await
    }

    pub async fn find_by_category(&self, category_id: i32) -> Result<Vec<BrandResponseDto>> {
        self.list(Some(category_id)).await
    }

    pub async fn find_one(&self, id: i32, include_products: bool) -> Result<BrandResponseDto> {
        let brand = self.find_entity(id).await?;

        let categories = self.categories_of(std::slice::from_ref(&brand)).await?;
        let products = if include_products {
            Some(self.products_of(&[id]).await?)
        } else {
            None
        };

        BrandResponseDto::assemble(vec![brand], categories, products)
            .pop()
            .ok_or_else(|| AppError::Internal("Brand vanished while loading".to_string()))
    }

    /// Merge `dto` into the brand; new images replace the old ones
    pub async fn update(
        &self,
        id: i32,
        dto: UpdateBrandDto,
        images: Vec<UploadedFile>,
    ) -> Result<BrandResponseDto> {
        let mut brand = self.find_entity(id).await?;

        if let Some(category_id) = dto.category_id {
            if category_id != brand.category_id {
                self.ensure_category_exists(category_id).await?;
            }
        }
        if let Some(name) = dto.name.as_deref() {
            if name != brand.name {
                self.ensure_name_available(name).await?;
            }
        }

        dto.apply_to(&mut brand);

        let staged = StagedImages::stage(self.storage.as_ref(), &images).await?;
        let replaced = if staged.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut brand.images, staged.urls().to_vec())
        };

        let updated = sqlx::query_as::<_, Brand>(&format!(
            r#"
            UPDATE brands
            SET name = $2, name_ru = $3, name_en = $4, images = $5, category_id = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Brand::COLUMNS
        ))
        .bind(id)
        .bind(&brand.name)
        .bind(&brand.name_ru)
        .bind(&brand.name_en)
        .bind(&brand.images)
        .bind(brand.category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Brand with this name already exists"))
        .and_then(|row| {
            row.ok_or_else(|| AppError::NotFound(format!("Brand with ID {} not found", id)))
        });

        let updated = staged.settle(updated).await?;

        if !replaced.is_empty() {
            self.storage.delete_files(&replaced).await;
        }

        tracing::info!("Brand {} updated", id);
        Ok(updated.into())
    }

    /// Delete the brand together with all of its products
    pub async fn remove(&self, id: i32) -> Result<CascadeSummary> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let brand = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM brands WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Brand with ID {} not found", id)))?;

        let mut plan = CascadePlan::new();
        plan.collect_products(&mut tx, &[brand.id]).await?;
        plan.add_brand(brand.id, brand.images);

        let summary = plan.execute(&mut tx).await?;
        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Brand {} deleted with {} products",
            id,
            summary.products_removed
        );

        Ok(plan.purge_images(self.storage.as_ref(), summary).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::RecordingStorage;

    fn service(pool: PgPool) -> (BrandService, Arc<RecordingStorage>) {
        let storage = Arc::new(RecordingStorage::default());
        (BrandService::new(pool, storage.clone()), storage)
    }

    fn create_dto(name: &str, category_id: i32) -> CreateBrandDto {
        CreateBrandDto {
            name: name.to_string(),
            name_ru: None,
            name_en: None,
            category_id,
        }
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8],
        }
    }

    async fn insert_category(pool: &PgPool, name_ru: &str) -> i32 {
        sqlx::query_scalar("INSERT INTO categories (name_ru) VALUES ($1) RETURNING id")
            .bind(name_ru)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_create_with_unknown_category_writes_nothing(pool: PgPool) {
        let (svc, storage) = service(pool.clone());

        let result = svc
            .create(create_dto("Nestle", 9999), vec![jpeg("logo.jpg")])
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(storage.saved().is_empty());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let category_id = insert_category(&pool, "Кофе").await;

        svc.create(create_dto("Jacobs", category_id), vec![])
            .await
            .unwrap();
        let dup = svc.create(create_dto("Jacobs", category_id), vec![]).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_update_to_unknown_category_is_not_found(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let category_id = insert_category(&pool, "Чай").await;
        let brand = svc
            .create(create_dto("Greenfield", category_id), vec![])
            .await
            .unwrap();

        let patch = UpdateBrandDto {
            category_id: Some(4242),
            ..Default::default()
        };
        let result = svc.update(brand.id, patch, vec![]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let unchanged = svc.find_one(brand.id, false).await.unwrap();
        assert_eq!(unchanged.category_id, category_id);
        assert_eq!(unchanged.category.unwrap().name_ru, "Чай");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_find_by_category_filters(pool: PgPool) {
        let (svc, _) = service(pool.clone());
        let tea = insert_category(&pool, "Чай").await;
        let coffee = insert_category(&pool, "Кофе").await;
        svc.create(create_dto("Ahmad", tea), vec![]).await.unwrap();
        svc.create(create_dto("Lavazza", coffee), vec![])
            .await
            .unwrap();

        let brands = svc.find_by_category(coffee).await.unwrap();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name, "Lavazza");
        assert_eq!(brands[0].products.as_ref().map(Vec::len), Some(0));
        assert_eq!(svc.find_all().await.unwrap().len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_remove_cascades_to_products(pool: PgPool) {
        let (svc, storage) = service(pool.clone());
        let category_id = insert_category(&pool, "Снеки").await;
        let brand = svc
            .create(create_dto("Lays", category_id), vec![jpeg("lays.jpg")])
            .await
            .unwrap();

        for name in ["Сметана", "Сыр"] {
            sqlx::query("INSERT INTO products (name_ru, brand_id, images) VALUES ($1, $2, $3)")
                .bind(name)
                .bind(brand.id)
                .bind(vec![format!("{}.jpg", name)])
                .execute(&pool)
                .await
                .unwrap();
        }

        let summary = svc.remove(brand.id).await.unwrap();

        assert_eq!(summary.products_removed, 2);
        assert_eq!(summary.brands_removed, 1);
        assert_eq!(summary.categories_removed, 0);
        assert_eq!(summary.image_sets_purged, 3);
        assert_eq!(storage.deleted().len(), 3);
        assert!(matches!(
            svc.find_one(brand.id, true).await,
            Err(AppError::NotFound(_))
        ));

        let category_left: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(category_left);
    }
}
