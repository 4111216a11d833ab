//! Cascading removal of catalog aggregates
//!
//! A [`CascadePlan`] names every row that has to go when a category, brand or
//! product is deleted, together with the image references each of those rows
//! owns. Rows are removed inside a single transaction (children first, so the
//! `ON DELETE RESTRICT` foreign keys hold at every statement); image files are
//! purged only after the transaction commits and never fail the operation.

use serde::Serialize;
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::modules::storage::FileStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Brand,
    Category,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Product => write!(f, "product"),
            EntityKind::Brand => write!(f, "brand"),
            EntityKind::Category => write!(f, "category"),
        }
    }
}

/// Images owned by one entity scheduled for removal
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub kind: EntityKind,
    pub owner_id: i32,
    pub images: Vec<String>,
}

/// Id and image references of a row locked for deletion
#[derive(Debug, Clone, FromRow)]
pub struct ImageOwner {
    pub id: i32,
    pub images: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CascadePlan {
    products: Vec<ImageSet>,
    brands: Vec<ImageSet>,
    categories: Vec<ImageSet>,
}

/// Outcome of a cascading delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub products_removed: u64,
    pub brands_removed: u64,
    pub categories_removed: u64,
    /// Entities whose images were submitted for deletion
    pub image_sets_purged: usize,
    /// Individual files removed (or already absent)
    pub files_deleted: usize,
}

impl CascadePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&mut self, id: i32, images: Vec<String>) {
        self.products.push(ImageSet {
            kind: EntityKind::Product,
            owner_id: id,
            images,
        });
    }

    pub fn add_brand(&mut self, id: i32, images: Vec<String>) {
        self.brands.push(ImageSet {
            kind: EntityKind::Brand,
            owner_id: id,
            images,
        });
    }

    pub fn add_category(&mut self, id: i32, images: Vec<String>) {
        self.categories.push(ImageSet {
            kind: EntityKind::Category,
            owner_id: id,
            images,
        });
    }

    /// Lock every product of `brand_ids` and add it to the plan
    pub async fn collect_products(
        &mut self,
        tx: &mut Transaction<'_, Postgres>,
        brand_ids: &[i32],
    ) -> Result<()> {
        if brand_ids.is_empty() {
            return Ok(());
        }

        let products = sqlx::query_as::<_, ImageOwner>(
            "SELECT id, images FROM products WHERE brand_id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(brand_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lock products of brands {:?}: {:?}", brand_ids, e);
            AppError::Database(e)
        })?;

        for product in products {
            self.add_product(product.id, product.images);
        }
        Ok(())
    }

    fn ids(sets: &[ImageSet]) -> Vec<i32> {
        sets.iter().map(|s| s.owner_id).collect()
    }

    pub fn product_ids(&self) -> Vec<i32> {
        Self::ids(&self.products)
    }

    pub fn brand_ids(&self) -> Vec<i32> {
        Self::ids(&self.brands)
    }

    pub fn category_ids(&self) -> Vec<i32> {
        Self::ids(&self.categories)
    }

    /// Image sets in purge order: products, then brands, then categories
    pub fn image_sets(&self) -> impl Iterator<Item = &ImageSet> {
        self.products
            .iter()
            .chain(self.brands.iter())
            .chain(self.categories.iter())
    }

    /// Delete every planned row inside `tx`.
    ///
    /// Children go first. The caller commits.
    pub async fn execute(&self, tx: &mut Transaction<'_, Postgres>) -> Result<CascadeSummary> {
        let mut summary = CascadeSummary::default();

        let product_ids = self.product_ids();
        if !product_ids.is_empty() {
            summary.products_removed = sqlx::query("DELETE FROM products WHERE id = ANY($1)")
                .bind(&product_ids)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete products {:?}: {:?}", product_ids, e);
                    AppError::Database(e)
                })?
                .rows_affected();
        }

        let brand_ids = self.brand_ids();
        if !brand_ids.is_empty() {
            summary.brands_removed = sqlx::query("DELETE FROM brands WHERE id = ANY($1)")
                .bind(&brand_ids)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete brands {:?}: {:?}", brand_ids, e);
                    AppError::Database(e)
                })?
                .rows_affected();
        }

        let category_ids = self.category_ids();
        if !category_ids.is_empty() {
            summary.categories_removed = sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
                .bind(&category_ids)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to delete categories {:?}: {:?}", category_ids, e);
                    AppError::Database(e)
                })?
                .rows_affected();
        }

        Ok(summary)
    }

    /// Best-effort removal of every planned image set.
    ///
    /// Fills the image counters of `summary` and returns it.
    pub async fn purge_images(
        &self,
        storage: &dyn FileStorage,
        mut summary: CascadeSummary,
    ) -> CascadeSummary {
        for set in self.image_sets() {
            if set.images.is_empty() {
                continue;
            }

            let deleted = storage.delete_files(&set.images).await;
            if deleted < set.images.len() {
                warn!(
                    "Deleted {}/{} images of {} {}; leaving the rest orphaned",
                    deleted,
                    set.images.len(),
                    set.kind,
                    set.owner_id
                );
            }

            summary.image_sets_purged += 1;
            summary.files_deleted += deleted;
        }

        info!(
            "Cascade complete: {} products, {} brands, {} categories removed; {} files deleted",
            summary.products_removed,
            summary.brands_removed,
            summary.categories_removed,
            summary.files_deleted
        );

        summary
    }
}
