use crate::database::category::CategoryRepository;
use crate::database::product::ProductRepository;
use crate::error::app_error::AppError;
use crate::models::category::{Category, CategoryInput};
use crate::models::product::{NewImage, Product, ProductInput};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory stand-in for the catalog repositories, tracking known SKUs so
/// import logic can be exercised without a database.
#[derive(Default)]
pub struct MockRepository {
    skus: Mutex<HashSet<String>>,
}

impl MockRepository {
    pub fn with_product_sku(sku: &str) -> Self {
        let repo = Self::default();
        repo.skus.lock().unwrap().insert(sku.to_string());
        repo
    }

    fn stub_product(&self, sku: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            category_id: None,
            category_name: None,
            name: format!("Product {sku}"),
            sku: sku.to_string(),
            oem_number: format!("OEM-{sku}"),
            summary: None,
            is_active: true,
            created_at: Utc::now(),
            images: Vec::new(),
        }
    }

    fn stub_category(input: &CategoryInput) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            is_active: input.is_active,
            level: input.level,
            position: input.position,
            created_at: Utc::now(),
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for MockRepository {
    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        self.skus.lock().unwrap().insert(input.sku.clone());
        Ok(self.stub_product(&input.sku))
    }

    async fn update_product(&self, id: &Uuid, input: &ProductInput) -> Result<Product, AppError> {
        let mut product = self.stub_product(&input.sku);
        product.id = *id;
        Ok(product)
    }

    async fn delete_product(&self, _id: &Uuid) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        if self.skus.lock().unwrap().contains(sku) {
            Ok(Some(self.stub_product(sku)))
        } else {
            Ok(None)
        }
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let skus = self.skus.lock().unwrap().clone();
        Ok(skus.iter().map(|sku| self.stub_product(sku)).collect())
    }

    async fn list_active_products(&self, _category_slug: Option<&str>, _limit: Option<i64>) -> Result<Vec<Product>, AppError> {
        self.list_products().await
    }

    async fn replace_images(&self, _product_id: &Uuid, _images: &[NewImage]) -> Result<(), AppError> {
        Ok(())
    }

    async fn count_products(&self) -> Result<i64, AppError> {
        Ok(self.skus.lock().unwrap().len() as i64)
    }
}

#[async_trait::async_trait]
impl CategoryRepository for MockRepository {
    async fn create_category(&self, input: &CategoryInput) -> Result<Category, AppError> {
        Ok(Self::stub_category(input))
    }

    async fn update_category(&self, id: &Uuid, input: &CategoryInput) -> Result<Category, AppError> {
        let mut category = Self::stub_category(input);
        category.id = *id;
        Ok(category)
    }

    async fn delete_category(&self, _id: &Uuid) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(Vec::new())
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(Vec::new())
    }

    async fn get_category_by_slug(&self, _slug: &str) -> Result<Option<Category>, AppError> {
        Ok(None)
    }

    async fn count_categories(&self) -> Result<i64, AppError> {
        Ok(0)
    }
}
