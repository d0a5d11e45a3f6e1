use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::category::{Category, CategoryInput};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait CategoryRepository {
    async fn create_category(&self, input: &CategoryInput) -> Result<Category, AppError>;
    async fn update_category(&self, id: &Uuid, input: &CategoryInput) -> Result<Category, AppError>;
    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError>;
    /// All categories, admin ordering (position, then name).
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    /// Active categories, site ordering (name).
    async fn list_active_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;
    async fn count_categories(&self) -> Result<i64, AppError>;
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, is_active, level, position, created_at";

#[async_trait::async_trait]
impl CategoryRepository for PostgresRepository {
    async fn create_category(&self, input: &CategoryInput) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description, is_active, level, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, slug, description, is_active, level, position, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.is_active)
        .bind(input.level)
        .bind(input.position)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn update_category(&self, id: &Uuid, input: &CategoryInput) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, slug = $2, description = $3, is_active = $4, level = $5, position = $6, updated_at = now()
            WHERE id = $7
            RETURNING id, name, slug, description, is_active, level, position, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.is_active)
        .bind(input.level)
        .bind(input.position)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY position ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn count_categories(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
