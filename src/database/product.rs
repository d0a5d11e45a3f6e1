use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::product::{NewImage, Product, ProductImage, ProductInput, ProductRow};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ProductRepository {
    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError>;
    async fn update_product(&self, id: &Uuid, input: &ProductInput) -> Result<Product, AppError>;
    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError>;
    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError>;
    /// Every product, newest first. Admin listing.
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
    /// Active products, newest first, optionally restricted to a category
    /// slug and/or capped. Site listing.
    async fn list_active_products(&self, category_slug: Option<&str>, limit: Option<i64>) -> Result<Vec<Product>, AppError>;
    /// Replace the product's image set wholesale with the submitted rows.
    async fn replace_images(&self, product_id: &Uuid, images: &[NewImage]) -> Result<(), AppError>;
    async fn count_products(&self) -> Result<i64, AppError>;
}

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.category_id, c.name AS category_name, p.name, p.sku, p.oem_number,
           p.summary, p.is_active, p.created_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

impl PostgresRepository {
    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT id, product_id, image_url, alt_text, sort_order
            FROM product_images
            WHERE product_id = ANY($1)
            ORDER BY sort_order ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
        for image in images {
            by_product.entry(image.product_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_product.remove(&row.id).unwrap_or_default();
                Product::from_row(row, images)
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl ProductRepository for PostgresRepository {
    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            WITH inserted AS (
                INSERT INTO products (category_id, name, sku, oem_number, summary, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, category_id, name, sku, oem_number, summary, is_active, created_at
            )
            SELECT i.id, i.category_id, c.name AS category_name, i.name, i.sku, i.oem_number,
                   i.summary, i.is_active, i.created_at
            FROM inserted i
            LEFT JOIN categories c ON c.id = i.category_id
            "#,
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.oem_number)
        .bind(&input.summary)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(Product::from_row(row, Vec::new()))
    }

    async fn update_product(&self, id: &Uuid, input: &ProductInput) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            WITH updated AS (
                UPDATE products
                SET category_id = $1, name = $2, sku = $3, oem_number = $4, summary = $5,
                    is_active = $6, updated_at = now()
                WHERE id = $7
                RETURNING id, category_id, name, sku, oem_number, summary, is_active, created_at
            )
            SELECT u.id, u.category_id, c.name AS category_name, u.name, u.sku, u.oem_number,
                   u.summary, u.is_active, u.created_at
            FROM updated u
            LEFT JOIN categories c ON c.id = u.category_id
            "#,
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.oem_number)
        .bind(&input.summary)
        .bind(input.is_active)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let mut products = self.attach_images(vec![row]).await?;
        products.pop().ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(())
    }

    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.sku = $1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let products = self.attach_images(vec![row]).await?;
                Ok(products.into_iter().next())
            }
            None => Ok(None),
        }
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} ORDER BY p.created_at DESC"))
            .fetch_all(&self.pool)
            .await?;

        self.attach_images(rows).await
    }

    async fn list_active_products(&self, category_slug: Option<&str>, limit: Option<i64>) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            {PRODUCT_SELECT}
            WHERE p.is_active
              AND ($1::text IS NULL OR c.slug = $1)
            ORDER BY p.created_at DESC
            LIMIT $2
            "#
        ))
        .bind(category_slug)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_images(rows).await
    }

    async fn replace_images(&self, product_id: &Uuid, images: &[NewImage]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for image in images {
            sqlx::query(
                r#"
                INSERT INTO product_images (product_id, image_url, alt_text, sort_order)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(product_id)
            .bind(&image.image_url)
            .bind(&image.alt_text)
            .bind(image.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn count_products(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    #[ignore = "requires database"]
    async fn product_crud_round_trip_with_images() {
        // Requires a running PostgreSQL at DATABASE_URL
    }
}
