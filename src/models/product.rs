use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// Product row joined with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub name: String,
    pub sku: String,
    pub oem_number: String,
    pub summary: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
}

/// Product with its image gallery, as handed to routes and templates.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub name: String,
    pub sku: String,
    pub oem_number: String,
    pub summary: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Template helper for the category select.
    pub fn in_category(&self, id: Uuid) -> bool {
        self.category_id == Some(id)
    }

    /// Template helper for the summary editor prefill.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn from_row(row: ProductRow, mut images: Vec<ProductImage>) -> Self {
        images.sort_by_key(|image| image.sort_order);
        Self {
            id: row.id,
            category_id: row.category_id,
            category_name: row.category_name,
            name: row.name,
            sku: row.sku,
            oem_number: row.oem_number,
            summary: row.summary,
            is_active: row.is_active,
            created_at: row.created_at,
            images,
        }
    }
}

/// Repository-facing shape of a product write, shared by the admin form
/// handlers, the CSV importer, and tests.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub oem_number: String,
    pub summary: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
}

/// Image replacement set submitted with a product form. Rows removed in the
/// admin UI are simply absent here.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, FromForm, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 160))]
    pub name: String,
    #[validate(length(min = 1, max = 120))]
    pub sku: String,
    #[validate(length(min = 1, max = 60))]
    pub oem_number: String,
    pub summary: Option<String>,
    /// Empty string means "no category"; parsed in the handler.
    #[field(default = String::new())]
    pub category_id: String,
    #[field(default = false)]
    pub is_active: bool,
    pub image_url: Vec<String>,
    pub image_alt: Vec<String>,
    pub csrf_token: String,
}

impl ProductForm {
    /// Pair up the parallel image_url/image_alt fields, dropping blank URL
    /// rows (the add-image widget always submits the template row).
    pub fn images(&self) -> Vec<NewImage> {
        self.image_url
            .iter()
            .enumerate()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(i, url)| NewImage {
                image_url: url.trim().to_string(),
                alt_text: self.image_alt.get(i).map(|alt| alt.trim()).filter(|alt| !alt.is_empty()).map(String::from),
                sort_order: i as i32,
            })
            .collect()
    }
}

impl crate::forms::CsrfGuarded for ProductForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

// ── Public site presentation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub oem_number: String,
    pub summary_html: String,
    pub category: Option<String>,
    pub primary_image: Option<ImageView>,
    pub images: Vec<ImageView>,
}

impl ProductView {
    /// Mirror of the site serializer: images ordered by sort_order, the first
    /// one promoted to primary, alt text falling back to the product name.
    pub fn new(product: &Product, summary_html: String) -> Self {
        let images: Vec<ImageView> = product
            .images
            .iter()
            .map(|image| ImageView {
                url: image.image_url.clone(),
                alt: image.alt_text.clone().unwrap_or_else(|| product.name.clone()),
            })
            .collect();

        Self {
            id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            oem_number: product.oem_number.clone(),
            summary_html,
            category: product.category_name.clone(),
            primary_image: images.first().cloned(),
            images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_images(images: Vec<ProductImage>) -> Product {
        Product {
            id: Uuid::new_v4(),
            category_id: None,
            category_name: Some("Brakes".to_string()),
            name: "Brake Pad Set".to_string(),
            sku: "BP-100".to_string(),
            oem_number: "OEM-77".to_string(),
            summary: None,
            is_active: true,
            created_at: Utc::now(),
            images,
        }
    }

    fn image(product_id: Uuid, url: &str, alt: Option<&str>, sort_order: i32) -> ProductImage {
        ProductImage {
            id: Uuid::new_v4(),
            product_id,
            image_url: url.to_string(),
            alt_text: alt.map(String::from),
            sort_order,
        }
    }

    #[test]
    fn from_row_sorts_images() {
        let id = Uuid::new_v4();
        let row = ProductRow {
            id,
            category_id: None,
            category_name: None,
            name: "X".to_string(),
            sku: "S".to_string(),
            oem_number: "O".to_string(),
            summary: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let product = Product::from_row(row, vec![image(id, "/b.jpg", None, 2), image(id, "/a.jpg", None, 1)]);
        assert_eq!(product.images[0].image_url, "/a.jpg");
    }

    #[test]
    fn view_promotes_first_image_and_falls_back_to_name_for_alt() {
        let product = product_with_images(vec![
            image(Uuid::new_v4(), "/front.jpg", None, 0),
            image(Uuid::new_v4(), "/side.jpg", Some("Side view"), 1),
        ]);
        let view = ProductView::new(&product, String::new());
        let primary = view.primary_image.expect("primary image");
        assert_eq!(primary.url, "/front.jpg");
        assert_eq!(primary.alt, "Brake Pad Set");
        assert_eq!(view.images[1].alt, "Side view");
    }

    #[test]
    fn view_without_images_has_no_primary() {
        let product = product_with_images(Vec::new());
        let view = ProductView::new(&product, String::new());
        assert!(view.primary_image.is_none());
        assert!(view.images.is_empty());
    }

    #[test]
    fn form_images_skips_blank_rows_and_numbers_the_rest() {
        let form = ProductForm {
            name: "X".to_string(),
            sku: "S".to_string(),
            oem_number: "O".to_string(),
            summary: None,
            category_id: String::new(),
            is_active: true,
            image_url: vec!["/a.jpg".to_string(), "  ".to_string(), "/c.jpg".to_string()],
            image_alt: vec!["Front".to_string(), String::new(), String::new()],
            csrf_token: "t".to_string(),
        };
        let images = form.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image_url, "/a.jpg");
        assert_eq!(images[0].alt_text.as_deref(), Some("Front"));
        assert_eq!(images[1].image_url, "/c.jpg");
        assert!(images[1].alt_text.is_none());
        assert_eq!(images[1].sort_order, 2);
    }
}
