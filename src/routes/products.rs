use crate::config::Config;
use crate::csrf;
use crate::database::category::CategoryRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::product::ProductRepository;
use crate::error::app_error::AppError;
use crate::forms::{ConfirmForm, CsrfForm, CsrfGuarded};
use crate::models::admin::CurrentAdmin;
use crate::models::category::Category;
use crate::models::product::{Product, ProductForm, ProductInput};
use crate::routes::render;
use crate::service::spreadsheet;
use askama::Template;
use rocket::State;
use rocket::http::Header;
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::routes;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Template)]
#[template(path = "admin/products.html")]
struct ProductsTemplate {
    site_name: String,
    admin_name: String,
    csrf_token: String,
    notice: Option<String>,
    products: Vec<Product>,
    categories: Vec<Category>,
}

#[derive(Debug, rocket::FromForm)]
pub struct ImportForm {
    pub csv: String,
    pub csrf_token: String,
}

impl CsrfGuarded for ImportForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[derive(rocket::Responder)]
#[response(content_type = "text/csv")]
pub struct CsvExport {
    csv: String,
    disposition: Header<'static>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

fn parse_category_id(raw: &str) -> Result<Option<Uuid>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(trimmed)
        .map(Some)
        .map_err(|_| AppError::BadRequest("Invalid category id".to_string()))
}

fn product_input(form: &ProductForm) -> Result<ProductInput, AppError> {
    Ok(ProductInput {
        name: form.name.trim().to_string(),
        sku: form.sku.trim().to_string(),
        oem_number: form.oem_number.trim().to_string(),
        summary: form.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        category_id: parse_category_id(&form.category_id)?,
        is_active: form.is_active,
    })
}

fn notice_text(notice: Option<&str>) -> Option<String> {
    let notice = notice?;
    if let Some(counts) = notice.strip_prefix("imported:") {
        let parts: Vec<&str> = counts.split(':').collect();
        if let [created, updated, skipped] = parts.as_slice() {
            return Some(format!(
                "Import finished: {} created, {} updated, {} skipped.",
                created, updated, skipped
            ));
        }
    }

    match notice {
        "created" => Some("Product created.".to_string()),
        "updated" => Some("Product updated.".to_string()),
        "deleted" => Some("Product deleted.".to_string()),
        _ => None,
    }
}

#[rocket::get("/products?<notice>")]
pub async fn list_products(
    pool: &State<PgPool>,
    config: &State<Config>,
    admin: CurrentAdmin,
    notice: Option<&str>,
) -> Result<RawHtml<String>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let products = repo.list_products().await?;
    let categories = repo.list_categories().await?;

    render(&ProductsTemplate {
        site_name: config.site.name.clone(),
        admin_name: admin.display_name().to_string(),
        csrf_token: csrf::issue_token(&admin.session).to_string(),
        notice: notice_text(notice),
        products,
        categories,
    })
}

#[rocket::post("/products", data = "<form>")]
pub async fn create_product(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    form: CsrfForm<ProductForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let input = product_input(&form)?;
    let product = repo.create_product(&input).await?;
    repo.replace_images(&product.id, &form.images()).await?;

    info!(admin_id = %admin.id, product_id = %product.id, sku = %product.sku, "product created");
    Ok(Redirect::to("/admin/products?notice=created"))
}

#[rocket::post("/products/<id>", data = "<form>")]
pub async fn update_product(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    id: &str,
    form: CsrfForm<ProductForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid product id".to_string()))?;
    let input = product_input(&form)?;
    let product = repo.update_product(&uuid, &input).await?;
    repo.replace_images(&product.id, &form.images()).await?;

    info!(admin_id = %admin.id, product_id = %product.id, sku = %product.sku, "product updated");
    Ok(Redirect::to("/admin/products?notice=updated"))
}

#[rocket::post("/products/<id>/delete", data = "<_form>")]
pub async fn delete_product(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    id: &str,
    _form: CsrfForm<ConfirmForm>,
) -> Result<Redirect, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid product id".to_string()))?;
    repo.delete_product(&uuid).await?;

    info!(admin_id = %admin.id, product_id = %uuid, "product deleted");
    Ok(Redirect::to("/admin/products?notice=deleted"))
}

#[rocket::get("/products/export")]
pub async fn export_products(pool: &State<PgPool>, admin: CurrentAdmin) -> Result<CsvExport, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let products = repo.list_products().await?;

    info!(admin_id = %admin.id, count = products.len(), "product export");
    Ok(CsvExport {
        csv: spreadsheet::format_products(&products),
        disposition: Header::new("Content-Disposition", "attachment; filename=\"products.csv\""),
    })
}

#[rocket::post("/products/import", data = "<form>")]
pub async fn import_products(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    form: CsrfForm<ImportForm>,
) -> Result<Redirect, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let outcome = apply_import(&repo, &form.csv).await?;

    info!(
        admin_id = %admin.id,
        created = outcome.created,
        updated = outcome.updated,
        skipped = outcome.skipped,
        "product import"
    );
    Ok(Redirect::to(format!(
        "/admin/products?notice=imported:{}:{}:{}",
        outcome.created, outcome.updated, outcome.skipped
    )))
}

/// Upsert products from a pasted CSV snapshot, keyed by SKU. Rows that are
/// short or missing a required field are counted as skipped rather than
/// aborting the batch.
pub async fn apply_import<R>(repo: &R, csv_body: &str) -> Result<ImportOutcome, AppError>
where
    R: ProductRepository + CategoryRepository + Sync,
{
    let mut rows = spreadsheet::parse(csv_body)?.into_iter();
    let header = rows.next().ok_or_else(|| AppError::BadRequest("Empty CSV".to_string()))?;
    let expected: Vec<&str> = spreadsheet::PRODUCT_HEADER.split(',').collect();
    if header.iter().map(String::as_str).collect::<Vec<_>>() != expected {
        return Err(AppError::BadRequest(format!("Unexpected CSV header, expected: {}", spreadsheet::PRODUCT_HEADER)));
    }

    let mut outcome = ImportOutcome::default();
    for row in rows {
        if row.len() < 6 {
            outcome.skipped += 1;
            continue;
        }

        let name = row[0].trim();
        let sku = row[1].trim();
        let oem_number = row[2].trim();
        let category_slug = row[3].trim();
        let summary = row[4].trim();
        let is_active = matches!(row[5].trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");

        if name.is_empty() || sku.is_empty() || oem_number.is_empty() {
            outcome.skipped += 1;
            continue;
        }

        let category_id = if category_slug.is_empty() {
            None
        } else {
            repo.get_category_by_slug(category_slug).await?.map(|category| category.id)
        };

        let input = ProductInput {
            name: name.to_string(),
            sku: sku.to_string(),
            oem_number: oem_number.to_string(),
            summary: if summary.is_empty() { None } else { Some(summary.to_string()) },
            category_id,
            is_active,
        };

        match repo.get_product_by_sku(sku).await? {
            Some(existing) => {
                repo.update_product(&existing.id, &input).await?;
                outcome.updated += 1;
            }
            None => {
                repo.create_product(&input).await?;
                outcome.created += 1;
            }
        }
    }

    Ok(outcome)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_products,
        create_product,
        update_product,
        delete_product,
        export_products,
        import_products
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRepository;

    #[test]
    fn parse_category_id_handles_blank_and_invalid() {
        assert_eq!(parse_category_id("  ").unwrap(), None);
        assert!(parse_category_id("garbage").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_category_id(&id.to_string()).unwrap(), Some(id));
    }

    #[test]
    fn notice_text_expands_import_counts() {
        let text = notice_text(Some("imported:2:1:3")).expect("notice");
        assert!(text.contains("2 created"));
        assert!(text.contains("1 updated"));
        assert!(text.contains("3 skipped"));
    }

    #[tokio::test]
    async fn import_creates_and_updates_by_sku() {
        let repo = MockRepository::with_product_sku("BP-EXISTS");
        let csv = format!(
            "{}\nNew Pads,BP-NEW,OEM-1,,Fresh stock,true\nOld Pads,BP-EXISTS,OEM-2,,Restock,false\n",
            spreadsheet::PRODUCT_HEADER
        );

        let outcome = apply_import(&repo, &csv).await.expect("import");
        assert_eq!(outcome, ImportOutcome { created: 1, updated: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn import_skips_incomplete_rows() {
        let repo = MockRepository::default();
        let csv = format!("{}\n,missing-name,OEM-9,,x,true\nshort,row\n", spreadsheet::PRODUCT_HEADER);

        let outcome = apply_import(&repo, &csv).await.expect("import");
        assert_eq!(outcome, ImportOutcome { created: 0, updated: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn import_rejects_wrong_header() {
        let repo = MockRepository::default();
        let result = apply_import(&repo, "wrong,header\n").await;
        assert!(result.is_err());
    }
}
