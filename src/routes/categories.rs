use crate::config::Config;
use crate::csrf;
use crate::database::category::CategoryRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::forms::{ConfirmForm, CsrfForm};
use crate::models::admin::CurrentAdmin;
use crate::models::category::{Category, CategoryForm, CategoryInput};
use crate::routes::render;
use askama::Template;
use rocket::State;
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::routes;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Template)]
#[template(path = "admin/categories.html")]
struct CategoriesTemplate {
    site_name: String,
    admin_name: String,
    csrf_token: String,
    notice: Option<String>,
    categories: Vec<Category>,
}

fn notice_text(notice: Option<&str>) -> Option<String> {
    match notice? {
        "created" => Some("Category created.".to_string()),
        "updated" => Some("Category updated.".to_string()),
        "deleted" => Some("Category deleted.".to_string()),
        _ => None,
    }
}

#[rocket::get("/categories?<notice>")]
pub async fn list_categories(
    pool: &State<PgPool>,
    config: &State<Config>,
    admin: CurrentAdmin,
    notice: Option<&str>,
) -> Result<RawHtml<String>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let categories = repo.list_categories().await?;

    render(&CategoriesTemplate {
        site_name: config.site.name.clone(),
        admin_name: admin.display_name().to_string(),
        csrf_token: csrf::issue_token(&admin.session).to_string(),
        notice: notice_text(notice),
        categories,
    })
}

#[rocket::post("/categories", data = "<form>")]
pub async fn create_category(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    form: CsrfForm<CategoryForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let input = CategoryInput::from(&form.0);
    let category = repo.create_category(&input).await?;

    info!(admin_id = %admin.id, category_id = %category.id, slug = %category.slug, "category created");
    Ok(Redirect::to("/admin/categories?notice=created"))
}

#[rocket::post("/categories/<id>", data = "<form>")]
pub async fn update_category(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    id: &str,
    form: CsrfForm<CategoryForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid category id".to_string()))?;
    let input = CategoryInput::from(&form.0);
    let category = repo.update_category(&uuid, &input).await?;

    info!(admin_id = %admin.id, category_id = %category.id, slug = %category.slug, "category updated");
    Ok(Redirect::to("/admin/categories?notice=updated"))
}

#[rocket::post("/categories/<id>/delete", data = "<_form>")]
pub async fn delete_category(
    pool: &State<PgPool>,
    admin: CurrentAdmin,
    id: &str,
    _form: CsrfForm<ConfirmForm>,
) -> Result<Redirect, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid category id".to_string()))?;
    repo.delete_category(&uuid).await?;

    info!(admin_id = %admin.id, category_id = %uuid, "category deleted");
    Ok(Redirect::to("/admin/categories?notice=deleted"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_categories, create_category, update_category, delete_category]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_text_only_maps_known_codes() {
        assert!(notice_text(Some("created")).is_some());
        assert!(notice_text(Some("bogus")).is_none());
        assert!(notice_text(None).is_none());
    }
}
