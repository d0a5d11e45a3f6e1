pub mod admin;
pub mod categories;
pub mod error;
pub mod health;
pub mod products;
pub mod site;

use crate::error::app_error::AppError;
use askama::Template;
use rocket::response::content::RawHtml;

/// Render an askama template into an HTML response.
pub(crate) fn render<T: Template>(template: &T) -> Result<RawHtml<String>, AppError> {
    Ok(RawHtml(template.render()?))
}
