use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::FromForm;
use serde::Serialize;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("invalid slug regex"));

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub level: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromForm, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 160), custom(function = "validate_slug"))]
    pub slug: String,
    pub description: Option<String>,
    #[field(default = 0)]
    pub level: i32,
    #[field(default = 0)]
    pub position: i32,
    #[field(default = false)]
    pub is_active: bool,
    pub csrf_token: String,
}

impl Category {
    /// Template helper for the description prefill.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Repository-facing shape of a category write, shared by the admin form
/// handlers and tests.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub level: i32,
    pub position: i32,
    pub is_active: bool,
}

impl From<&CategoryForm> for CategoryInput {
    fn from(form: &CategoryForm) -> Self {
        Self {
            name: form.name.trim().to_string(),
            slug: form.slug.trim().to_string(),
            description: form.description.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(String::from),
            level: form.level,
            position: form.position,
            is_active: form.is_active,
        }
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

impl crate::forms::CsrfGuarded for CategoryForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_accepts_kebab_case() {
        assert!(validate_slug("brake-pads").is_ok());
        assert!(validate_slug("oil2").is_ok());
    }

    #[test]
    fn slug_rejects_uppercase_and_spaces() {
        assert!(validate_slug("Brake Pads").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }
}
