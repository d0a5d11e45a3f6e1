use crate::config::Config;
use crate::database::category::CategoryRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::product::ProductRepository;
use crate::error::app_error::AppError;
use crate::models::contact::ContactForm;
use crate::models::product::{Product, ProductView};
use crate::routes::render;
use crate::service::email::EmailService;
use crate::service::richtext::render_rich_text;
use askama::Template;
use rocket::State;
use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::routes;
use sqlx::PgPool;
use tracing::{error, info};
use validator::Validate;

#[derive(Template)]
#[template(path = "site/home.html")]
struct HomeTemplate {
    site_name: String,
    page: &'static str,
    recent_products: Vec<ProductView>,
    featured_products: Vec<ProductView>,
}

#[derive(Template)]
#[template(path = "site/about.html")]
struct AboutTemplate {
    site_name: String,
    page: &'static str,
}

struct CategoryLink {
    name: String,
    slug: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "site/catalog.html")]
struct CatalogTemplate {
    site_name: String,
    page: &'static str,
    products: Vec<ProductView>,
    categories: Vec<CategoryLink>,
    any_filter: bool,
}

#[derive(Template)]
#[template(path = "site/contact.html")]
struct ContactTemplate {
    site_name: String,
    page: &'static str,
    sent: bool,
    error: Option<String>,
}

fn serialize_product(product: &Product) -> ProductView {
    let summary_html = render_rich_text(product.summary.as_deref().unwrap_or(""));
    ProductView::new(product, summary_html)
}

#[rocket::get("/")]
pub async fn home(pool: &State<PgPool>, config: &State<Config>) -> Result<RawHtml<String>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let products = repo.list_active_products(None, Some(6)).await?;
    let featured: Vec<ProductView> = products.iter().map(serialize_product).collect();
    let recent: Vec<ProductView> = featured.iter().take(3).cloned().collect();

    render(&HomeTemplate {
        site_name: config.site.name.clone(),
        page: "home",
        recent_products: recent,
        featured_products: featured,
    })
}

#[rocket::get("/about")]
pub async fn about(config: &State<Config>) -> Result<RawHtml<String>, AppError> {
    render(&AboutTemplate {
        site_name: config.site.name.clone(),
        page: "about",
    })
}

#[rocket::get("/catalog?<category>")]
pub async fn catalog(
    pool: &State<PgPool>,
    config: &State<Config>,
    category: Option<String>,
) -> Result<RawHtml<String>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let products = repo.list_active_products(category.as_deref(), None).await?;
    let categories = repo
        .list_active_categories()
        .await?
        .into_iter()
        .map(|c| CategoryLink {
            active: category.as_deref() == Some(c.slug.as_str()),
            name: c.name,
            slug: c.slug,
        })
        .collect();

    render(&CatalogTemplate {
        site_name: config.site.name.clone(),
        page: "catalog",
        products: products.iter().map(serialize_product).collect(),
        categories,
        any_filter: category.is_some(),
    })
}

#[rocket::get("/contact")]
pub async fn contact(config: &State<Config>) -> Result<RawHtml<String>, AppError> {
    render(&ContactTemplate {
        site_name: config.site.name.clone(),
        page: "contact",
        sent: false,
        error: None,
    })
}

#[rocket::post("/contact", data = "<form>")]
pub async fn contact_submit(
    config: &State<Config>,
    email: &State<EmailService>,
    form: Form<ContactForm>,
) -> Result<RawHtml<String>, AppError> {
    let site_name = config.site.name.clone();

    if form.validate().is_err() {
        return render(&ContactTemplate {
            site_name,
            page: "contact",
            sent: false,
            error: Some("Please fill in your name, a valid email address, and a message.".to_string()),
        });
    }

    match email
        .send_contact_inquiry(&config.site.contact_recipient, &form.name, &form.email, &form.message)
        .await
    {
        Ok(()) => {
            info!(reply_to = %form.email, "contact inquiry accepted");
            render(&ContactTemplate {
                site_name,
                page: "contact",
                sent: true,
                error: None,
            })
        }
        Err(err) => {
            error!(error = ?err, "contact inquiry could not be forwarded");
            render(&ContactTemplate {
                site_name,
                page: "contact",
                sent: false,
                error: Some("We could not send your message right now. Please try again later.".to_string()),
            })
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![home, about, catalog, contact, contact_submit]
}

#[cfg(test)]
mod tests {
    use crate::{Config, build_rocket};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    async fn about_page_renders() {
        let client = Client::tracked(build_rocket(Config::default()))
            .await
            .expect("valid rocket instance");
        let response = client.get("/about").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("About Showroom"));
    }

    #[rocket::async_test]
    async fn contact_page_renders_form() {
        let client = Client::tracked(build_rocket(Config::default()))
            .await
            .expect("valid rocket instance");
        let response = client.get("/contact").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("name=\"message\""));
    }

    #[rocket::async_test]
    async fn invalid_contact_submission_is_rejected_with_notice() {
        let client = Client::tracked(build_rocket(Config::default()))
            .await
            .expect("valid rocket instance");
        let response = client
            .post("/contact")
            .header(ContentType::Form)
            .body("name=Jo&email=not-an-email&message=hi")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("valid email address"));
    }

    #[rocket::async_test]
    async fn valid_contact_submission_with_disabled_email_succeeds() {
        let client = Client::tracked(build_rocket(Config::default()))
            .await
            .expect("valid rocket instance");
        let response = client
            .post("/contact")
            .header(ContentType::Form)
            .body("name=Jo&email=jo%40example.com&message=Do+you+stock+OEM-77%3F")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("your message is on its way"));
    }
}
