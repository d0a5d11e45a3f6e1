use rocket::catch;
use rocket::response::Redirect;
use rocket::response::content::RawHtml;

#[catch(404)]
pub fn not_found() -> RawHtml<&'static str> {
    RawHtml(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>Page not found</title>
<link rel="stylesheet" href="/static/css/site.css"></head>
<body class="error-page"><main><h1>Page not found</h1>
<p>The page you were looking for does not exist. <a href="/">Back to the catalog.</a></p></main></body></html>"#,
    )
}

/// Admin guards reject unauthenticated requests with 401; the browser is sent
/// to the login page with a neutral notice instead of an error body.
#[catch(401)]
pub fn unauthorized() -> Redirect {
    Redirect::to("/admin/login?notice=signin")
}

/// CSRF rejections surface as 403 before any handler logic; same neutral
/// bounce to the login page.
#[catch(403)]
pub fn forbidden() -> Redirect {
    Redirect::to("/admin/login?notice=expired")
}

#[catch(500)]
pub fn internal_error() -> RawHtml<&'static str> {
    RawHtml(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>Something went wrong</title>
<link rel="stylesheet" href="/static/css/site.css"></head>
<body class="error-page"><main><h1>Something went wrong</h1>
<p>An unexpected error occurred. Please try again.</p></main></body></html>"#,
    )
}

#[catch(503)]
pub fn service_unavailable() -> RawHtml<&'static str> {
    RawHtml(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>Temporarily unavailable</title>
<link rel="stylesheet" href="/static/css/site.css"></head>
<body class="error-page"><main><h1>Temporarily unavailable</h1>
<p>The service is briefly unavailable. Please try again in a moment.</p></main></body></html>"#,
    )
}
