use crate::models::health::HealthResponse;
use rocket::routes;
use rocket::serde::json::Json;

#[rocket::get("/health")]
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![healthcheck]
}

#[cfg(test)]
mod tests {
    use crate::{Config, build_rocket};
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    async fn health_check_works() {
        let client = Client::tracked(build_rocket(Config::default()))
            .await
            .expect("valid rocket instance");
        let response = client.get("/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("ok"));
    }
}
