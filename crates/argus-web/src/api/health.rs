use actix_web::{get, HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (
            status = 200, description = "Service liveness",
            body = Health, content_type = "application/json",
            example = json!({"status": "ok", "service": "argus-web", "version": "0.1.0"})
        )
    )
)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(Health {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{get, FakeMarket};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_health_skips_the_market() {
        let market = FakeMarket {
            fail: true,
            ..Default::default()
        };
        let (status, body) = get(market.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "argus-web");
        assert!(market.calls().is_empty());
    }
}
