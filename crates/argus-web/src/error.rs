use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;
use tracing::error;

/// Any failure behind a route; always answered with HTTP 500 and a
/// `{"detail": ...}` body.
#[derive(Debug)]
pub struct ServiceError(anyhow::Error);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl<E> From<E> for ServiceError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        ServiceError(e.into())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let detail = self.to_string();
        error!("request failed: {detail}");
        HttpResponse::InternalServerError().json(json!({ "detail": detail }))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
