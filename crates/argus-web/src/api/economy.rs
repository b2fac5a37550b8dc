use crate::error::ServiceResult;
use actix_web::{get, web, HttpResponse};
use argus_market::normalize::{normalize_scalar, now_iso, object_or_dict_to_map, table_to_records};
use argus_market::{Connector, Reply};
use serde::Serialize;
use serde_json::Value;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Latest consumer-price print
///
/// ```json
/// {
///     "date": "2024-4",
///     "cpi": 2139.47,
///     "monthlyInflation": 3.18,
///     "yearlyInflation": 69.8
/// }
/// ```
#[utoipa::path(
    get,
    path = "/inflation",
    responses(
        (status = 200, description = "Latest CPI level with monthly and yearly change, in percent"),
        (status = 500, description = "Upstream failure")
    )
)]
#[get("/inflation")]
pub async fn inflation(connector: web::Data<dyn Connector>) -> ServiceResult<HttpResponse> {
    let market = connector.connect()?;
    let latest = market.inflation_latest().await?;
    Ok(HttpResponse::Ok().json(object_or_dict_to_map(&latest)))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct Bonds {
    /// Yield records, or the raw reply as text when it is not a table
    #[schema(value_type = Object)]
    yields: Value,
}

#[utoipa::path(
    get,
    path = "/bond",
    responses(
        (
            status = 200, description = "Government bond yields",
            body = Bonds, content_type = "application/json",
            example = json!({"yields": [{"index": "^TNX", "name": "CBOE Interest Rate 10 Year T No", "yield": 4.42, "previousClose": 4.38, "change": 0.04}]})
        ),
        (status = 500, description = "Upstream failure")
    )
)]
#[get("/bond")]
pub async fn bond_yields(connector: web::Data<dyn Connector>) -> ServiceResult<HttpResponse> {
    let market = connector.connect()?;
    let reply = market.bond_yields().await?;
    let yields = match &reply {
        Reply::Table(frame) => Value::from(
            table_to_records(Some(frame))
                .into_iter()
                .map(Value::Object)
                .collect::<Vec<_>>(),
        ),
        Reply::Missing => Value::Array(vec![]),
        other => Value::String(other.to_string()),
    };
    Ok(HttpResponse::Ok().json(Bonds { yields }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct PolicyRate {
    #[schema(value_type = Option<f64>)]
    rate: Value,
    timestamp: String,
}

#[utoipa::path(
    get,
    path = "/tcmb/policy-rate",
    responses(
        (
            status = 200, description = "Central bank policy rate, in percent",
            body = PolicyRate, content_type = "application/json",
            example = json!({"rate": 50.0, "timestamp": "2024-05-17T12:00:00Z"})
        ),
        (status = 500, description = "Upstream failure")
    )
)]
#[get("/tcmb/policy-rate")]
pub async fn policy_rate(connector: web::Data<dyn Connector>) -> ServiceResult<HttpResponse> {
    let market = connector.connect()?;
    let rate = market.policy_rate().await?;
    Ok(HttpResponse::Ok().json(PolicyRate {
        rate: normalize_scalar(&rate),
        timestamp: now_iso(),
    }))
}
