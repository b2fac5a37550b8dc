use super::ticker::Candles;
use super::{merge_current, HistoryQuery};
use crate::error::ServiceResult;
use actix_web::{get, web, HttpResponse};
use argus_market::normalize::{now_iso, table_to_candles, Record};
use argus_market::Connector;
use serde_json::Value;

fn stamped(key: &str, value: String) -> Record {
    let mut rec = Record::new();
    rec.insert(key.to_string(), Value::String(value));
    rec.insert("timestamp".to_string(), Value::String(now_iso()));
    rec
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Current exchange rate
///
/// ```json
/// {
///     "symbol": "USD",
///     "timestamp": "2024-05-17T12:00:00Z",
///     "last": 32.21,
///     "change": 0.04,
///     // ...
/// }
/// ```
#[utoipa::path(
    get,
    path = "/fx/{currency}",
    responses(
        (status = 200, description = "Latest rate of a currency against the quote currency"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("currency" = String, Path, description = "ISO code (USD) or full pair (EURUSD)")
    )
)]
#[get("/fx/{currency}")]
pub async fn fx_current(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let code = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let current = market.fx_current(&code).await?;
    Ok(HttpResponse::Ok().json(merge_current(stamped("symbol", code), &current)))
}

#[utoipa::path(
    get,
    path = "/fx/{currency}/history",
    responses(
        (status = 200, description = "Exchange-rate candles, oldest first", body = Candles, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("currency" = String, Path, description = "ISO code (USD) or full pair (EURUSD)"),
        HistoryQuery
    )
)]
#[get("/fx/{currency}/history")]
pub async fn fx_history(
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let code = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.fx_history(&code, &query.period, &query.interval).await?;
    Ok(HttpResponse::Ok().json(Candles {
        candles: table_to_candles(Some(&frame)),
        symbol: code,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Current precious-metal price
///
/// `gold_type` is passed through as given: `ons`, `gram-altin`, `gumus-ons`,
/// `gram-gumus`.
#[utoipa::path(
    get,
    path = "/gold/{gold_type}",
    responses(
        (status = 200, description = "Latest metal price, per ounce in USD or per gram in the quote currency"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("gold_type" = String, Path, description = "ons, gram-altin, gumus-ons or gram-gumus")
    )
)]
#[get("/gold/{gold_type}")]
pub async fn gold_price(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let kind = path.into_inner();
    let market = connector.connect()?;
    let current = market.fx_current(&kind).await?;
    Ok(HttpResponse::Ok().json(merge_current(stamped("type", kind), &current)))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[utoipa::path(
    get,
    path = "/crypto/{pair}",
    responses(
        (status = 200, description = "Latest price of a crypto pair"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("pair" = String, Path, description = "Pair such as BTCUSDT or BTCTRY")
    )
)]
#[get("/crypto/{pair}")]
pub async fn crypto_current(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let pair = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let current = market.crypto_current(&pair).await?;
    Ok(HttpResponse::Ok().json(merge_current(stamped("pair", pair), &current)))
}
