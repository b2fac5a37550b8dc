use super::{reply_to_items, HistoryQuery};
use crate::error::ServiceResult;
use actix_web::{get, web, HttpResponse};
use anyhow::anyhow;
use argus_market::normalize::{now_iso, sanitize_mapping, table_to_candles, Candle, Record};
use argus_market::{Connector, Datum, Reply};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct IndexData {
    code: String,
    /// Empty when the source has no summary for the index
    #[schema(value_type = Object)]
    info: Record,
    timestamp: String,
}

#[utoipa::path(
    get,
    path = "/index/{code}",
    responses(
        (
            status = 200, description = "Latest level and day range of an index",
            body = IndexData, content_type = "application/json",
            example = json!({
                "code": "XU100",
                "info": {"last": 9612.3, "previousClose": 9580.1, "change": 32.2, "currency": "TRY"},
                "timestamp": "2024-05-17T12:00:00Z"
            })
        ),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("code" = String, Path, description = "Index code, e.g. XU100 or XU030")
    )
)]
#[get("/index/{code}")]
pub async fn index_data(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let code = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let info = match market.index_info(&code).await {
        Ok(reply) => reply.as_mapping().map(sanitize_mapping).unwrap_or_default(),
        Err(e) => {
            warn!("[{code}] index info left empty: {e:#}");
            Record::new()
        }
    };
    Ok(HttpResponse::Ok().json(IndexData {
        code,
        info,
        timestamp: now_iso(),
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IndexCandles {
    code: String,
    candles: Vec<Candle>,
}

#[utoipa::path(
    get,
    path = "/index/{code}/history",
    responses(
        (status = 200, description = "Index candles, oldest first", body = IndexCandles, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("code" = String, Path, description = "Index code, e.g. XU100 or XU030"),
        HistoryQuery
    )
)]
#[get("/index/{code}/history")]
pub async fn index_history(
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let code = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.index_history(&code, &query.period, &query.interval).await?;
    Ok(HttpResponse::Ok().json(IndexCandles {
        candles: table_to_candles(Some(&frame)),
        code,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct Components {
    code: String,
    /// Members as `{symbol, name}`, largest market cap first
    #[schema(value_type = Vec<Object>)]
    components: Vec<Value>,
}

#[utoipa::path(
    get,
    path = "/index/{code}/components",
    responses(
        (
            status = 200, description = "Index members", body = Components, content_type = "application/json",
            example = json!({
                "code": "XU030",
                "components": [{"symbol": "ASELS", "name": "ASELSAN"}, {"symbol": "THYAO", "name": "TURK HAVA YOLLARI"}]
            })
        ),
        (status = 500, description = "Upstream failure, or no members listed for the index")
    ),
    params(
        ("code" = String, Path, description = "Index code, e.g. XU100 or XU030")
    )
)]
#[get("/index/{code}/components")]
pub async fn index_components(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let code = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let reply = market.index_components(&code).await?;
    if let Reply::Value(Datum::Scalar(s)) = &reply {
        return Err(anyhow!("unexpected member list for {code}: {s}").into());
    }
    Ok(HttpResponse::Ok().json(Components {
        components: reply_to_items(&reply),
        code,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{get, price_frame, FakeMarket};
    use actix_web::http::StatusCode;
    use argus_market::{Datum, Mapping, Reply, Scalar};
    use serde_json::json;

    #[actix_web::test]
    async fn test_index_info_is_best_effort() {
        let (status, body) = get(FakeMarket::default(), "/index/xu100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "XU100");
        assert_eq!(body["info"], json!({}));

        let mut info = Mapping::new();
        info.insert("last", 9612.3);
        let market = FakeMarket {
            index_info: Some(Reply::from(info)),
            ..Default::default()
        };
        let (_, body) = get(market, "/index/xu100").await;
        assert_eq!(body["info"], json!({"last": 9612.3}));
    }

    #[actix_web::test]
    async fn test_index_history_uses_code_key() {
        let market = FakeMarket {
            history: price_frame(&[9600.0]),
            ..Default::default()
        };
        let (_, body) = get(market, "/index/xu030/history").await;
        assert_eq!(body["code"], "XU030");
        assert_eq!(body["candles"][0]["close"], 9600.0);
    }

    #[actix_web::test]
    async fn test_components_shapes() {
        let market = FakeMarket {
            components: Some(Reply::Value(Datum::List(vec![
                Datum::from("THYAO"),
                Datum::from("GARAN"),
            ]))),
            ..Default::default()
        };
        let (_, body) = get(market, "/index/xu030/components").await;
        assert_eq!(body["components"], json!(["THYAO", "GARAN"]));

        let (_, body) = get(FakeMarket::default(), "/index/xu030/components").await;
        assert_eq!(body["components"], json!([]));

        let market = FakeMarket {
            components: Some(Reply::Value(Datum::Scalar(Scalar::Int(30)))),
            ..Default::default()
        };
        let (status, _) = get(market, "/index/xu030/components").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
