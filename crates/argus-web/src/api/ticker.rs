use super::{reply_to_items, HistoryQuery, StatementQuery};
use crate::error::ServiceResult;
use actix_web::{get, web, HttpResponse};
use argus_market::normalize::{
    clean_signal_group, normalize_f64, now_iso, object_or_dict_to_map, sanitize_mapping,
    signal_summary, table_to_candles, table_to_records, table_to_records_keyed, Candle, Record,
    SignalGroup, SignalSummary,
};
use argus_market::{Connector, Reply};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Quote snapshot of a ticker
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    symbol: String,
    #[schema(value_type = Option<f64>)]
    last: Value,
    #[schema(value_type = Option<f64>)]
    open: Value,
    #[schema(value_type = Option<f64>)]
    high: Value,
    #[schema(value_type = Option<f64>)]
    low: Value,
    #[schema(value_type = Option<f64>)]
    previous_close: Value,
    #[schema(value_type = Option<f64>)]
    volume: Value,
    #[schema(value_type = Option<f64>)]
    change: Value,
    #[schema(value_type = Option<f64>)]
    market_cap: Value,
    #[schema(value_type = Option<f64>)]
    pe: Value,
    #[schema(value_type = Option<f64>)]
    free_float: Value,
    #[schema(value_type = Option<f64>)]
    foreign_ratio: Value,
    timestamp: String,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/quote",
    responses(
        (
            status = 200, description = "Latest price, day range and valuation of a ticker",
            body = Quote, content_type = "application/json",
            example = json!({
                "symbol": "THYAO", "last": 297.5, "open": 294.0, "high": 299.75, "low": 293.25,
                "previousClose": 294.5, "volume": 18233412.0, "change": 3.0,
                "marketCap": 410550000000.0, "pe": 3.1, "freeFloat": null, "foreignRatio": null,
                "timestamp": "2024-05-17T12:00:00Z"
            })
        ),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/quote")]
pub async fn quote(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let fi = market.fast_info(&symbol).await?;

    // day change when the previous close is known, the last price otherwise
    let change = match (fi.last_price, fi.previous_close) {
        (Some(last), Some(prev)) => Some(last - prev),
        (last, _) => last,
    };

    Ok(HttpResponse::Ok().json(Quote {
        symbol,
        last: normalize_f64(fi.last_price),
        open: normalize_f64(fi.open),
        high: normalize_f64(fi.day_high),
        low: normalize_f64(fi.day_low),
        previous_close: normalize_f64(fi.previous_close),
        volume: normalize_f64(fi.volume),
        change: normalize_f64(change),
        market_cap: normalize_f64(fi.market_cap),
        pe: normalize_f64(fi.pe_ratio),
        free_float: normalize_f64(fi.free_float),
        foreign_ratio: normalize_f64(fi.foreign_ratio),
        timestamp: now_iso(),
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct Candles {
    pub(crate) symbol: String,
    pub(crate) candles: Vec<Candle>,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/history",
    responses(
        (status = 200, description = "OHLCV candles, oldest first", body = Candles, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO"),
        HistoryQuery
    )
)]
#[get("/ticker/{symbol}/history")]
pub async fn history(
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.history(&symbol, &query.period, &query.interval).await?;
    Ok(HttpResponse::Ok().json(Candles {
        candles: table_to_candles(Some(&frame)),
        symbol,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Balance sheet and income statement, one record per reporting date
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    symbol: String,
    #[schema(value_type = Vec<Object>)]
    balance_sheet: Vec<Record>,
    #[schema(value_type = Vec<Object>)]
    income_statement: Vec<Record>,
    /// `{pe, marketCap}`, empty when the quote is unavailable
    #[schema(value_type = Object)]
    ratios: Record,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/financials",
    responses(
        (status = 200, description = "Balance sheet, income statement and headline ratios", body = Financials, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO"),
        StatementQuery
    )
)]
#[get("/ticker/{symbol}/financials")]
pub async fn financials(
    path: web::Path<String>,
    query: web::Query<StatementQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let balance_sheet = market.balance_sheet(&symbol, query.quarterly).await?;
    let income_statement = market.income_stmt(&symbol, query.quarterly).await?;

    let mut ratios = Record::new();
    match market.fast_info(&symbol).await {
        Ok(fi) => {
            ratios.insert("pe".to_string(), normalize_f64(fi.pe_ratio));
            ratios.insert("marketCap".to_string(), normalize_f64(fi.market_cap));
        }
        Err(e) => warn!("[{symbol}] ratios left empty: {e:#}"),
    }

    Ok(HttpResponse::Ok().json(Financials {
        balance_sheet: table_to_records(balance_sheet.as_ref()),
        income_statement: table_to_records(income_statement.as_ref()),
        ratios,
        symbol,
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Cashflow {
    symbol: String,
    #[schema(value_type = Vec<Object>)]
    cashflow: Vec<Record>,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/cashflow",
    responses(
        (status = 200, description = "Cash-flow statement, one record per reporting date", body = Cashflow, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO"),
        StatementQuery
    )
)]
#[get("/ticker/{symbol}/cashflow")]
pub async fn cashflow(
    path: web::Path<String>,
    query: web::Query<StatementQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.cashflow(&symbol, query.quarterly).await?;
    Ok(HttpResponse::Ok().json(Cashflow {
        cashflow: table_to_records(frame.as_ref()),
        symbol,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct Dividends {
    symbol: String,
    /// Records keyed by `date`
    #[schema(value_type = Vec<Object>)]
    dividends: Vec<Record>,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/dividends",
    responses(
        (
            status = 200, description = "Dividend payments",
            body = Dividends, content_type = "application/json",
            example = json!({"symbol": "THYAO", "dividends": [{"date": "2024-06-04T06:30:00Z", "Dividends": 8.07}]})
        ),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/dividends")]
pub async fn dividends(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.dividends(&symbol).await?;
    Ok(HttpResponse::Ok().json(Dividends {
        dividends: table_to_records_keyed(frame.as_ref(), "date"),
        symbol,
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Splits {
    symbol: String,
    #[schema(value_type = Vec<Object>)]
    splits: Vec<Record>,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/splits",
    responses(
        (status = 200, description = "Share splits and capital increases", body = Splits, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/splits")]
pub async fn splits(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let frame = market.splits(&symbol).await?;
    Ok(HttpResponse::Ok().json(Splits {
        splits: table_to_records(frame.as_ref()),
        symbol,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Analyst coverage; blocks the source has nothing for are left out
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analysts {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    price_targets: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    recommendations: Option<Record>,
}

fn present(reply: Reply) -> Option<Record> {
    (!reply.is_missing()).then(|| object_or_dict_to_map(&reply))
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/analysts",
    responses(
        (
            status = 200, description = "Analyst price targets and recommendation trend",
            body = Analysts, content_type = "application/json",
            example = json!({
                "symbol": "THYAO",
                "priceTargets": {"current": 297.5, "low": 280.0, "high": 520.0, "mean": 415.3, "numberOfAnalysts": 14},
                "recommendations": {"strongBuy": {"0m": 6, "-1m": 5}, "buy": {"0m": 7, "-1m": 8}}
            })
        ),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/analysts")]
pub async fn analysts(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let targets = market.analyst_price_targets(&symbol).await?;
    let recommendations = market.recommendations_summary(&symbol).await?;
    Ok(HttpResponse::Ok().json(Analysts {
        price_targets: present(targets),
        recommendations: present(recommendations),
        symbol,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize, utoipa::ToSchema)]
pub struct News {
    symbol: String,
    #[schema(value_type = Vec<Object>)]
    news: Vec<Value>,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/news",
    responses(
        (status = 200, description = "Recent headlines about a ticker", body = News, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/news")]
pub async fn news(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let reply = market.news(&symbol).await?;
    Ok(HttpResponse::Ok().json(News {
        news: reply_to_items(&reply),
        symbol,
    }))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct Info {
    symbol: String,
    #[schema(value_type = Object)]
    info: Record,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/info",
    responses(
        (status = 200, description = "Company profile, key statistics and financial data", body = Info, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO")
    )
)]
#[get("/ticker/{symbol}/info")]
pub async fn info(
    path: web::Path<String>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let market = connector.connect()?;
    let reply = market.info(&symbol).await?;
    Ok(HttpResponse::Ok().json(Info {
        info: reply.as_mapping().map(sanitize_mapping).unwrap_or_default(),
        symbol,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn default_timeframe() -> String {
    "1d".to_string()
}

#[derive(Deserialize, Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignalsQuery {
    /// 1m, 5m, 15m, 30m, 1h, 2h, 4h, 1d, 1W, 1M
    #[serde(default = "default_timeframe")]
    #[param(default = "1d")]
    pub timeframe: String,
}

/// Technical indicator calls, grouped
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaSignals {
    symbol: String,
    timeframe: String,
    summary: SignalSummary,
    oscillators: SignalGroup,
    moving_averages: SignalGroup,
    timestamp: String,
}

#[utoipa::path(
    get,
    path = "/ticker/{symbol}/ta-signals",
    responses(
        (
            status = 200, description = "Oscillator and moving-average signals with an overall call",
            body = TaSignals, content_type = "application/json",
            example = json!({
                "symbol": "THYAO", "timeframe": "1d",
                "summary": {"recommendation": "BUY", "buy": 11, "sell": 4, "neutral": 4},
                "oscillators": {"recommendation": "NEUTRAL", "values": {"RSI": {"value": 55.2, "signal": "NEUTRAL"}}},
                "movingAverages": {"recommendation": "STRONG_BUY", "values": {"EMA10": {"value": 291.4, "signal": "BUY"}}},
                "timestamp": "2024-05-17T12:00:00Z"
            })
        ),
        (status = 500, description = "Upstream failure")
    ),
    params(
        ("symbol" = String, Path, description = "Exchange ticker, e.g. THYAO"),
        SignalsQuery
    )
)]
#[get("/ticker/{symbol}/ta-signals")]
pub async fn ta_signals(
    path: web::Path<String>,
    query: web::Query<SignalsQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbol = path.into_inner().to_uppercase();
    let timeframe = query.into_inner().timeframe;
    let market = connector.connect()?;
    let reply = market.ta_signals(&symbol, &timeframe).await?;

    let (summary, oscillators, moving_averages) = match reply.as_mapping() {
        Some(signals) => (
            signal_summary(signals.get("summary"))?,
            clean_signal_group(signals.get("oscillators")),
            clean_signal_group(signals.get("moving_averages")),
        ),
        None => Default::default(),
    };

    Ok(HttpResponse::Ok().json(TaSignals {
        symbol,
        timeframe,
        summary,
        oscillators,
        moving_averages,
        timestamp: now_iso(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{get, price_frame, FakeMarket};
    use actix_web::http::StatusCode;
    use argus_market::{Datum, FastInfo, Frame, Mapping, Reply, RowKey, Scalar};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_history_nulls_nan_closes_in_order() {
        let market = FakeMarket {
            history: price_frame(&[101.0, f64::NAN, 103.5, f64::INFINITY]),
            ..Default::default()
        };
        let (status, body) = get(market.clone(), "/ticker/thyao/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "THYAO");

        let candles = body["candles"].as_array().unwrap();
        let closes: Vec<&Value> = candles.iter().map(|c| &c["close"]).collect();
        assert_eq!(closes, vec![&json!(101.0), &Value::Null, &json!(103.5), &Value::Null]);
        assert_eq!(candles[0]["date"], "2024-01-02T07:00:00Z");
        assert_eq!(candles[3]["date"], "2024-01-05T07:00:00Z");
        assert_eq!(candles[0]["volume"], 1000);
        assert_eq!(market.calls(), vec!["history:THYAO:1ay:1d"]);
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_500_with_detail() {
        let market = FakeMarket {
            fail: true,
            ..Default::default()
        };
        let (status, body) = get(market, "/ticker/THYAO/quote").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "upstream unavailable");
    }

    #[actix_web::test]
    async fn test_quote_fields() {
        let market = FakeMarket {
            fast_info: Some(FastInfo {
                last_price: Some(297.5),
                previous_close: Some(294.5),
                pe_ratio: Some(f64::NAN),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (status, body) = get(market, "/ticker/thyao/quote").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "THYAO");
        assert_eq!(body["last"], 297.5);
        assert_eq!(body["previousClose"], 294.5);
        assert_eq!(body["change"], 3.0);
        assert_eq!(body["pe"], Value::Null);
        assert_eq!(body["freeFloat"], Value::Null);
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    fn statement() -> Frame {
        let mut frame = Frame::new(["TotalAssets", "NetIncome"]);
        frame.push_row(RowKey::Label("2023-12-31".into()), vec![Scalar::Float(1.5e11), Scalar::Float(f64::NAN)]);
        frame
    }

    #[actix_web::test]
    async fn test_financials_ratios_are_best_effort() {
        let market = FakeMarket {
            statement: Some(statement()),
            fast_info: None,
            ..Default::default()
        };
        let (status, body) = get(market.clone(), "/ticker/thyao/financials?quarterly=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ratios"], json!({}));
        assert_eq!(body["balanceSheet"][0]["index"], "2023-12-31");
        assert_eq!(body["balanceSheet"][0]["TotalAssets"], 1.5e11);
        assert_eq!(body["incomeStatement"][0]["NetIncome"], Value::Null);
        assert!(market.calls().contains(&"balance_sheet:THYAO:true".to_string()));

        let market = FakeMarket {
            fast_info: Some(FastInfo {
                pe_ratio: Some(4.2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (_, body) = get(market, "/ticker/thyao/financials").await;
        assert_eq!(body["ratios"], json!({"pe": 4.2, "marketCap": null}));
        assert_eq!(body["balanceSheet"], json!([]));
    }

    #[actix_web::test]
    async fn test_dividends_keyed_by_date() {
        let mut events = Frame::new(["Dividends"]);
        events.push_row(RowKey::Label("2024-06-04".into()), vec![Scalar::Float(8.07)]);
        let market = FakeMarket {
            events: Some(events),
            ..Default::default()
        };
        let (_, body) = get(market.clone(), "/ticker/thyao/dividends").await;
        assert_eq!(body["dividends"], json!([{"date": "2024-06-04", "Dividends": 8.07}]));

        let (_, body) = get(market, "/ticker/thyao/splits").await;
        assert_eq!(body["splits"], json!([{"index": "2024-06-04", "Dividends": 8.07}]));
    }

    #[actix_web::test]
    async fn test_analysts_omit_missing_blocks() {
        let mut targets = Mapping::new();
        targets.insert("mean", 415.25);
        targets.insert("high", f64::NAN);
        let market = FakeMarket {
            price_targets: Some(Reply::from(targets)),
            ..Default::default()
        };
        let (status, body) = get(market, "/ticker/thyao/analysts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"symbol": "THYAO", "priceTargets": {"mean": 415.25, "high": null}}));

        let mut trend = Frame::new(["strongBuy"]);
        trend.push_row(RowKey::Label("0m".into()), vec![Scalar::Int(6)]);
        let market = FakeMarket {
            recommendations: Some(Reply::Table(trend)),
            ..Default::default()
        };
        let (_, body) = get(market, "/ticker/thyao/analysts").await;
        assert_eq!(body["recommendations"], json!({"strongBuy": {"0m": 6}}));
        assert!(body.get("priceTargets").is_none());
    }

    #[actix_web::test]
    async fn test_news_and_info_shapes() {
        let mut headlines = Frame::new(["title"]);
        headlines.push_row(RowKey::Position(0), vec![Scalar::from("Record passenger numbers")]);
        let market = FakeMarket {
            news: Some(Reply::Table(headlines)),
            info: Some(Reply::Value(Datum::Scalar(Scalar::from("not a mapping")))),
            ..Default::default()
        };
        let (_, body) = get(market.clone(), "/ticker/thyao/news").await;
        assert_eq!(body["news"], json!([{"index": "0", "title": "Record passenger numbers"}]));

        let (_, body) = get(market, "/ticker/thyao/info").await;
        assert_eq!(body["info"], json!({}));

        let (_, body) = get(FakeMarket::default(), "/ticker/thyao/news").await;
        assert_eq!(body["news"], json!([]));
    }

    #[actix_web::test]
    async fn test_ta_signals_shape() {
        let mut summary = Mapping::new();
        summary.insert("recommendation", "BUY");
        summary.insert("buy", 11_i64);
        summary.insert("sell", 4.0);
        let mut rsi = Mapping::new();
        rsi.insert("value", f64::NAN);
        rsi.insert("signal", "NEUTRAL");
        let mut oscillators = Mapping::new();
        oscillators.insert("recommendation", "SELL");
        oscillators.insert("RSI", rsi);
        oscillators.insert("Mom", -2.5);
        let mut signals = Mapping::new();
        signals.insert("summary", summary);
        signals.insert("oscillators", oscillators);

        let market = FakeMarket {
            signals: Some(Reply::from(signals)),
            ..Default::default()
        };
        let (status, body) = get(market.clone(), "/ticker/thyao/ta-signals?timeframe=4h").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeframe"], "4h");
        assert_eq!(body["summary"], json!({"recommendation": "BUY", "buy": 11, "sell": 4, "neutral": 0}));
        assert_eq!(
            body["oscillators"],
            json!({
                "recommendation": "SELL",
                "values": {
                    "RSI": {"value": null, "signal": "NEUTRAL"},
                    "Mom": {"value": -2.5, "signal": "NEUTRAL"}
                }
            })
        );
        assert_eq!(body["movingAverages"], json!({"recommendation": "NEUTRAL", "values": {}}));
        assert_eq!(market.calls(), vec!["ta_signals:THYAO:4h"]);
    }

    #[actix_web::test]
    async fn test_ta_signals_bad_count_fails() {
        let mut summary = Mapping::new();
        summary.insert("buy", "many");
        let mut signals = Mapping::new();
        signals.insert("summary", summary);
        let market = FakeMarket {
            signals: Some(Reply::from(signals)),
            ..Default::default()
        };
        let (status, body) = get(market, "/ticker/thyao/ta-signals").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("buy"));
    }
}
