use super::default_period;
use crate::error::ServiceResult;
use actix_web::{get, web, HttpResponse};
use argus_market::normalize::{table_to_candles, Candle};
use argus_market::{Connector, Frame};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Deserialize, Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Comma separated tickers, e.g. THYAO,GARAN,AKBNK
    pub symbols: String,

    #[serde(default = "default_period")]
    #[param(default = "1ay")]
    pub period: String,
}

/// Candles of several tickers from one request
///
/// ```json
/// {
///     "symbols": ["THYAO", "GARAN"],
///     "data": {
///         "THYAO": [{"date": "2024-05-02T06:00:00Z", "open": 294.0, "high": 299.75, "low": 293.25, "close": 297.5, "volume": 18233412}],
///         "GARAN": [...]
///     }
/// }
/// ```
#[derive(Serialize, utoipa::ToSchema)]
pub struct Download {
    symbols: Vec<String>,
    /// Keyed in request order
    data: IndexMap<String, Vec<Candle>>,
}

/// Split a symbol-grouped frame into per-symbol candles.
///
/// Symbols the frame has no columns for are left out. A frame without
/// symbol groups belongs to the first requested symbol as a whole.
fn split_by_symbol(frame: &Frame, symbols: &[String]) -> IndexMap<String, Vec<Candle>> {
    let mut data = IndexMap::new();
    for symbol in symbols {
        if !frame.is_multi_level() {
            data.insert(symbol.clone(), table_to_candles(Some(frame)));
            break;
        }
        let present = frame
            .columns()
            .iter()
            .any(|c| c.group.as_deref() == Some(symbol.as_str()));
        if !present {
            debug!("[{symbol}] absent from download");
            continue;
        }
        if let Some(sub) = frame.xs(symbol) {
            data.insert(symbol.clone(), table_to_candles(Some(&sub)));
        }
    }
    data
}

#[utoipa::path(
    get,
    path = "/download",
    responses(
        (status = 200, description = "Per-symbol candles over a shared window", body = Download, content_type = "application/json"),
        (status = 500, description = "Upstream failure")
    ),
    params(DownloadQuery)
)]
#[get("/download")]
pub async fn download(
    query: web::Query<DownloadQuery>,
    connector: web::Data<dyn Connector>,
) -> ServiceResult<HttpResponse> {
    let symbols: Vec<String> = query
        .symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let market = connector.connect()?;
    let frame = market.download(&symbols, &query.period).await?;
    let data = frame
        .map(|f| split_by_symbol(&f, &symbols))
        .unwrap_or_default();
    Ok(HttpResponse::Ok().json(Download { symbols, data }))
}
