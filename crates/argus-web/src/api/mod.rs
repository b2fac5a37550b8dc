use actix_web::web;
use argus_market::normalize::{sanitize_datum, sanitize_mapping, table_to_records, Record};
use argus_market::{Datum, Reply};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use utoipa::OpenApi;

pub mod download;
pub mod economy;
pub mod fx;
pub mod health;
pub mod index;
pub mod ticker;

#[cfg(test)]
pub(crate) mod testing;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        // tickers
        .service(ticker::quote)
        .service(ticker::history)
        .service(ticker::financials)
        .service(ticker::cashflow)
        .service(ticker::dividends)
        .service(ticker::splits)
        .service(ticker::analysts)
        .service(ticker::news)
        .service(ticker::info)
        .service(ticker::ta_signals)
        // currencies, metals, crypto
        .service(fx::fx_current)
        .service(fx::fx_history)
        .service(fx::gold_price)
        .service(fx::crypto_current)
        // indices
        .service(index::index_data)
        .service(index::index_history)
        .service(index::index_components)
        // macro
        .service(economy::inflation)
        .service(economy::bond_yields)
        .service(economy::policy_rate)
        // multi-ticker
        .service(download::download);
}

#[derive(OpenApi)]
#[openapi(
    info(title = "argus", description = "JSON gateway for equity, FX, index and macro data"),
    paths(
        health::health,
        ticker::quote,
        ticker::history,
        ticker::financials,
        ticker::cashflow,
        ticker::dividends,
        ticker::splits,
        ticker::analysts,
        ticker::news,
        ticker::info,
        ticker::ta_signals,
        fx::fx_current,
        fx::fx_history,
        fx::gold_price,
        fx::crypto_current,
        index::index_data,
        index::index_history,
        index::index_components,
        economy::inflation,
        economy::bond_yields,
        economy::policy_rate,
        download::download,
    )
)]
pub struct ApiDoc;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn default_period() -> String {
    "1ay".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

/// Window of a price-history request.
#[derive(Deserialize, Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// 1g, 5g, 1ay, 3ay, 6ay, 1y, 2y, 5y, max
    #[serde(default = "default_period")]
    #[param(default = "1ay")]
    pub period: String,

    /// 1m, 5m, 15m, 1h, 1d, 1W, 1M
    #[serde(default = "default_interval")]
    #[param(default = "1d")]
    pub interval: String,
}

#[derive(Deserialize, Debug, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatementQuery {
    /// Quarterly instead of annual statements
    #[serde(default, deserialize_with = "de_flag")]
    #[param(value_type = bool, default = false)]
    pub quarterly: bool,
}

/// Accepts the usual spellings of a boolean query flag.
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(de::Error::custom(format!("invalid boolean flag: {other}"))),
    }
}

/// Current-value reply merged into `base`: mappings are spread into it, any
/// other value lands under `last`.
pub(crate) fn merge_current(mut base: Record, current: &Reply) -> Record {
    let last = match current {
        Reply::Value(Datum::Map(map)) => {
            base.extend(sanitize_mapping(map));
            return base;
        }
        Reply::Value(datum) => sanitize_datum(datum),
        Reply::Missing => Value::Null,
        table => Value::String(table.to_string()),
    };
    base.insert("last".to_string(), last);
    base
}

/// List-shaped reply (news, index members) as JSON items.
pub(crate) fn reply_to_items(reply: &Reply) -> Vec<Value> {
    match reply {
        Reply::Missing => vec![],
        Reply::Table(frame) => table_to_records(Some(frame))
            .into_iter()
            .map(Value::Object)
            .collect(),
        Reply::Value(Datum::List(items)) => items.iter().map(sanitize_datum).collect(),
        Reply::Value(_) => vec![],
    }
}
