use super::{decode, ApiError};
use crate::frame::{Frame, RowKey};
use crate::reply::Reply;
use crate::value::{Datum, Mapping, Scalar};
use anyhow::{anyhow, bail, Context, Result};
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, trace};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// quoteSummary endpoint: fundamentals, profile, analyst data
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

pub(crate) const INFO_MODULES: [&str; 5] = [
    "price",
    "summaryDetail",
    "assetProfile",
    "defaultKeyStatistics",
    "financialData",
];

/// Which statement a frame is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Statement {
    BalanceSheet,
    Income,
    Cashflow,
}

impl Statement {
    /// `(module, list key)` in the quoteSummary payload.
    pub(crate) fn module(self, quarterly: bool) -> (&'static str, &'static str) {
        match (self, quarterly) {
            (Statement::BalanceSheet, false) => ("balanceSheetHistory", "balanceSheetStatements"),
            (Statement::BalanceSheet, true) => {
                ("balanceSheetHistoryQuarterly", "balanceSheetStatements")
            }
            (Statement::Income, false) => ("incomeStatementHistory", "incomeStatementHistory"),
            (Statement::Income, true) => {
                ("incomeStatementHistoryQuarterly", "incomeStatementHistory")
            }
            (Statement::Cashflow, false) => ("cashflowStatementHistory", "cashflowStatements"),
            (Statement::Cashflow, true) => {
                ("cashflowStatementHistoryQuarterly", "cashflowStatements")
            }
        }
    }
}

/// Seed the session cookie and fetch the crumb quoteSummary insists on.
pub(crate) async fn crumb(client: &Client) -> Result<String> {
    // fc.yahoo.com answers 404, but sets the cookie on the way
    match client.get(COOKIE_URL).send().await {
        Ok(response) => trace!("Yahoo session cookie request: {}", response.status()),
        Err(e) => trace!("Yahoo session cookie request failed: {e}"),
    }

    let crumb = client
        .get(CRUMB_URL)
        .send()
        .await?
        .error_for_status()
        .context("Yahoo Finance refused to issue a crumb")?
        .text()
        .await?;
    let crumb = crumb.trim().to_string();
    if crumb.is_empty() || crumb.contains('<') {
        bail!("Yahoo Finance returned an invalid crumb");
    }
    Ok(crumb)
}

pub(crate) async fn fetch(
    client: &Client,
    crumb: &str,
    symbol: &str,
    modules: &[&str],
) -> Result<Mapping> {
    let url = format!("https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}");
    let modules = modules.join(",");
    trace!("Fetching quoteSummary [{modules}] for [{symbol}]");
    let response = client
        .get(&url)
        .query(&[("modules", modules.as_str()), ("crumb", crumb)])
        .send()
        .await
        .map_err(|e| {
            error!("[{symbol}] quoteSummary fetching error: {e}\nURL: {url}");
            e
        })?;
    let status = response.status();
    let body = response.bytes().await?;

    let de: SummaryEnvelope = decode(status, &body, symbol, &url)?;
    first_result(de, symbol)
}

pub(crate) fn first_result(envelope: SummaryEnvelope, symbol: &str) -> Result<Mapping> {
    if let Some(err) = envelope.quote_summary.error {
        bail!("[{symbol}] {err}");
    }
    let result = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| anyhow!("[{symbol}] contained no \"quoteSummary.result\" object"))?;
    match unwrap_raw(&result) {
        Datum::Map(map) => Ok(map),
        _ => bail!("[{symbol}] quoteSummary result is not an object"),
    }
}

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}` and missing values
/// as `{}`; keep the raw value, drop the formatting.
pub(crate) fn unwrap_raw(value: &Value) -> Datum {
    match value {
        Value::Object(obj) => {
            if let Some(raw) = obj.get("raw") {
                return Datum::from_json(raw);
            }
            if obj.is_empty() {
                return Datum::Scalar(Scalar::Null);
            }
            if obj.keys().all(|k| k == "fmt" || k == "longFmt") {
                return obj
                    .get("fmt")
                    .map(Datum::from_json)
                    .unwrap_or(Datum::Scalar(Scalar::Null));
            }
            Datum::Map(obj.iter().map(|(k, v)| (k.clone(), unwrap_raw(v))).collect())
        }
        Value::Array(items) => Datum::List(items.iter().map(unwrap_raw).collect()),
        other => Datum::from_json(other),
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Transformations
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

fn scalar(d: Option<&Datum>) -> Scalar {
    match d {
        Some(Datum::Scalar(s)) => s.clone(),
        Some(other) => Scalar::Text(other.to_string()),
        None => Scalar::Null,
    }
}

fn row_key(d: Option<&Datum>, position: usize) -> RowKey {
    d.and_then(Datum::as_scalar)
        .and_then(|s| match s {
            Scalar::Int(ts) => DateTime::from_timestamp(*ts, 0),
            Scalar::Float(ts) => DateTime::from_timestamp(*ts as i64, 0),
            _ => None,
        })
        .map(RowKey::Time)
        .unwrap_or(RowKey::Position(position))
}

/// One row per reporting period, one column per line item; periods that
/// lack a line item get NaN.
pub(crate) fn statement(summary: &Mapping, kind: Statement, quarterly: bool) -> Option<Frame> {
    let (module, list) = kind.module(quarterly);
    let Some(Datum::List(periods)) = summary.get(module)?.as_map()?.get(list) else {
        return None;
    };
    let periods: Vec<&Mapping> = periods.iter().filter_map(Datum::as_map).collect();

    let mut columns: Vec<String> = vec![];
    for period in &periods {
        for (k, _) in period.iter() {
            if k != "endDate" && k != "maxAge" && !columns.contains(k) {
                columns.push(k.clone());
            }
        }
    }

    let mut frame = Frame::new(columns.clone());
    for (i, period) in periods.iter().enumerate() {
        let values = columns
            .iter()
            .map(|c| match period.get(c) {
                Some(d) => scalar(Some(d)),
                None => Scalar::Float(f64::NAN),
            })
            .collect();
        frame.push_row(row_key(period.get("endDate"), i), values);
    }
    Some(frame)
}

/// All info modules folded into one flat mapping; the first module to
/// mention a key wins.
pub(crate) fn info(summary: &Mapping) -> Mapping {
    let mut out = Mapping::new();
    for module in INFO_MODULES {
        let Some(fields) = summary.get(module).and_then(Datum::as_map) else {
            continue;
        };
        for (k, v) in fields.iter() {
            if k != "maxAge" && out.get(k).is_none() {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    out
}

pub(crate) fn market_cap(summary: &Mapping) -> Option<f64> {
    ["summaryDetail", "price"].iter().find_map(|m| {
        summary
            .get(m)
            .and_then(Datum::as_map)
            .and_then(|fields| fields.get("marketCap"))
            .and_then(Datum::as_f64)
    })
}

pub(crate) fn pe_ratio(summary: &Mapping) -> Option<f64> {
    ["summaryDetail", "defaultKeyStatistics"].iter().find_map(|m| {
        summary
            .get(m)
            .and_then(Datum::as_map)
            .and_then(|fields| fields.get("trailingPE"))
            .and_then(Datum::as_f64)
    })
}

pub(crate) fn price_targets(summary: &Mapping) -> Reply {
    let Some(data) = summary.get("financialData").and_then(Datum::as_map) else {
        return Reply::Missing;
    };
    let field = |k: &str| scalar(data.get(k));

    let mut out = Mapping::new();
    out.insert("current", field("currentPrice"));
    out.insert("low", field("targetLowPrice"));
    out.insert("high", field("targetHighPrice"));
    out.insert("mean", field("targetMeanPrice"));
    out.insert("median", field("targetMedianPrice"));
    out.insert("numberOfAnalysts", field("numberOfAnalystOpinions"));
    out.insert("recommendation", field("recommendationKey"));
    Reply::from(out)
}

const TREND_COLUMNS: [&str; 5] = ["strongBuy", "buy", "hold", "sell", "strongSell"];

pub(crate) fn recommendation_trend(summary: &Mapping) -> Reply {
    let Some(Datum::List(trend)) = summary
        .get("recommendationTrend")
        .and_then(Datum::as_map)
        .and_then(|m| m.get("trend"))
    else {
        return Reply::Missing;
    };

    let mut frame = Frame::new(TREND_COLUMNS);
    for (i, period) in trend.iter().filter_map(Datum::as_map).enumerate() {
        let key = match period.get("period").and_then(Datum::as_str) {
            Some(label) => RowKey::Label(label.to_string()),
            None => RowKey::Position(i),
        };
        frame.push_row(key, TREND_COLUMNS.iter().map(|c| scalar(period.get(c))).collect());
    }
    Reply::from(frame)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub(crate) struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: SummaryResponse,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SummaryResponse {
    pub result: Option<Vec<Value>>,
    pub error: Option<ApiError>,
}
