//! Turns whatever a market source hands back into JSON-safe shapes.
//!
//! Every float that reaches a response goes through [`normalize_scalar`], so
//! NaN and infinities leave the service as `null`. Tables become ordered
//! record lists, price tables become [`Candle`]s, and loosely-typed replies
//! are flattened by capability in the fixed order mapping, exportable, text.

use crate::frame::{Frame, RowKey};
use crate::reply::Reply;
use crate::value::{Datum, Mapping, Scalar};
use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One flattened table row (or any JSON object we build from a reply).
///
/// Keys keep insertion order, so the row id leads and columns follow the table.
pub type Record = Map<String, Value>;

const NEUTRAL: &str = "NEUTRAL";

/// ISO-8601 rendering used for every timestamp leaving the service.
pub fn iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn now_iso() -> String {
    iso(&Utc::now())
}

/// `Some(v)` only for finite floats.
pub fn finite(v: f64) -> Option<f64> {
    if v.is_nan() || v.is_infinite() {
        None
    } else {
        Some(v)
    }
}

/// Attribute-style float (absent, NaN or infinite all become `null`).
pub fn normalize_f64(v: Option<f64>) -> Value {
    v.and_then(finite)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// `null` for null, NaN and infinite values; the value unchanged otherwise.
pub fn normalize_scalar(v: &Scalar) -> Value {
    match v {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::from(*i),
        Scalar::Float(f) => normalize_f64(Some(*f)),
        Scalar::Text(s) => Value::String(s.clone()),
        Scalar::Time(t) => Value::String(iso(t)),
    }
}

pub fn sanitize_datum(d: &Datum) -> Value {
    match d {
        Datum::Scalar(s) => normalize_scalar(s),
        Datum::List(items) => Value::Array(items.iter().map(sanitize_datum).collect()),
        Datum::Map(map) => Value::Object(sanitize_mapping(map)),
    }
}

pub fn sanitize_mapping(map: &Mapping) -> Record {
    map.iter()
        .map(|(k, v)| (k.clone(), sanitize_datum(v)))
        .collect()
}

fn row_id(key: &RowKey) -> Value {
    match key {
        RowKey::Time(t) => Value::String(iso(t)),
        other => Value::String(other.to_string()),
    }
}

/// Table rows as records, the row identifier stored under `index`.
pub fn table_to_records(table: Option<&Frame>) -> Vec<Record> {
    table_to_records_keyed(table, "index")
}

/// Table rows as records, the row identifier stored under `id_field`.
pub fn table_to_records_keyed(table: Option<&Frame>, id_field: &str) -> Vec<Record> {
    let Some(table) = table else {
        return vec![];
    };
    table
        .rows()
        .map(|row| {
            let mut rec = Record::new();
            rec.insert(id_field.to_string(), row_id(row.key));
            for (name, value) in row.cells() {
                rec.insert(name.to_string(), normalize_scalar(value));
            }
            rec
        })
        .collect()
}

/// OHLCV record for one interval.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct Candle {
    pub date: String,
    #[schema(value_type = Option<f64>)]
    pub open: Value,
    #[schema(value_type = Option<f64>)]
    pub high: Value,
    #[schema(value_type = Option<f64>)]
    pub low: Value,
    #[schema(value_type = Option<f64>)]
    pub close: Value,
    #[schema(value_type = Option<f64>)]
    pub volume: Value,
}

/// Price-history rows as candles; missing columns count as `0`.
pub fn table_to_candles(table: Option<&Frame>) -> Vec<Candle> {
    let Some(table) = table else {
        return vec![];
    };
    let zero = Scalar::Int(0);
    table
        .rows()
        .map(|row| {
            let field = |name: &str| normalize_scalar(row.get_ci(name).unwrap_or(&zero));
            let ts = row.key.as_time().unwrap_or_else(Utc::now);
            Candle {
                date: iso(&ts),
                open: field("open"),
                high: field("high"),
                low: field("low"),
                close: field("close"),
                volume: field("volume"),
            }
        })
        .collect()
}

/// Flatten a reply into one JSON object.
///
/// Mappings are sanitized value by value; exportable replies are converted
/// with [`to_dict`](crate::Exportable::to_dict) and then sanitized; anything
/// else ends up as its display form under `data`.
pub fn object_or_dict_to_map(obj: &Reply) -> Record {
    if let Some(map) = obj.as_mapping() {
        return sanitize_mapping(map);
    }
    if let Some(exportable) = obj.as_exportable() {
        return sanitize_mapping(&exportable.to_dict());
    }
    let mut rec = Record::new();
    rec.insert("data".to_string(), Value::String(obj.to_string()));
    rec
}

/// Value and signal of one technical indicator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct IndicatorSignal {
    #[schema(value_type = Option<f64>)]
    pub value: Value,
    pub signal: String,
}

/// Indicator group, e.g. the oscillators or the moving averages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct SignalGroup {
    pub recommendation: String,
    /// Indicators in the order the source lists them
    pub values: IndexMap<String, IndicatorSignal>,
}

impl Default for SignalGroup {
    fn default() -> Self {
        SignalGroup {
            recommendation: NEUTRAL.to_string(),
            values: IndexMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct SignalSummary {
    pub recommendation: String,
    pub buy: i64,
    pub sell: i64,
    pub neutral: i64,
}

impl Default for SignalSummary {
    fn default() -> Self {
        SignalSummary {
            recommendation: NEUTRAL.to_string(),
            buy: 0,
            sell: 0,
            neutral: 0,
        }
    }
}

/// Label text; absent and null labels both fall back to `default`.
fn text_or(d: Option<&Datum>, default: &str) -> String {
    match d {
        Some(Datum::Scalar(Scalar::Text(s))) => s.clone(),
        Some(Datum::Scalar(Scalar::Null)) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Reshape an indicator group into `{recommendation, values}`.
pub fn clean_signal_group(group: Option<&Datum>) -> SignalGroup {
    let Some(map) = group.and_then(Datum::as_map) else {
        return SignalGroup::default();
    };
    let values = map
        .iter()
        .filter(|(k, _)| k.as_str() != "recommendation")
        .map(|(k, v)| {
            let signal = match v.as_map() {
                Some(inner) => IndicatorSignal {
                    value: inner.get("value").map(sanitize_datum).unwrap_or(Value::Null),
                    signal: text_or(inner.get("signal"), NEUTRAL),
                },
                None => IndicatorSignal {
                    value: sanitize_datum(v),
                    signal: NEUTRAL.to_string(),
                },
            };
            (k.clone(), signal)
        })
        .collect();
    SignalGroup {
        recommendation: text_or(map.get("recommendation"), NEUTRAL),
        values,
    }
}

fn count(map: &Mapping, key: &str) -> Result<i64> {
    match map.get(key) {
        None => Ok(0),
        Some(d) => match d.as_f64().and_then(finite) {
            Some(n) => Ok(n.trunc() as i64),
            None => bail!("invalid {key} count in signal summary: {d}"),
        },
    }
}

/// Reshape the signal summary into `{recommendation, buy, sell, neutral}`.
pub fn signal_summary(summary: Option<&Datum>) -> Result<SignalSummary> {
    let Some(map) = summary.and_then(Datum::as_map) else {
        return Ok(SignalSummary::default());
    };
    Ok(SignalSummary {
        recommendation: text_or(map.get("recommendation"), NEUTRAL),
        buy: count(map, "buy")?,
        sell: count(map, "sell")?,
        neutral: count(map, "neutral")?,
    })
}
