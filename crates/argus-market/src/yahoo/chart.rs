use super::{decode, ApiError};
use crate::de::{de_nullable_f64s, de_timestamps};
use crate::frame::{Column, Frame, RowKey};
use crate::reply::FastInfo;
use crate::value::{Mapping, Scalar};
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, trace};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Chart endpoint: prices, events and the quote meta block, per symbol
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) const PRICE_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Adj Close", "Volume"];

fn url(symbol: &str, interval: &str, range: &str) -> String {
    format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?symbol={symbol}&interval={interval}&range={range}&events=div|split|capitalGains",
    )
}

pub(crate) async fn fetch(
    client: &Client,
    symbol: &str,
    interval: &str,
    range: &str,
) -> Result<ChartResult> {
    let url = url(symbol, interval, range);
    trace!("Fetching chart data for [{symbol}] from Yahoo Finance");
    let response = client.get(&url).send().await.map_err(|e| {
        error!("[{symbol}] chart fetching error: {e}\nURL: {url}");
        e
    })?;
    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        error!("[{symbol}] byte transformation error: {e}\nURL: {url}");
        e
    })?;

    trace!("Deserializing chart data for [{symbol}]");
    let de: ChartEnvelope = decode(status, &body, symbol, &url)?;
    first_result(de, symbol)
}

pub(crate) fn first_result(envelope: ChartEnvelope, symbol: &str) -> Result<ChartResult> {
    if let Some(err) = envelope.chart.error {
        bail!("[{symbol}] {err}");
    }
    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| anyhow!("[{symbol}] contained no \"chart.result\" object"))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Transformations
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

fn volume(v: f64) -> Scalar {
    if v.is_finite() {
        Scalar::Int(v as i64)
    } else {
        Scalar::Float(v)
    }
}

fn at(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(f64::NAN)
}

impl ChartResult {
    /// OHLCV table indexed by bar time.
    pub(crate) fn history(&self) -> Frame {
        let mut frame = Frame::new(PRICE_COLUMNS);
        let empty = Quote::default();
        let quote = self.indicators.quote.first().unwrap_or(&empty);
        let adjclose = self
            .indicators
            .adjclose
            .first()
            .map(|a| a.adjclose.as_slice())
            .unwrap_or(&[]);

        for (i, time) in self.timestamp.iter().enumerate() {
            frame.push_row(
                RowKey::Time(*time),
                vec![
                    Scalar::Float(at(&quote.open, i)),
                    Scalar::Float(at(&quote.high, i)),
                    Scalar::Float(at(&quote.low, i)),
                    Scalar::Float(at(&quote.close, i)),
                    Scalar::Float(at(adjclose, i)),
                    volume(at(&quote.volume, i)),
                ],
            );
        }
        frame
    }

    pub(crate) fn dividends(&self) -> Option<Frame> {
        let events = self.events.as_ref()?.dividends.as_ref()?;
        let mut rows: Vec<_> = events.values().collect();
        rows.sort_by_key(|d| d.date);

        let mut frame = Frame::new(["Dividends"]);
        for d in rows {
            frame.push_row(RowKey::Time(timestamp(d.date)?), vec![Scalar::Float(d.amount)]);
        }
        Some(frame)
    }

    pub(crate) fn splits(&self) -> Option<Frame> {
        let events = self.events.as_ref()?.splits.as_ref()?;
        let mut rows: Vec<_> = events.values().collect();
        rows.sort_by_key(|s| s.date);

        let mut frame = Frame::new(["Stock Splits"]);
        for s in rows {
            let ratio = if s.denominator == 0.0 {
                f64::NAN
            } else {
                s.numerator / s.denominator
            };
            frame.push_row(RowKey::Time(timestamp(s.date)?), vec![Scalar::Float(ratio)]);
        }
        Some(frame)
    }

    /// Open of the most recent bar.
    fn last_open(&self) -> Option<f64> {
        self.indicators
            .quote
            .first()
            .and_then(|q| q.open.iter().rev().find(|v| v.is_finite()).copied())
    }

    pub(crate) fn fast_info(&self) -> FastInfo {
        let meta = &self.meta;
        FastInfo {
            last_price: meta.regular_market_price,
            open: self.last_open(),
            day_high: meta.regular_market_day_high,
            day_low: meta.regular_market_day_low,
            previous_close: meta.previous_close(),
            volume: meta.regular_market_volume,
            ..FastInfo::default()
        }
    }

    /// Current-value mapping served by the FX, crypto and index endpoints.
    pub(crate) fn current(&self) -> Mapping {
        let meta = &self.meta;
        let last = meta.regular_market_price;
        let previous = meta.previous_close();
        let change = last.zip(previous).map(|(l, p)| l - p);
        let change_percent = change.zip(previous).map(|(c, p)| c / p * 100.0);

        let mut map = Mapping::new();
        map.insert("last", last);
        map.insert("open", self.last_open());
        map.insert("high", meta.regular_market_day_high);
        map.insert("low", meta.regular_market_day_low);
        map.insert("previousClose", previous);
        map.insert("change", change);
        map.insert("changePercent", change_percent);
        map.insert("volume", meta.regular_market_volume);
        map.insert("fiftyTwoWeekHigh", meta.fifty_two_week_high);
        map.insert("fiftyTwoWeekLow", meta.fifty_two_week_low);
        map.insert("currency", text(&meta.currency));
        map.insert("name", text(&meta.long_name.clone().or(meta.short_name.clone())));
        map.insert("exchange", text(&meta.exchange_name));
        map.insert(
            "marketTime",
            meta.regular_market_time
                .and_then(timestamp)
                .map(Scalar::Time)
                .unwrap_or(Scalar::Null),
        );
        map
    }
}

fn text(v: &Option<String>) -> Scalar {
    v.clone().map(Scalar::Text).unwrap_or(Scalar::Null)
}

fn timestamp(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

impl Meta {
    pub(crate) fn previous_close(&self) -> Option<f64> {
        self.previous_close.or(self.chart_previous_close)
    }
}

/// Align several single-symbol histories on the union of their bar times,
/// columns grouped as `(field, symbol)`; gaps are NaN.
pub(crate) fn merge_histories(histories: &[(String, Frame)]) -> Frame {
    let mut columns = vec![];
    for field in PRICE_COLUMNS {
        for (symbol, _) in histories {
            columns.push(Column::grouped(field, symbol.clone()));
        }
    }

    let width = columns.len();
    let n = histories.len();
    let mut grid: BTreeMap<DateTime<Utc>, Vec<Scalar>> = BTreeMap::new();
    for (s, (_, frame)) in histories.iter().enumerate() {
        for row in frame.rows() {
            let Some(time) = row.key.as_time() else {
                continue;
            };
            let cells = grid
                .entry(time)
                .or_insert_with(|| vec![Scalar::Float(f64::NAN); width]);
            for (f, field) in PRICE_COLUMNS.iter().enumerate() {
                if let Some(value) = row.get(field) {
                    cells[f * n + s] = value.clone();
                }
            }
        }
    }

    let mut merged = Frame::with_columns(columns);
    for (time, cells) in grid {
        merged.push_row(RowKey::Time(time), cells);
    }
    merged
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

// Input: Yahoo Finance
#[derive(Deserialize, Debug)]
pub(crate) struct ChartEnvelope {
    pub chart: ChartResponse,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ChartResponse {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ChartResult {
    pub meta: Meta,
    #[serde(default, deserialize_with = "de_timestamps")]
    pub timestamp: Vec<DateTime<Utc>>,
    pub events: Option<Events>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Meta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub exchange_name: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub regular_market_time: Option<i64>,
    pub previous_close: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Events {
    pub dividends: Option<HashMap<String, Dividend>>,
    pub splits: Option<HashMap<String, Split>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Dividend {
    pub amount: f64,
    pub date: i64,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Split {
    pub date: i64,
    pub numerator: f64,
    pub denominator: f64,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Quote {
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub open: Vec<f64>,
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub high: Vec<f64>,
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub low: Vec<f64>,
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub close: Vec<f64>,
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub volume: Vec<f64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct AdjClose {
    #[serde(default, deserialize_with = "de_nullable_f64s")]
    pub adjclose: Vec<f64>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::normalize::{table_to_candles, table_to_records_keyed};
    use serde_json::{json, Value};

    pub(crate) const THYAO: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "TRY",
                    "symbol": "THYAO.IS",
                    "exchangeName": "IST",
                    "longName": "Turk Hava Yollari Anonim Ortakligi",
                    "regularMarketPrice": 301.5,
                    "regularMarketDayHigh": 305.0,
                    "regularMarketDayLow": 298.25,
                    "regularMarketVolume": 12500000,
                    "regularMarketTime": 1705939200,
                    "chartPreviousClose": 300.0
                },
                "timestamp": [1705795200, 1705881600, 1705968000],
                "events": {
                    "dividends": {
                        "1717372800": {"amount": 10.5, "date": 1717372800},
                        "1685923200": {"amount": 3.2, "date": 1685923200}
                    },
                    "splits": {
                        "1625097600": {"date": 1625097600, "numerator": 3, "denominator": 2, "splitRatio": "3:2"}
                    }
                },
                "indicators": {
                    "quote": [{
                        "open": [290.0, 295.5, 299.0],
                        "high": [296.0, 301.0, 305.0],
                        "low": [289.0, 294.0, 298.25],
                        "close": [295.0, null, 301.5],
                        "volume": [1000, 2000, null]
                    }],
                    "adjclose": [{"adjclose": [295.0, null, 301.5]}]
                }
            }],
            "error": null
        }
    }"#;

    pub(crate) fn thyao() -> ChartResult {
        let envelope: ChartEnvelope = serde_json::from_str(THYAO).expect("fixture parses");
        first_result(envelope, "THYAO.IS").expect("fixture has a result")
    }

    #[test]
    fn test_history_frame() {
        let frame = thyao().history();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), PRICE_COLUMNS.to_vec());

        let candles = table_to_candles(Some(&frame));
        assert_eq!(candles[0].date, "2024-01-21T00:00:00Z");
        assert_eq!(candles[1].close, Value::Null);
        assert_eq!(candles[2].close, json!(301.5));
        assert_eq!(candles[0].volume, json!(1000));
        assert_eq!(candles[2].volume, Value::Null);
    }

    #[test]
    fn test_dividends_sorted_by_date() {
        let frame = thyao().dividends().expect("dividends present");
        let records = table_to_records_keyed(Some(&frame), "date");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Dividends"], json!(3.2));
        assert_eq!(records[1]["date"], json!("2024-06-03T00:00:00Z"));
    }

    #[test]
    fn test_split_ratio() {
        let frame = thyao().splits().expect("splits present");
        let row = frame.rows().next().expect("one split");
        assert_eq!(row.get("Stock Splits"), Some(&Scalar::Float(1.5)));
    }

    #[test]
    fn test_fast_info_from_meta() {
        let info = thyao().fast_info();
        assert_eq!(info.last_price, Some(301.5));
        assert_eq!(info.previous_close, Some(300.0));
        assert_eq!(info.open, Some(299.0));
        assert_eq!(info.volume, Some(12_500_000.0));
        assert_eq!(info.market_cap, None);
    }

    #[test]
    fn test_current_mapping() {
        let current = thyao().current();
        assert_eq!(current.get("change").and_then(|d| d.as_f64()), Some(1.5));
        assert_eq!(current.get("currency").and_then(|d| d.as_str()), Some("TRY"));
        let pct = current.get("changePercent").and_then(|d| d.as_f64()).unwrap();
        assert!((pct - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_upstream_error_is_reported() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        let err = first_result(envelope, "NOPE.IS").unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn test_merge_histories_aligns_on_time() {
        let a = thyao().history();
        let mut b = Frame::new(PRICE_COLUMNS);
        let t = a.index()[1].clone();
        b.push_row(t, vec![Scalar::Float(10.0); 6]);

        let merged = merge_histories(&[("THYAO".into(), a), ("GARAN".into(), b)]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.columns().len(), 12);

        let garan = merged.xs("GARAN").expect("multi-level");
        let closes: Vec<_> = garan
            .rows()
            .map(|r| r.get("Close").and_then(Scalar::as_f64).unwrap())
            .collect();
        assert!(closes[0].is_nan());
        assert_eq!(closes[1], 10.0);
        assert!(closes[2].is_nan());
    }
}
