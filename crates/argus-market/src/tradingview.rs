//! Technical signals and index membership from the TradingView scanner.
//!
//! The scanner returns raw indicator values plus three aggregate ratings in
//! `[-1, 1]`; per-indicator BUY/SELL/NEUTRAL calls are derived here.

use crate::period::tradingview_suffix;
use crate::value::{Datum, Mapping, Scalar};
use anyhow::{anyhow, bail, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, trace};

const BUY: &str = "BUY";
const SELL: &str = "SELL";
const NEUTRAL: &str = "NEUTRAL";

const RATINGS: [&str; 3] = ["Recommend.All", "Recommend.Other", "Recommend.MA"];

const OSCILLATORS: [&str; 11] = [
    "RSI",
    "Stoch.K",
    "Stoch.D",
    "CCI20",
    "ADX",
    "ADX+DI",
    "ADX-DI",
    "AO",
    "Mom",
    "MACD.macd",
    "MACD.signal",
];

const MOVING_AVERAGES: [&str; 12] = [
    "EMA10", "SMA10", "EMA20", "SMA20", "EMA30", "SMA30", "EMA50", "SMA50", "EMA100", "SMA100",
    "EMA200", "SMA200",
];

fn columns() -> Vec<&'static str> {
    RATINGS
        .iter()
        .chain(OSCILLATORS.iter())
        .chain(MOVING_AVERAGES.iter())
        .chain(["close"].iter())
        .copied()
        .collect()
}

async fn scan(client: &Client, screener: &str, label: &str, body: &Value) -> Result<Vec<ScanRow>> {
    let url = format!("https://scanner.tradingview.com/{screener}/scan");
    let response: ScanResponse = client
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!("[{label}] scanner fetching error: {e}\nURL: {url}");
            e
        })?
        .error_for_status()?
        .json()
        .await
        .map_err(|e| {
            error!("[{label}] scanner deserialization error: {e}\nURL: {url}");
            e
        })?;
    Ok(response.data)
}

pub async fn fetch(
    client: &Client,
    screener: &str,
    tv_symbol: &str,
    timeframe: &str,
) -> Result<Mapping> {
    let suffix = tradingview_suffix(timeframe)
        .ok_or_else(|| anyhow!("unsupported timeframe for technical signals: {timeframe}"))?;
    let names = columns();
    let body = json!({
        "symbols": {"tickers": [tv_symbol], "query": {"types": []}},
        "columns": names.iter().map(|c| format!("{c}{suffix}")).collect::<Vec<_>>(),
    });

    trace!("Fetching technical signals for [{tv_symbol}] ({timeframe})");
    let row = scan(client, screener, tv_symbol, &body)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no technical data for {tv_symbol}"))?;

    let values: HashMap<&str, f64> = names
        .iter()
        .copied()
        .zip(row.d.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)))
        .collect();
    Ok(signals(&values))
}

/// Members of an exchange index, largest market cap first.
///
/// Each member is `{symbol, name}`; `symbol` is the bare exchange ticker.
pub async fn index_members(
    client: &Client,
    screener: &str,
    exchange: &str,
    code: &str,
) -> Result<Vec<Datum>> {
    let index = format!("SYML:{exchange};{code}");
    let body = json!({
        "columns": ["name", "description", "market_cap_basic"],
        "symbols": {"symbolset": [index]},
        "preset": "index_components_market_pages",
        "sort": {"sortBy": "market_cap_basic", "sortOrder": "desc"},
        "range": [0, 1000],
    });

    trace!("Fetching members of [{index}]");
    let rows = scan(client, screener, &index, &body).await?;
    if rows.is_empty() {
        bail!("no members listed for index {code}");
    }
    Ok(rows.iter().map(member).collect())
}

fn member(row: &ScanRow) -> Datum {
    let text = |i: usize| row.d.get(i).and_then(Value::as_str);
    // row id ("BIST:THYAO") stands in for a null name column
    let symbol = text(0)
        .map(String::from)
        .unwrap_or_else(|| row.s.rsplit(':').next().unwrap_or_default().to_string());

    let mut out = Mapping::new();
    out.insert("symbol", symbol);
    out.insert("name", text(1).map(Scalar::from).unwrap_or(Scalar::Null));
    Datum::Map(out)
}

/// Aggregate rating in `[-1, 1]` -> recommendation label.
pub fn recommendation(rating: f64) -> &'static str {
    if rating.is_nan() {
        NEUTRAL
    } else if rating < -0.5 {
        "STRONG_SELL"
    } else if rating < -0.1 {
        SELL
    } else if rating <= 0.1 {
        NEUTRAL
    } else if rating <= 0.5 {
        BUY
    } else {
        "STRONG_BUY"
    }
}

fn call(buy: bool, sell: bool) -> &'static str {
    if buy {
        BUY
    } else if sell {
        SELL
    } else {
        NEUTRAL
    }
}

/// Build the `{summary, oscillators, moving_averages}` signal tree.
pub fn signals(values: &HashMap<&str, f64>) -> Mapping {
    let v = |k: &str| values.get(k).copied().unwrap_or(f64::NAN);

    let rsi = v("RSI");
    let (k, d) = (v("Stoch.K"), v("Stoch.D"));
    let cci = v("CCI20");
    let (adx, plus_di, minus_di) = (v("ADX"), v("ADX+DI"), v("ADX-DI"));
    let (ao, mom) = (v("AO"), v("Mom"));
    let (macd, macd_signal) = (v("MACD.macd"), v("MACD.signal"));

    // comparisons with NaN are false, so missing inputs fall through to NEUTRAL
    let oscillators = [
        ("RSI", rsi, call(rsi < 30.0, rsi > 70.0)),
        (
            "Stoch.K",
            k,
            call(
                k < 20.0 && d < 20.0 && k > d,
                k > 80.0 && d > 80.0 && k < d,
            ),
        ),
        ("CCI", cci, call(cci < -100.0, cci > 100.0)),
        (
            "ADX",
            adx,
            call(
                adx > 20.0 && plus_di > minus_di,
                adx > 20.0 && plus_di < minus_di,
            ),
        ),
        ("AO", ao, call(ao > 0.0, ao < 0.0)),
        ("Mom", mom, call(mom > 0.0, mom < 0.0)),
        (
            "MACD",
            macd,
            call(macd > macd_signal, macd < macd_signal),
        ),
    ];

    let close = v("close");
    let moving_averages: Vec<_> = MOVING_AVERAGES
        .iter()
        .map(|name| {
            let ma = v(name);
            (*name, ma, call(ma < close, ma > close))
        })
        .collect();

    let (mut buy, mut sell, mut neutral) = (0_i64, 0_i64, 0_i64);
    let mut group = |rating: f64, entries: &[(&str, f64, &str)]| {
        let mut out = Mapping::new();
        out.insert("recommendation", recommendation(rating));
        for (name, value, signal) in entries {
            match *signal {
                BUY => buy += 1,
                SELL => sell += 1,
                _ => neutral += 1,
            }
            let mut entry = Mapping::new();
            entry.insert("value", *value);
            entry.insert("signal", *signal);
            out.insert(*name, entry);
        }
        out
    };
    let oscillators = group(v("Recommend.Other"), &oscillators);
    let moving_averages = group(v("Recommend.MA"), &moving_averages);

    let mut summary = Mapping::new();
    summary.insert("recommendation", recommendation(v("Recommend.All")));
    summary.insert("buy", buy);
    summary.insert("sell", sell);
    summary.insert("neutral", neutral);

    let mut out = Mapping::new();
    out.insert("summary", summary);
    out.insert("oscillators", Datum::Map(oscillators));
    out.insert("moving_averages", Datum::Map(moving_averages));
    out
}

#[derive(Deserialize, Debug)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Deserialize, Debug)]
struct ScanRow {
    #[serde(default)]
    s: String,
    #[serde(default)]
    d: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{clean_signal_group, sanitize_datum, signal_summary};

    #[test]
    fn test_recommendation_bands() {
        assert_eq!(recommendation(-0.8), "STRONG_SELL");
        assert_eq!(recommendation(-0.3), "SELL");
        assert_eq!(recommendation(0.0), "NEUTRAL");
        assert_eq!(recommendation(0.3), "BUY");
        assert_eq!(recommendation(0.9), "STRONG_BUY");
        assert_eq!(recommendation(f64::NAN), "NEUTRAL");
    }

    #[test]
    fn test_signals_tree() {
        let values: HashMap<&str, f64> = [
            ("Recommend.All", 0.6),
            ("Recommend.Other", 0.2),
            ("Recommend.MA", 0.8),
            ("RSI", 25.0),
            ("MACD.macd", -1.0),
            ("MACD.signal", 1.0),
            ("close", 100.0),
            ("EMA10", 95.0),
            ("SMA10", 105.0),
        ]
        .into_iter()
        .collect();

        let tree = Datum::Map(signals(&values));
        let map = tree.as_map().unwrap();

        let summary = signal_summary(map.get("summary")).unwrap();
        assert_eq!(summary.recommendation, "STRONG_BUY");
        // RSI + EMA10 buy, MACD + SMA10 sell, everything else neutral
        assert_eq!((summary.buy, summary.sell), (2, 2));
        assert_eq!(summary.neutral, 7 + 12 - 4);

        let osc = clean_signal_group(map.get("oscillators"));
        assert_eq!(osc.recommendation, "BUY");
        assert_eq!(osc.values["RSI"].signal, "BUY");
        assert_eq!(osc.values["MACD"].signal, "SELL");
        assert_eq!(osc.values["AO"].value, Value::Null);

        let ma = clean_signal_group(map.get("moving_averages"));
        assert_eq!(ma.values["EMA10"].signal, "BUY");
        assert_eq!(ma.values["SMA10"].signal, "SELL");
        assert_eq!(ma.values["SMA200"].signal, "NEUTRAL");
    }

    #[test]
    fn test_scan_response_nulls() {
        let body = r#"{"totalCount": 1, "data": [{"s": "BIST:THYAO", "d": [0.5, null]}]}"#;
        let response: ScanResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data[0].d, vec![json!(0.5), Value::Null]);
    }

    const XU030: &str = r#"{
        "totalCount": 3,
        "data": [
            {"s": "BIST:ASELS", "d": ["ASELS", "ASELSAN", 4.6e11]},
            {"s": "BIST:THYAO", "d": ["THYAO", "TURK HAVA YOLLARI", 4.1e11]},
            {"s": "BIST:GARAN", "d": [null, null, 3.9e11]}
        ]
    }"#;

    #[test]
    fn test_index_members_keep_scanner_order() {
        let response: ScanResponse = serde_json::from_str(XU030).expect("fixture parses");
        let members: Vec<Value> = response
            .data
            .iter()
            .map(|row| sanitize_datum(&member(row)))
            .collect();

        assert_eq!(
            members,
            vec![
                json!({"symbol": "ASELS", "name": "ASELSAN"}),
                json!({"symbol": "THYAO", "name": "TURK HAVA YOLLARI"}),
                json!({"symbol": "GARAN", "name": null}),
            ]
        );
        let keys: Vec<_> = members[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["symbol", "name"]);
    }
}
