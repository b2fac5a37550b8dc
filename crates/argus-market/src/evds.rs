//! Central bank series (TCMB EVDS): consumer prices and the policy rate.

use crate::de::de_str_f64;
use crate::value::{Mapping, Scalar};
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{error, trace};

/// Consumer price index, 2003=100, monthly.
pub const CPI_SERIES: &str = "TP.FG.J0";

const BASE_URL: &str = "https://evds2.tcmb.gov.tr/service/evds";

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: String,
    pub value: Option<f64>,
}

pub async fn fetch_series(
    client: &Client,
    key: &str,
    series: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Observation>> {
    let url = format!(
        "{BASE_URL}/series={series}&startDate={}&endDate={}&type=json",
        start.format("%d-%m-%Y"),
        end.format("%d-%m-%Y"),
    );
    trace!("Fetching EVDS series {series}");
    let response: SeriesResponse = client
        .get(&url)
        .header("key", key)
        .send()
        .await
        .map_err(|e| {
            error!("EVDS {series} fetching error: {e}");
            e
        })?
        .error_for_status()?
        .json()
        .await
        .map_err(|e| {
            error!("EVDS {series} deserialization error: {e}");
            e
        })?;
    response.observations(series)
}

/// Everything since `days` ago, up to today.
pub async fn fetch_recent(client: &Client, key: &str, series: &str, days: i64) -> Result<Vec<Observation>> {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(days);
    fetch_series(client, key, series, start, end).await
}

/// Latest CPI print with its month-on-month and year-on-year change, in percent.
pub fn latest_inflation(observations: &[Observation]) -> Result<Mapping> {
    let points: Vec<(&str, f64)> = observations
        .iter()
        .filter_map(|o| o.value.map(|v| (o.date.as_str(), v)))
        .collect();
    let (date, cpi) = *points
        .last()
        .ok_or_else(|| anyhow!("CPI series returned no observations"))?;

    let change_from = |back: usize| {
        points
            .len()
            .checked_sub(back + 1)
            .map(|i| points[i].1)
            .filter(|base| *base != 0.0)
            .map(|base| (cpi / base - 1.0) * 100.0)
    };

    let mut out = Mapping::new();
    out.insert("date", date);
    out.insert("cpi", cpi);
    out.insert("monthlyInflation", change_from(1));
    out.insert("yearlyInflation", change_from(12));
    Ok(out)
}

/// Most recent non-empty observation.
pub fn latest_value(observations: &[Observation]) -> Scalar {
    observations
        .iter()
        .rev()
        .find_map(|o| o.value)
        .map(Scalar::Float)
        .unwrap_or(Scalar::Null)
}

#[derive(Deserialize, Debug)]
struct SeriesResponse {
    #[serde(default)]
    items: Vec<HashMap<String, serde_json::Value>>,
}

impl SeriesResponse {
    /// Item fields are named after the series with dots as underscores.
    fn observations(self, series: &str) -> Result<Vec<Observation>> {
        let field = series.replace('.', "_");
        self.items
            .into_iter()
            .map(|mut item| {
                let date = item
                    .remove("Tarih")
                    .and_then(|d| d.as_str().map(String::from))
                    .unwrap_or_default();
                let value = match item.remove(&field) {
                    Some(v) => de_str_f64(v).with_context(|| format!("{series} on {date}"))?,
                    None => None,
                };
                Ok(Observation { date, value })
            })
            .collect()
    }
}
