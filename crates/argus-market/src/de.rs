use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Yahoo pads gaps in its quote arrays with `null`; keep the slot as NaN so
/// every column stays aligned with the timestamp array, e.g.,
///             `[1.0, null, 2.0]`    -> `[1.0, NaN, 2.0]`
pub fn de_nullable_f64s<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Option<f64>>> = Deserialize::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Transform `unix timestamps`     -> `UTC datetimes`, e.g.,
///             `1705795200`        -> `2024-01-21T00:00:00Z`
pub fn de_timestamps<'de, D>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let timestamps: Option<Vec<i64>> = Deserialize::deserialize(deserializer)?;
    timestamps
        .unwrap_or_default()
        .into_iter()
        .map(|ts| {
            DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid unix timestamp: {ts}")))
        })
        .collect()
}

/// EVDS sends numbers as strings (or `null`); both end up as `Option<f64>`.
pub fn de_str_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(num) => Ok(num.as_f64()),
        serde_json::Value::String(s) => match s.trim() {
            "" => Ok(None),
            s => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("not a number: {s}"))),
        },
        _ => Err(serde::de::Error::custom("ERROR! Invalid type for a number")),
    }
}
