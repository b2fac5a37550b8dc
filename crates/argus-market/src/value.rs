use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// A single leaf value handed back by a market source.
///
/// Floats are kept as-is, including NaN and infinities; it is the job of
/// [`normalize`](crate::normalize) to turn those into JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl Scalar {
    /// Numeric view of the scalar, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "None"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s}"),
            Scalar::Time(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<Option<f64>> for Scalar {
    fn from(v: Option<f64>) -> Self {
        v.map(Scalar::Float).unwrap_or(Scalar::Null)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(v: DateTime<Utc>) -> Self {
        Scalar::Time(v)
    }
}

/// Dynamic, dict-like result tree (think "whatever the upstream JSON looked like").
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Scalar(Scalar),
    List(Vec<Datum>),
    Map(Mapping),
}

impl Datum {
    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Datum::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Build a tree from an arbitrary JSON value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Datum::Scalar(Scalar::Null),
            Value::Bool(b) => Datum::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Datum::Scalar(Scalar::Int(i)),
                None => Datum::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Datum::Scalar(Scalar::Text(s.clone())),
            Value::Array(items) => Datum::List(items.iter().map(Datum::from_json).collect()),
            Value::Object(obj) => Datum::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Datum::from_json(v)))
                    .collect(),
            ),
        }
    }
}

macro_rules! datum_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Datum {
                fn from(v: $ty) -> Self {
                    Datum::Scalar(v.into())
                }
            }
        )*
    };
}

datum_from_scalar!(f64, Option<f64>, i64, bool, &str, String, DateTime<Utc>);

impl From<Scalar> for Datum {
    fn from(v: Scalar) -> Self {
        Datum::Scalar(v)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Scalar(s) => write!(f, "{s}"),
            Datum::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Datum::Map(map) => write!(f, "{map}"),
        }
    }
}

/// Insertion-ordered string-keyed map of [`Datum`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping(Vec<(String, Datum)>);

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Datum>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Datum> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Datum)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Datum)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Datum)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl From<Mapping> for Datum {
    fn from(map: Mapping) -> Self {
        Datum::Map(map)
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{k}': {v}")?;
        }
        write!(f, "}}")
    }
}
