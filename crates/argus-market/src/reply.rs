use crate::frame::Frame;
use crate::value::{Datum, Mapping, Scalar};
use std::fmt;

/// Whatever a [`Market`](crate::Market) capability call hands back.
///
/// Sources return different shapes for the same kind of question (a dict of
/// figures, a table, a bare number), so callers inspect the reply by
/// capability rather than by concrete type; see
/// [`object_or_dict_to_map`](crate::normalize::object_or_dict_to_map).
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Missing,
    Value(Datum),
    Table(Frame),
}

impl Reply {
    pub fn is_missing(&self) -> bool {
        matches!(self, Reply::Missing)
    }

    /// Mapping access capability.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Reply::Value(Datum::Map(map)) => Some(map),
            _ => None,
        }
    }

    /// "to-dict" capability.
    pub fn as_exportable(&self) -> Option<&dyn Exportable> {
        match self {
            Reply::Table(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Frame> {
        match self {
            Reply::Table(frame) => Some(frame),
            _ => None,
        }
    }
}

impl From<Mapping> for Reply {
    fn from(map: Mapping) -> Self {
        Reply::Value(Datum::Map(map))
    }
}

impl From<Frame> for Reply {
    fn from(frame: Frame) -> Self {
        Reply::Table(frame)
    }
}

impl From<Scalar> for Reply {
    fn from(v: Scalar) -> Self {
        Reply::Value(Datum::Scalar(v))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Missing => write!(f, "None"),
            Reply::Value(datum) => write!(f, "{datum}"),
            Reply::Table(frame) => {
                let names: Vec<_> = frame.column_names().collect();
                write!(f, "[{} rows x {} columns] {:?}", frame.len(), names.len(), names)
            }
        }
    }
}

/// Objects that can export themselves as a plain mapping.
pub trait Exportable {
    fn to_dict(&self) -> Mapping;
}

/// Column-oriented export: `{column: {row id: value}}`.
impl Exportable for Frame {
    fn to_dict(&self) -> Mapping {
        let mut out = Mapping::new();
        for (i, column) in self.columns().iter().enumerate() {
            let name = match &column.group {
                Some(group) => format!("({}, {})", column.name, group),
                None => column.name.clone(),
            };
            let cells: Mapping = self
                .rows()
                .map(|row| {
                    let value = row
                        .cells()
                        .nth(i)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Scalar::Null);
                    (row.key.to_string(), Datum::Scalar(value))
                })
                .collect();
            out.insert(name, cells);
        }
        out
    }
}

/// Attribute-bearing quote snapshot; every attribute may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastInfo {
    pub last_price: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub free_float: Option<f64>,
    pub foreign_ratio: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RowKey;

    #[test]
    fn test_frame_to_dict_is_column_oriented() {
        let mut frame = Frame::new(["strongBuy", "buy"]);
        frame.push_row(RowKey::Label("0m".into()), vec![3_i64.into(), 5_i64.into()]);
        frame.push_row(RowKey::Label("-1m".into()), vec![2_i64.into(), 4_i64.into()]);

        let dict = frame.to_dict();
        let buy = dict.get("buy").and_then(Datum::as_map).expect("buy column");
        assert_eq!(buy.get("0m").and_then(Datum::as_f64), Some(5.0));
        assert_eq!(buy.get("-1m").and_then(Datum::as_f64), Some(4.0));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_capabilities_are_exclusive() {
        let mapping = Reply::from(Mapping::new());
        assert!(mapping.as_mapping().is_some());
        assert!(mapping.as_exportable().is_none());

        let table = Reply::from(Frame::new(["a"]));
        assert!(table.as_mapping().is_none());
        assert!(table.as_exportable().is_some());

        let scalar = Reply::from(Scalar::Float(1.5));
        assert!(scalar.as_mapping().is_none());
        assert!(scalar.as_exportable().is_none());
        assert_eq!(scalar.to_string(), "1.5");
    }
}
