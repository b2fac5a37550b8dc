use crate::value::Scalar;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Row identifier of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowKey {
    Time(DateTime<Utc>),
    Label(String),
    Position(usize),
}

impl RowKey {
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            RowKey::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Time(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            RowKey::Label(s) => write!(f, "{s}"),
            RowKey::Position(i) => write!(f, "{i}"),
        }
    }
}

/// Column header; `group` is the second header level of multi-symbol frames,
/// e.g. `("Close", "THYAO")`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub group: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            group: None,
        }
    }

    pub fn grouped(name: impl Into<String>, group: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            group: Some(group.into()),
        }
    }
}

/// Row/column table with an ordered row index.
///
/// Rows are stored in the order they were pushed, which is the order the
/// upstream source returned them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    index: Vec<RowKey>,
    rows: Vec<Vec<Scalar>>,
}

impl Frame {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Frame {
            columns: columns.into_iter().map(Column::new).collect(),
            index: vec![],
            rows: vec![],
        }
    }

    pub fn with_columns(columns: Vec<Column>) -> Self {
        Frame {
            columns,
            index: vec![],
            rows: vec![],
        }
    }

    /// Append a row. Short rows are padded with `Null`, long rows truncated,
    /// so every row always has one value per column.
    pub fn push_row(&mut self, key: RowKey, mut values: Vec<Scalar>) {
        values.resize(self.columns.len(), Scalar::Null);
        self.index.push(key);
        self.rows.push(values);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_multi_level(&self) -> bool {
        self.columns.iter().any(|c| c.group.is_some())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.index
            .iter()
            .zip(self.rows.iter())
            .map(|(key, values)| Row {
                key,
                columns: &self.columns,
                values,
            })
    }

    /// Cross-section over the second column level: the sub-frame of columns
    /// whose group is `group`, with the group tag dropped.
    ///
    /// Returns `None` when the frame is single-level, since there is nothing
    /// to cross-section.
    pub fn xs(&self, group: &str) -> Option<Frame> {
        if !self.is_multi_level() {
            return None;
        }
        let picks: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.group.as_deref() == Some(group))
            .map(|(i, _)| i)
            .collect();

        let mut sub = Frame::with_columns(
            picks
                .iter()
                .map(|&i| Column::new(self.columns[i].name.clone()))
                .collect(),
        );
        for (key, values) in self.index.iter().zip(self.rows.iter()) {
            sub.push_row(
                key.clone(),
                picks.iter().map(|&i| values[i].clone()).collect(),
            );
        }
        Some(sub)
    }
}

/// Borrowed view of one frame row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub key: &'a RowKey,
    columns: &'a [Column],
    values: &'a [Scalar],
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Scalar> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| &self.values[i])
    }

    /// Exact column match first, then ASCII case-insensitive.
    pub fn get_ci(&self, name: &str) -> Option<&'a Scalar> {
        self.get(name).or_else(|| {
            self.columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name))
                .map(|i| &self.values[i])
        })
    }

    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a Scalar)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.name.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_frame() -> Frame {
        let mut frame = Frame::with_columns(vec![
            Column::grouped("Close", "THYAO"),
            Column::grouped("Close", "GARAN"),
            Column::grouped("Volume", "THYAO"),
        ]);
        frame.push_row(
            RowKey::Position(0),
            vec![Scalar::Float(1.0), Scalar::Float(2.0), Scalar::Int(10)],
        );
        frame
    }

    #[test]
    fn test_push_row_pads_missing_values() {
        let mut frame = Frame::new(["a", "b", "c"]);
        frame.push_row(RowKey::Position(0), vec![Scalar::Int(1)]);

        let row = frame.rows().next().expect("one row");
        assert_eq!(row.get("a"), Some(&Scalar::Int(1)));
        assert_eq!(row.get("c"), Some(&Scalar::Null));
    }

    #[test]
    fn test_get_ci_prefers_exact_match() {
        let mut frame = Frame::new(["close", "Close"]);
        frame.push_row(
            RowKey::Position(0),
            vec![Scalar::Float(1.0), Scalar::Float(2.0)],
        );
        let row = frame.rows().next().expect("one row");

        assert_eq!(row.get_ci("Close"), Some(&Scalar::Float(2.0)));
        assert_eq!(row.get_ci("CLOSE"), Some(&Scalar::Float(1.0)));
        assert_eq!(row.get_ci("open"), None);
    }

    #[test]
    fn test_xs_selects_group() {
        let frame = download_frame();
        let sub = frame.xs("THYAO").expect("multi-level frame");

        let names: Vec<_> = sub.column_names().collect();
        assert_eq!(names, vec!["Close", "Volume"]);
        let row = sub.rows().next().expect("one row");
        assert_eq!(row.get("Volume"), Some(&Scalar::Int(10)));

        let missing = frame.xs("AKBNK").expect("multi-level frame");
        assert!(missing.columns().is_empty());
    }

    #[test]
    fn test_xs_on_single_level_frame() {
        let frame = Frame::new(["Close"]);
        assert!(frame.xs("THYAO").is_none());
    }
}
