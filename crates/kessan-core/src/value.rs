use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use std::fmt;
use std::sync::Arc;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Keys
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Label of a mapping entry, a series entry, a frame column or a frame row.
///
/// Every key has a string form; that is the form it takes in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Int(i64),
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{i}"),
            Key::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Key::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<NaiveDate> for Key {
    fn from(d: NaiveDate) -> Self {
        Key::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Key {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Key::Timestamp(ts)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Numeric wrappers
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A provider-typed number. Float widths may carry NaN as the missing-value marker;
/// integer widths never do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    I32(i32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Numeric {
    pub fn is_nan(&self) -> bool {
        match self {
            Numeric::F32(x) => x.is_nan(),
            Numeric::F64(x) => x.is_nan(),
            Numeric::I32(_) | Numeric::I64(_) | Numeric::U64(_) => false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tabular & indexed structures
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Row labels of a [`Frame`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Index {
    pub name: Option<String>,
    pub keys: Vec<Key>,
}

/// Ordered rows of named-column records, optionally labelled by an [`Index`].
///
/// ```text
///            | Open   | Close  | Volume
/// -----------+--------+--------+--------
/// 2024-01-02 | 187.15 | 185.64 | 82488700
/// 2024-01-03 | 184.22 | NaN    | 58414500
/// ```
///
/// Every row holds exactly one cell per column; [`Frame::push`] pads short rows with
/// [`Value::Absent`] and drops surplus cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub index: Option<Index>,
    pub columns: Vec<Key>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    /// A frame whose rows are labelled, e.g. by date or by line item.
    pub fn indexed<K: Into<Key>>(name: Option<&str>, columns: impl IntoIterator<Item = K>) -> Self {
        Self {
            index: Some(Index {
                name: name.map(str::to_string),
                keys: vec![],
            }),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    /// A frame labelled by row position (0, 1, 2, ...).
    pub fn positional<K: Into<Key>>(columns: impl IntoIterator<Item = K>) -> Self {
        Self::indexed(None, columns)
    }

    /// A frame with no row labels at all.
    pub fn unindexed<K: Into<Key>>(columns: impl IntoIterator<Item = K>) -> Self {
        Self {
            index: None,
            columns: columns.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    /// Append a row labelled `key`. Unindexed frames ignore the label.
    pub fn push(&mut self, key: impl Into<Key>, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Absent);
        if let Some(index) = self.index.as_mut() {
            index.keys.push(key.into());
        }
        self.rows.push(row);
    }

    /// Append a row labelled by its position.
    pub fn push_positional(&mut self, row: Vec<Value>) {
        let position = self.rows.len() as i64;
        self.push(position, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single column of values keyed by an ordered (usually chronological) index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub name: Option<String>,
    pub entries: Vec<(Key, Value)>,
}

impl Series {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            entries: vec![],
        }
    }

    pub fn push(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Opaque values
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A value of a type the normalizer has no rule for. Only its `Display` form survives
/// normalization.
#[derive(Clone)]
pub struct Opaque(Arc<dyn fmt::Display + Send + Sync>);

impl Opaque {
    pub fn new<T>(inner: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self(Arc::new(inner))
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.0)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Value
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Anything a data provider may hand back for a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Frame(Frame),
    Series(Series),
    Numeric(Numeric),
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
    Mapping(Vec<(Key, Value)>),
    Sequence(Vec<Value>),
    Opaque(Opaque),
}

impl Value {
    /// Look up a string key of a mapping; `None` for any other kind of value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Key::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// A float cell holding NaN, plain or wrapped.
    pub fn is_nan(&self) -> bool {
        match self {
            Value::Float(x) => x.is_nan(),
            Value::Numeric(n) => n.is_nan(),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Numeric> for Value {
    fn from(n: Numeric) -> Self {
        Value::Numeric(n)
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        Value::Frame(frame)
    }
}

impl From<Series> for Value {
    fn from(series: Series) -> Self {
        Value::Series(series)
    }
}

impl From<Opaque> for Value {
    fn from(opaque: Opaque) -> Self {
        Value::Opaque(opaque)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Absent, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Lift plain JSON into a [`Value`]; integers stay integers, those above `i64::MAX` as
/// [`Numeric::U64`].
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Absent,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::Numeric(Numeric::U64(u)),
                (None, None) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Key::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn keys_render_as_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let ts = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
            .unwrap();

        assert_eq!(Key::from("Total Revenue").to_string(), "Total Revenue");
        assert_eq!(Key::from(42_i64).to_string(), "42");
        assert_eq!(Key::from(date).to_string(), "2024-01-02");
        assert_eq!(Key::from(ts).to_string(), "2024-01-02T00:00:00-05:00");
    }

    #[test]
    fn push_pads_and_truncates_rows() {
        let mut frame = Frame::positional(["a", "b"]);
        frame.push_positional(vec![Value::Int(1)]);
        frame.push_positional(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

        assert_eq!(frame.rows[0], vec![Value::Int(1), Value::Absent]);
        assert_eq!(frame.rows[1], vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            frame.index.unwrap().keys,
            vec![Key::Int(0), Key::Int(1)]
        );
    }

    #[test]
    fn get_only_matches_string_keys() {
        let info = Value::Mapping(vec![
            (Key::Int(1), Value::Int(10)),
            (Key::from("currentPrice"), Value::Float(189.5)),
        ]);

        assert_eq!(info.get("currentPrice"), Some(&Value::Float(189.5)));
        assert_eq!(info.get("1"), None);
        assert_eq!(Value::Int(3).get("currentPrice"), None);
    }

    #[test]
    fn nan_detection_covers_wrappers() {
        assert!(Value::Float(f64::NAN).is_nan());
        assert!(Value::Numeric(Numeric::F32(f32::NAN)).is_nan());
        assert!(!Value::Numeric(Numeric::I64(0)).is_nan());
        assert!(!Value::Absent.is_nan());
    }

    #[test]
    fn json_lifts_to_values() {
        let lifted = Value::from(serde_json::json!({"a": [1, 2.5, null], "b": "x"}));
        assert_eq!(
            lifted,
            Value::Mapping(vec![
                (
                    Key::from("a"),
                    Value::Sequence(vec![Value::Int(1), Value::Float(2.5), Value::Absent])
                ),
                (Key::from("b"), Value::from("x")),
            ])
        );
    }
}
