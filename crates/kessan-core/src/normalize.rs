//! Turn provider [`Value`]s into JSON.
//!
//! Dispatch is on [`Category`], in declaration order. The order matters: a frame is also
//! a collection of numbers and a series is also a mapping, so the structural rules must
//! be tried before the numeric and mapping ones.

use crate::value::{Frame, Key, Numeric, Series, Value};
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

/// Which normalization rule a [`Value`] falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Absent,
    Tabular,
    Indexed,
    Wrapped,
    Float,
    Mapping,
    Sequence,
    Scalar,
    Other,
}

impl Value {
    pub fn category(&self) -> Category {
        match self {
            Value::Absent => Category::Absent,
            Value::Frame(_) => Category::Tabular,
            Value::Series(_) => Category::Indexed,
            Value::Numeric(_) => Category::Wrapped,
            Value::Float(_) => Category::Float,
            Value::Mapping(_) => Category::Mapping,
            Value::Sequence(_) => Category::Sequence,
            Value::Int(_) | Value::Bool(_) | Value::Str(_) | Value::Date(_) | Value::Timestamp(_) => {
                Category::Scalar
            }
            Value::Opaque(_) => Category::Other,
        }
    }
}

/// Normalize `value` into JSON containing only null, numbers, strings, booleans, arrays
/// and string-keyed objects. Missing values (NaN, [`Value::Absent`]) become `null`.
///
/// Never fails: values without a dedicated rule are rendered through `Display`.
pub fn normalize(value: Value) -> Json {
    match (value.category(), value) {
        (Category::Absent, _) => Json::Null,
        (Category::Tabular, Value::Frame(frame)) => frame_records(frame),
        (Category::Indexed, Value::Series(series)) => series_map(series),
        (Category::Wrapped, Value::Numeric(n)) => unwrap_numeric(n),
        (Category::Float, Value::Float(x)) => float(x),
        (Category::Mapping, Value::Mapping(entries)) => Json::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), normalize(v)))
                .collect(),
        ),
        (Category::Sequence, Value::Sequence(items)) => {
            Json::Array(items.into_iter().map(normalize).collect())
        }
        (Category::Scalar, scalar) => scalar_value(scalar),
        (_, other) => rendered(other),
    }
}

fn scalar_value(scalar: Value) -> Json {
    match scalar {
        Value::Int(i) => Json::from(i),
        Value::Bool(b) => Json::Bool(b),
        Value::Str(s) => Json::String(s),
        Value::Date(d) => Json::String(Key::Date(d).to_string()),
        Value::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        other => rendered(other),
    }
}

/// The `Other` rule: only the string form survives.
fn rendered(value: Value) -> Json {
    match value {
        Value::Opaque(o) => Json::String(o.to_string()),
        other => Json::String(format!("{other:?}")),
    }
}

// -------------------------------------------------------------------------------------------------

/// One object per row: the index field first (when the frame has an index), then every
/// column in order.
fn frame_records(frame: Frame) -> Json {
    let Frame {
        index,
        columns,
        rows,
    } = frame;

    let (index_field, mut index_keys) = match index {
        Some(index) => (
            Some(index.name.unwrap_or_else(|| "index".to_string())),
            index.keys.into_iter(),
        ),
        None => (None, Vec::new().into_iter()),
    };
    let columns: Vec<String> = columns.iter().map(Key::to_string).collect();

    let records = rows
        .into_iter()
        .map(|row| {
            let mut record = Map::with_capacity(columns.len() + 1);
            if let Some(field) = &index_field {
                let label = index_keys.next().map_or(Json::Null, key_value);
                record.insert(field.clone(), label);
            }
            let mut cells = row.into_iter();
            for column in &columns {
                let cell = cells.next().map_or(Json::Null, cell_value);
                record.insert(column.clone(), cell);
            }
            Json::Object(record)
        })
        .collect();

    Json::Array(records)
}

/// Index labels keep their type: positions stay numbers, dates become strings.
fn key_value(key: Key) -> Json {
    match key {
        Key::Int(i) => Json::from(i),
        other => Json::String(other.to_string()),
    }
}

fn cell_value(cell: Value) -> Json {
    if cell.is_nan() {
        return Json::Null;
    }
    normalize(cell)
}

fn series_map(series: Series) -> Json {
    let mut map = Map::with_capacity(series.entries.len());
    for (key, value) in series.entries {
        map.insert(key.to_string(), cell_value(value));
    }
    Json::Object(map)
}

fn unwrap_numeric(n: Numeric) -> Json {
    match n {
        Numeric::I32(i) => Json::from(i),
        Numeric::I64(i) => Json::from(i),
        Numeric::U64(u) => Json::from(u),
        Numeric::F32(x) => float(f64::from(x)),
        Numeric::F64(x) => float(x),
    }
}

/// NaN and the infinities have no JSON token.
fn float(x: f64) -> Json {
    Number::from_f64(x).map_or(Json::Null, Json::Number)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
