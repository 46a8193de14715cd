use serde_json::{Map, Number, Value};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    Column, Postgres, Row as _, TypeInfo,
};
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, PrimitiveDateTime};

use crate::db::error::{DbError, ErrorKind};

/// One result row: column name to JSON value.
pub type Row = Map<String, Value>;

/// Bind parameter. `None` binds a typed SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Json(Option<Value>),
    Timestamp(Option<PrimitiveDateTime>),
    Date(Option<Date>),
}

impl Param {
    pub fn is_null(&self) -> bool {
        match self {
            Param::Bool(v) => v.is_none(),
            Param::Int(v) => v.is_none(),
            Param::Float(v) => v.is_none(),
            Param::Text(v) => v.is_none(),
            Param::Json(v) => v.is_none(),
            Param::Timestamp(v) => v.is_none(),
            Param::Date(v) => v.is_none(),
        }
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(Some(v))
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(Some(v.into()))
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(Some(v))
    }
}

impl From<Option<i64>> for Param {
    fn from(v: Option<i64>) -> Self {
        Param::Int(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(Some(v))
    }
}

impl From<Option<f64>> for Param {
    fn from(v: Option<f64>) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(Some(v.to_string()))
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(Some(v))
    }
}

impl From<Option<&str>> for Param {
    fn from(v: Option<&str>) -> Self {
        Param::Text(v.map(str::to_string))
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Json(Some(v))
    }
}

impl From<PrimitiveDateTime> for Param {
    fn from(v: PrimitiveDateTime) -> Self {
        Param::Timestamp(Some(v))
    }
}

impl From<Date> for Param {
    fn from(v: Date) -> Self {
        Param::Date(Some(v))
    }
}

/// Builds a `Vec<Param>` from heterogeneous values.
#[macro_export]
macro_rules! params {
    () => { Vec::<$crate::db::Param>::new() };
    ($($v:expr),+ $(,)?) => { vec![$($crate::db::Param::from($v)),+] };
}

pub(crate) fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Param],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p.clone() {
            Param::Bool(v) => query.bind(v),
            Param::Int(v) => query.bind(v),
            Param::Float(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
            Param::Json(v) => query.bind(v),
            Param::Timestamp(v) => query.bind(v),
            Param::Date(v) => query.bind(v),
        };
    }
    query
}

/// Decodes a row into a JSON map using each column's declared type.
/// Unknown types fall back to their text form.
pub(crate) fn row_to_json(row: &PgRow) -> Result<Row, DbError> {
    let mut out = Map::with_capacity(row.columns().len());
    for (idx, col) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, col.type_info().name())?;
        out.insert(col.name().to_string(), value);
    }
    Ok(out)
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, DbError> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| float_value(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(float_value),
        "NUMERIC" => row
            .try_get::<Option<sqlx::types::Decimal>, _>(idx)?
            .map(|d| {
                let text = d.to_string();
                text.parse::<f64>()
                    .map(float_value)
                    .unwrap_or(Value::String(text))
            }),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
        "TIMESTAMP" => row
            .try_get::<Option<PrimitiveDateTime>, _>(idx)?
            .map(|v| Value::String(format_naive(v))),
        "TIMESTAMPTZ" => row
            .try_get::<Option<OffsetDateTime>, _>(idx)?
            .map(|v| Value::String(v.format(&Rfc3339).unwrap_or_else(|_| v.to_string()))),
        "DATE" => row
            .try_get::<Option<Date>, _>(idx)?
            .map(|v| Value::String(v.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::String)
        }
        other => match row.try_get_unchecked::<Option<String>, _>(idx) {
            Ok(v) => v.map(Value::String),
            Err(e) => {
                return Err(DbError::new(
                    ErrorKind::Decode,
                    format!("unsupported column type {other}: {e}"),
                ))
            }
        },
    };
    Ok(value.unwrap_or(Value::Null))
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// ISO-8601 without offset, e.g. `2024-05-01T10:20:30`.
pub(crate) fn format_naive(v: PrimitiveDateTime) -> String {
    let date = v.date();
    let t = v.time();
    format!(
        "{}T{:02}:{:02}:{:02}",
        date,
        t.hour(),
        t.minute(),
        t.second()
    )
}

/// Quotes a PostgreSQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
