//! Result rows.

use oxide_query::SqlValue;
use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::error::{DbError, Result};

/// A fetched record: column names to values, in select order.
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Returns the value of the named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the named column as an integer.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_int)
    }

    /// Returns the named column as a float.
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(SqlValue::as_float)
    }

    /// Returns the named column as text.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SqlValue::as_text)
    }

    /// Returns the column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Returns `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn from_sqlite(row: &SqliteRow) -> Result<Self> {
        let mut fields = Vec::with_capacity(row.len());

        for column in row.columns() {
            let name = column.name();
            let i = column.ordinal();
            let decode = |source| DbError::Decode {
                column: String::from(name),
                source,
            };

            let raw = row.try_get_raw(i).map_err(decode)?;
            let value = if raw.is_null() {
                SqlValue::Null
            } else {
                let type_name = raw.type_info().name().to_ascii_uppercase();
                match type_name.as_str() {
                    "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => {
                        SqlValue::Int(row.try_get::<i64, _>(i).map_err(decode)?)
                    }
                    "REAL" | "FLOAT" | "DOUBLE" => {
                        SqlValue::Float(row.try_get::<f64, _>(i).map_err(decode)?)
                    }
                    "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                        SqlValue::Text(row.try_get::<String, _>(i).map_err(decode)?)
                    }
                    "BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(i).map_err(decode)?),
                    _ => {
                        return Err(DbError::UnsupportedValue {
                            column: String::from(name),
                            type_name,
                        })
                    }
                }
            };

            fields.push((String::from(name), value));
        }

        Ok(Self { fields })
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Serializes a single value with its natural JSON type.
struct Field<'a>(&'a SqlValue);

impl Serialize for Field<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Bool(b) => serializer.serialize_bool(*b),
            SqlValue::Int(n) => serializer.serialize_i64(*n),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &Field(value))?;
        }
        map.end()
    }
}
