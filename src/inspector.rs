//! inspector.rs
//!
//! Open a read-only SQLite connection, run one parameterless query, materialize
//! every row, and release the connection before returning.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::errors::InspectError;

/// One cell, typed by the storage class SQLite reports for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Blob literal in SQLite's own `x'..'` notation.
    fn blob_literal(bytes: &[u8]) -> String {
        format!("x'{}'", hex::encode(bytes))
    }

    /// Non-finite reals as text, so JSON never folds them into `null`.
    fn non_finite_literal(r: f64) -> Option<&'static str> {
        if r.is_nan() {
            Some("NaN")
        } else if r == f64::INFINITY {
            Some("Infinity")
        } else if r == f64::NEG_INFINITY {
            Some("-Infinity")
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => match Value::non_finite_literal(*r) {
                Some(literal) => f.write_str(literal),
                None => write!(f, "{}", r),
            },
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => f.write_str(&Value::blob_literal(b)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => match Value::non_finite_literal(*r) {
                Some(literal) => serializer.serialize_str(literal),
                None => serializer.serialize_f64(*r),
            },
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_str(&Value::blob_literal(b)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

/// A matched record: column name to value, in statement column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, Value)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.columns.push((name.to_string(), value.into()));
        self
    }

    /// First column with this name, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn from_sqlite(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let mut columns = Vec::with_capacity(row.len());
        for column in row.columns() {
            let idx = column.ordinal();
            let raw = row.try_get_raw(idx)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                // Runtime storage class, not the declared column affinity.
                let storage = raw.type_info().name().to_string();
                match storage.as_str() {
                    "INTEGER" => Value::Integer(row.try_get_unchecked(idx)?),
                    "REAL" => Value::Real(row.try_get_unchecked(idx)?),
                    "BLOB" => Value::Blob(row.try_get_unchecked(idx)?),
                    // Text is read as bytes; invalid UTF-8 is replaced, not fatal.
                    _ => {
                        let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
                        Value::Text(String::from_utf8_lossy(&bytes).into_owned())
                    }
                }
            };
            columns.push((column.name().to_string(), value));
        }
        Ok(Self { columns })
    }
}

// Serialized as a map so JSON keys keep the statement's column order.
// A repeated column name gets an occurrence suffix (`id`, `id:1`, `id:2`)
// so no key is shadowed.
impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            let count = seen.entry(name.as_str()).or_insert(0);
            if *count == 0 {
                map.serialize_entry(name, value)?;
            } else {
                map.serialize_entry(&format!("{}:{}", name, count), value)?;
            }
            *count += 1;
        }
        map.end()
    }
}

/// All rows of one query, in the order the database returned them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Single-shot, single-connection reader for one database file and one query.
#[derive(Debug, Clone)]
pub struct Inspector {
    path: PathBuf,
    query: String,
}

impl Inspector {
    pub fn new(path: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.database_path.clone(), settings.query.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Open → query → materialize → close.
    ///
    /// The connection is closed on every path before this returns. Any
    /// database failure (missing file, not a database, bad query, attempted
    /// write) is reported as [`InspectError::Access`].
    pub async fn inspect(&self) -> Result<ResultSet, InspectError> {
        let mut conn = self.open().await?;

        let result = self.fetch(&mut conn).await;

        match conn.close().await {
            Ok(()) => debug!(path = %self.path.display(), "Closed connection"),
            Err(e) => warn!(
                path  = %self.path.display(),
                error = %e,
                "Failed to close connection cleanly"
            ),
        }

        let rows = result.map_err(|e| InspectError::access(&self.path, e))?;
        info!(path = %self.path.display(), rows = rows.len(), "Inspection complete");
        Ok(rows)
    }

    async fn open(&self) -> Result<SqliteConnection, InspectError> {
        debug!(path = %self.path.display(), "Opening read-only connection");
        SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .create_if_missing(false)
            .disable_statement_logging()
            .connect()
            .await
            .map_err(|e| InspectError::access(&self.path, e))
    }

    async fn fetch(&self, conn: &mut SqliteConnection) -> Result<ResultSet, sqlx::Error> {
        debug!(query = %self.query, "Running query");
        let rows = sqlx::query(&self.query).fetch_all(&mut *conn).await?;
        let rows = rows
            .iter()
            .map(ResultRow::from_sqlite)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResultSet::new(rows))
    }
}
